//! Backing store descriptors.
//!
//! A [`Buf`] describes an addressable region a tensor writes into: a name,
//! a shape, and an optional scalar initializer that reductions use to reset
//! their accumulator. A [`Placeholder`] is an externally provided input
//! buffer with no initializer.

use crate::expr::{Expr, ExprKind};
use std::fmt;
use std::rc::Rc;

/// An addressable backing store with a shape and an optional initializer.
///
/// `Buf` is a cheap-clone handle; equality is structural.
#[derive(Debug, Clone, PartialEq)]
pub struct Buf(Rc<BufData>);

#[derive(Debug, PartialEq)]
struct BufData {
    name: String,
    dims: Vec<Expr>,
    initializer: Option<Expr>,
}

impl Buf {
    pub fn new(name: impl Into<String>, dims: Vec<Expr>) -> Self {
        Self(Rc::new(BufData {
            name: name.into(),
            dims,
            initializer: None,
        }))
    }

    pub(crate) fn with_initializer(
        name: impl Into<String>,
        dims: Vec<Expr>,
        initializer: Expr,
    ) -> Self {
        Self(Rc::new(BufData {
            name: name.into(),
            dims,
            initializer: Some(initializer),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ndim(&self) -> usize {
        self.0.dims.len()
    }

    pub fn dims(&self) -> &[Expr] {
        &self.0.dims
    }

    /// The accumulator reset expression, if this buffer backs a reduction.
    pub fn initializer(&self) -> Option<&Expr> {
        self.0.initializer.as_ref()
    }

    /// An indexed read of this buffer.
    ///
    /// The index count must match the buffer's rank; builders validate rank
    /// before constructing loads.
    pub fn load<I>(&self, indices: &[I]) -> Expr
    where
        I: Clone + Into<Expr>,
    {
        debug_assert_eq!(indices.len(), self.ndim(), "load rank mismatch");
        Expr::new(ExprKind::Load {
            buf: self.clone(),
            indices: indices.iter().map(|i| i.clone().into()).collect(),
        })
    }
}

impl fmt::Display for Buf {
    // Shows the name and shape, e.g. `a[4, 4]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name())?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// An externally provided input buffer exposing an indexed read.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    buf: Buf,
}

impl Placeholder {
    pub fn new<I>(name: impl Into<String>, dims: &[I]) -> Self
    where
        I: Clone + Into<Expr>,
    {
        let dims = dims.iter().map(|d| d.clone().into()).collect();
        Self {
            buf: Buf::new(name, dims),
        }
    }

    pub fn buf(&self) -> &Buf {
        &self.buf
    }

    pub fn name(&self) -> &str {
        self.buf.name()
    }

    pub fn ndim(&self) -> usize {
        self.buf.ndim()
    }

    /// An indexed read of the underlying buffer.
    pub fn load<I>(&self, indices: &[I]) -> Expr
    where
        I: Clone + Into<Expr>,
    {
        self.buf.load(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Var;

    #[test]
    fn test_load_structure() {
        let a = Placeholder::new("a", &[4i64, 4]);
        let i = Var::fresh("i");
        let j = Var::fresh("j");
        let e = a.load(&[i.clone(), j.clone()]);
        match e.kind() {
            ExprKind::Load { buf, indices } => {
                assert_eq!(buf.name(), "a");
                assert_eq!(indices, &[i.expr(), j.expr()]);
            }
            other => panic!("expected Load, got {other:?}"),
        }
    }

    #[test]
    fn test_display_shows_name_and_shape() {
        let b = Buf::new("a", vec![4i64.into(), 8i64.into()]);
        assert_eq!(b.to_string(), "a[4, 8]");
        assert_eq!(Buf::new("s", vec![]).to_string(), "s[]");
    }

    #[test]
    fn test_scalar_buffer() {
        let b = Buf::new("s", vec![]);
        assert_eq!(b.ndim(), 0);
        let e = b.load::<Expr>(&[]);
        assert_eq!(e.to_string(), "s[]");
    }
}

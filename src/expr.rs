//! Scalar expression nodes.
//!
//! An [`Expr`] is an immutable, side-effect-free scalar computation node.
//! Expressions are reference counted and share structure freely: cloning an
//! `Expr` is cheap, and a node may appear in several trees at once. Nothing
//! is ever mutated after construction, so the resulting graphs are always
//! acyclic.

use crate::buf::Buf;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_VAR_ID: AtomicUsize = AtomicUsize::new(0);

/// A symbolic index variable.
///
/// Each call to [`Var::fresh`] allocates a process-unique id, so two
/// independently created variables never compare equal even when they share
/// a name hint. A `Var` is bound by the `For` loop that iterates it and may
/// be referenced from any number of expressions without ownership transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    id: usize,
    name: String,
}

impl Var {
    /// Allocates a fresh variable with the given name hint.
    pub fn fresh(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_VAR_ID.fetch_add(1, Ordering::SeqCst),
            name: name.into(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wraps this variable in an [`Expr`].
    pub fn expr(&self) -> Expr {
        Expr::from(self.clone())
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "v{}", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// An immutable scalar expression node.
///
/// `Expr` is a thin reference-counted handle; equality is structural.
#[derive(Debug, Clone)]
pub struct Expr(Rc<ExprKind>);

/// The concrete node kinds an [`Expr`] can hold.
#[derive(Debug, PartialEq)]
pub enum ExprKind {
    IntImm(i64),
    FloatImm(f64),
    Var(Var),

    // binary arithmetic
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Max(Expr, Expr),
    Min(Expr, Expr),

    /// An indexed read from a buffer.
    Load { buf: Buf, indices: Vec<Expr> },
}

impl Expr {
    pub(crate) fn new(kind: ExprKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// The larger of two expressions.
    pub fn max(self, rhs: impl Into<Expr>) -> Expr {
        Expr::new(ExprKind::Max(self, rhs.into()))
    }

    /// The smaller of two expressions.
    pub fn min(self, rhs: impl Into<Expr>) -> Expr {
        Expr::new(ExprKind::Min(self, rhs.into()))
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(v: $t) -> Self {
                    Expr::new(ExprKind::IntImm(v as i64))
                }
            }
        )*
    };
}

macro_rules! impl_from_float {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(v: $t) -> Self {
                    Expr::new(ExprKind::FloatImm(v as f64))
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32, usize);
impl_from_float!(f32, f64);

impl From<Var> for Expr {
    fn from(v: Var) -> Self {
        Expr::new(ExprKind::Var(v))
    }
}

impl From<&Var> for Expr {
    fn from(v: &Var) -> Self {
        Expr::new(ExprKind::Var(v.clone()))
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<R: Into<Expr>> std::ops::$trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::new(ExprKind::$variant(self, rhs.into()))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::IntImm(v) => write!(f, "{v}"),
            ExprKind::FloatImm(v) => write!(f, "{v:?}"),
            ExprKind::Var(v) => write!(f, "{v}"),
            ExprKind::Add(l, r) => write!(f, "({l} + {r})"),
            ExprKind::Sub(l, r) => write!(f, "({l} - {r})"),
            ExprKind::Mul(l, r) => write!(f, "({l} * {r})"),
            ExprKind::Div(l, r) => write!(f, "({l} / {r})"),
            ExprKind::Max(l, r) => write!(f, "max({l}, {r})"),
            ExprKind::Min(l, r) => write!(f, "min({l}, {r})"),
            ExprKind::Load { buf, indices } => {
                write!(f, "{}[", buf.name())?;
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{idx}")?;
                }
                write!(f, "]")
            }
        }
    }
}

//! Dimension descriptors and unpacking.

use crate::expr::{Expr, Var};

/// One tensor or reduction axis: a loop extent plus an optional name hint
/// for the index variable bound to that axis.
///
/// Extents are not validated for non-negativity, here or during lowering.
/// An extent that evaluates to zero or a negative value at execution time
/// yields an empty loop, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DimArg {
    extent: Expr,
    name_hint: Option<String>,
}

impl DimArg {
    pub fn new(extent: impl Into<Expr>) -> Self {
        Self {
            extent: extent.into(),
            name_hint: None,
        }
    }

    pub fn named(extent: impl Into<Expr>, name: impl Into<String>) -> Self {
        Self {
            extent: extent.into(),
            name_hint: Some(name.into()),
        }
    }

    pub fn extent(&self) -> &Expr {
        &self.extent
    }

    pub fn name_hint(&self) -> Option<&str> {
        self.name_hint.as_deref()
    }
}

macro_rules! impl_dim_arg_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DimArg {
                fn from(extent: $t) -> Self {
                    DimArg::new(extent)
                }
            }
        )*
    };
}

impl_dim_arg_from!(i32, i64, u32, usize, Expr);

/// Unpacks dimension descriptors into parallel extents and freshly
/// allocated index variables, index-for-index.
///
/// Every call allocates new variables, so no two descriptors (and no two
/// calls) ever share a `Var`. Unnamed axes get positional names `i0`,
/// `i1`, ...
pub fn unpack_dim_args(dim_args: &[DimArg]) -> (Vec<Expr>, Vec<Var>) {
    let mut dims = Vec::with_capacity(dim_args.len());
    let mut args = Vec::with_capacity(dim_args.len());
    for (pos, d) in dim_args.iter().enumerate() {
        dims.push(d.extent().clone());
        let name = match d.name_hint() {
            Some(hint) => hint.to_string(),
            None => format!("i{pos}"),
        };
        args.push(Var::fresh(name));
    }
    (dims, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_parallel_order() {
        let dim_args = [DimArg::named(4i64, "i"), DimArg::named(8i64, "j")];
        let (dims, args) = unpack_dim_args(&dim_args);
        assert_eq!(dims.len(), 2);
        assert_eq!(args.len(), 2);
        assert_eq!(dims[0], Expr::from(4i64));
        assert_eq!(dims[1], Expr::from(8i64));
        assert_eq!(args[0].name(), "i");
        assert_eq!(args[1].name(), "j");
    }

    #[test]
    fn test_unpack_allocates_fresh_vars() {
        let dim_args = [DimArg::new(4i64), DimArg::new(4i64)];
        let (_, a) = unpack_dim_args(&dim_args);
        let (_, b) = unpack_dim_args(&dim_args);
        assert_ne!(a[0], a[1]);
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn test_unnamed_axes_get_positional_names() {
        let (_, args) = unpack_dim_args(&[DimArg::new(2i64), DimArg::new(3i64)]);
        assert_eq!(args[0].name(), "i0");
        assert_eq!(args[1].name(), "i1");
    }

    #[test]
    fn test_dim_arg_conversions() {
        let from_i32: DimArg = 4i32.into();
        let from_i64: DimArg = 4i64.into();
        let from_u32: DimArg = 4u32.into();
        let from_usize: DimArg = 4usize.into();
        for d in [&from_i32, &from_i64, &from_u32, &from_usize] {
            assert_eq!(d.extent(), &Expr::from(4i64));
            assert!(d.name_hint().is_none());
        }

        let n = crate::expr::Var::fresh("n");
        let from_expr: DimArg = n.expr().into();
        assert_eq!(from_expr.extent(), &n.expr());
    }

    #[test]
    fn test_empty_dim_list() {
        let (dims, args) = unpack_dim_args(&[]);
        assert!(dims.is_empty());
        assert!(args.is_empty());
    }
}

//! Weft: a tensor-expression IR and loop-nest lowering library.
//!
//! Weft builds an intermediate representation for array computations: a
//! [`Tensor`] declares its shape and either an elementwise formula or a
//! reduction formula over index variables, and lowering expands that
//! declaration into an imperative nested-loop statement tree that a
//! downstream scheduler or code generator can consume.
//!
//! # Architecture
//!
//! - **expr**: immutable scalar expression nodes and index variables
//! - **stmt**: imperative statement nodes (stores, loops, blocks)
//! - **buf**: backing store descriptors and input placeholders
//! - **dim**: dimension descriptors and unpacking
//! - **reducer**: reduction combining rules
//! - **tensor**: the `Tensor` entity, builders, and lowering
//! - **eval**: a reference interpreter for lowered statements
//!
//! # Example
//!
//! ```
//! use weft::{DimArg, Placeholder, Tensor, Var};
//!
//! let a = Placeholder::new("a", &[4i64, 4]);
//! let b = Placeholder::new("b", &[4i64, 4]);
//! let add = Tensor::compute(
//!     "add",
//!     &[DimArg::named(4i64, "i"), DimArg::named(4i64, "j")],
//!     |i: Var, j: Var| a.load(&[i.clone(), j.clone()]) + b.load(&[i, j]),
//! )
//! .unwrap();
//! let stmt = add.lower_to_stmt();
//! println!("{stmt}");
//! ```

// ============================================================================
// Core Modules
// ============================================================================

pub mod buf;
pub mod dim;
pub mod error;
pub mod eval;
pub mod expr;
pub mod reducer;
pub mod stmt;
pub mod tensor;

// ============================================================================
// Re-exports
// ============================================================================

pub use buf::{Buf, Placeholder};
pub use dim::{unpack_dim_args, DimArg};
pub use error::{Error, Result};
pub use eval::Evaluator;
pub use expr::{Expr, ExprKind, Var};
pub use reducer::Reducer;
pub use stmt::Stmt;
pub use tensor::{ComputeBody, Tensor, Variadic};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::buf::{Buf, Placeholder};
    pub use crate::dim::DimArg;
    pub use crate::error::{Error, Result};
    pub use crate::eval::Evaluator;
    pub use crate::expr::{Expr, ExprKind, Var};
    pub use crate::reducer::Reducer;
    pub use crate::stmt::Stmt;
    pub use crate::tensor::Tensor;
}

//! Reduction combining rules.

use crate::expr::Expr;
use std::fmt;
use std::rc::Rc;

/// How a reduction accumulates across its reduction axes.
///
/// The initializer resets the accumulator once per output index before any
/// reduction iteration runs; the combine rule folds each per-iteration
/// value into the accumulator's current contents.
#[derive(Clone)]
pub struct Reducer {
    initializer: Expr,
    combine: Rc<dyn Fn(Expr, Expr) -> Expr>,
}

impl Reducer {
    pub fn new(
        initializer: impl Into<Expr>,
        combine: impl Fn(Expr, Expr) -> Expr + 'static,
    ) -> Self {
        Self {
            initializer: initializer.into(),
            combine: Rc::new(combine),
        }
    }

    pub fn initializer(&self) -> &Expr {
        &self.initializer
    }

    /// Folds `value` into the accumulator expression `acc`.
    pub fn combine(&self, acc: Expr, value: Expr) -> Expr {
        (self.combine)(acc, value)
    }

    /// Sum with an initializer of zero.
    pub fn sum() -> Self {
        Self::new(0i64, |acc, v| acc + v)
    }

    /// Product with an initializer of one.
    pub fn product() -> Self {
        Self::new(1i64, |acc, v| acc * v)
    }

    /// Maximum; the caller supplies the smallest representable value as
    /// the initializer.
    pub fn maximum(initializer: impl Into<Expr>) -> Self {
        Self::new(initializer, |acc, v| acc.max(v))
    }

    /// Minimum; the caller supplies the largest representable value as
    /// the initializer.
    pub fn minimum(initializer: impl Into<Expr>) -> Self {
        Self::new(initializer, |acc, v| acc.min(v))
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducer")
            .field("initializer", &self.initializer)
            .finish_non_exhaustive()
    }
}

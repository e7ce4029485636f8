//! Imperative statement nodes.
//!
//! A [`Stmt`] is an immutable tree of imperative actions: stores into
//! buffers, counted loops, and ordered blocks. Execution order is the
//! nesting order. Like expressions, statements are never mutated after
//! construction; equality is structural, which is what the idempotent
//! re-lowering guarantee is stated in terms of.

use crate::buf::Buf;
use crate::expr::{Expr, ExprKind, Var};
use std::fmt;

/// An imperative statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A masked store of `value` into `buf` at `indices`.
    Store {
        buf: Buf,
        indices: Vec<Expr>,
        value: Expr,
        mask: Expr,
    },
    /// A counted loop binding `var` over `start..stop`.
    ///
    /// A `stop` that evaluates to at most `start` yields an empty loop,
    /// never an error.
    For {
        var: Var,
        start: Expr,
        stop: Expr,
        body: Box<Stmt>,
    },
    /// An ordered sequence of statements.
    Block(Vec<Stmt>),
}

impl Stmt {
    /// A store under an always-true mask.
    pub fn store(buf: Buf, indices: Vec<Expr>, value: Expr) -> Self {
        Stmt::Store {
            buf,
            indices,
            value,
            mask: Expr::from(1i64),
        }
    }

    pub fn store_masked(buf: Buf, indices: Vec<Expr>, value: Expr, mask: Expr) -> Self {
        Stmt::Store {
            buf,
            indices,
            value,
            mask,
        }
    }

    pub fn for_loop(var: Var, start: impl Into<Expr>, stop: impl Into<Expr>, body: Stmt) -> Self {
        Stmt::For {
            var,
            start: start.into(),
            stop: stop.into(),
            body: Box::new(body),
        }
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block(stmts)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Stmt::Store {
                buf,
                indices,
                value,
                mask,
            } => {
                write!(f, "{pad}")?;
                if !matches!(mask.kind(), ExprKind::IntImm(1)) {
                    write!(f, "if ({mask}) ")?;
                }
                write!(f, "{}[", buf.name())?;
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{idx}")?;
                }
                writeln!(f, "] = {value};")
            }
            Stmt::For {
                var,
                start,
                stop,
                body,
            } => {
                writeln!(f, "{pad}for (int {var} = {start}; {var} < {stop}; {var}++) {{")?;
                body.fmt_indented(f, indent + 1)?;
                writeln!(f, "{pad}}}")
            }
            Stmt::Block(stmts) => {
                for s in stmts {
                    s.fmt_indented(f, indent)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

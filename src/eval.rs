//! A reference interpreter for lowered statement trees.
//!
//! Executes a [`Stmt`] over concrete `f64` buffers laid out row-major.
//! This is a test and debugging aid, not a code generator: it walks the
//! tree directly and does exactly what the statements say, so it doubles
//! as an executable definition of the lowering semantics.

use crate::buf::Buf;
use crate::expr::{Expr, ExprKind, Var};
use crate::stmt::Stmt;
use log::trace;
use rustc_hash::FxHashMap;

/// Errors raised while interpreting a statement tree.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error("unbound variable '{0}'")]
    UnboundVar(String),
    #[error("unknown buffer '{0}'")]
    UnknownBuffer(String),
    #[error("index {index} out of bounds for axis of extent {extent} in buffer '{buf}'")]
    OutOfBounds {
        buf: String,
        index: i64,
        extent: i64,
    },
    #[error("buffer '{buf}' holds {len} elements but offset {offset} was accessed")]
    ShortBuffer {
        buf: String,
        len: usize,
        offset: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("expected an integer loop bound, got {0}")]
    NonIntegerBound(f64),
}

/// A scalar runtime value. Integer arithmetic stays integral; mixing an
/// integer with a float promotes to float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    fn as_bound(self) -> Result<i64, EvalError> {
        match self {
            Value::Int(v) => Ok(v),
            Value::Float(v) => Err(EvalError::NonIntegerBound(v)),
        }
    }
}

/// Interprets lowered statements over named row-major `f64` buffers.
#[derive(Debug, Default)]
pub struct Evaluator {
    buffers: FxHashMap<String, Vec<f64>>,
    bindings: FxHashMap<Var, i64>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provides the contents of an input buffer.
    pub fn bind_buffer(&mut self, name: impl Into<String>, data: Vec<f64>) {
        self.buffers.insert(name.into(), data);
    }

    /// The current contents of a buffer, if it exists.
    pub fn buffer(&self, name: &str) -> Option<&[f64]> {
        self.buffers.get(name).map(Vec::as_slice)
    }

    /// Executes a statement tree. Output buffers are allocated on first
    /// store, zero-filled, sized from the target buffer's shape.
    pub fn run(&mut self, stmt: &Stmt) -> Result<(), EvalError> {
        self.exec(stmt)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), EvalError> {
        match stmt {
            Stmt::Store {
                buf,
                indices,
                value,
                mask,
            } => {
                if self.eval(mask)?.as_f64() == 0.0 {
                    return Ok(());
                }
                let offset = self.flat_offset(buf, indices)?;
                let value = self.eval(value)?.as_f64();
                let size = self.buffer_size(buf)?;
                let storage = self
                    .buffers
                    .entry(buf.name().to_string())
                    .or_insert_with(|| vec![0.0; size]);
                // A caller-bound buffer may be shorter than its shape implies.
                let len = storage.len();
                let slot = storage.get_mut(offset).ok_or_else(|| EvalError::ShortBuffer {
                    buf: buf.name().to_string(),
                    len,
                    offset,
                })?;
                *slot = value;
                Ok(())
            }
            Stmt::For {
                var,
                start,
                stop,
                body,
            } => {
                let start = self.eval(start)?.as_bound()?;
                let stop = self.eval(stop)?.as_bound()?;
                trace!("for {var} in {start}..{stop}");
                // A stop at or below start is an empty loop, not an error.
                let mut result = Ok(());
                for i in start..stop {
                    self.bindings.insert(var.clone(), i);
                    if let Err(e) = self.exec(body) {
                        result = Err(e);
                        break;
                    }
                }
                // The binding is scoped to the loop even when the body errors.
                self.bindings.remove(var);
                result
            }
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.exec(s)?;
                }
                Ok(())
            }
        }
    }

    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr.kind() {
            ExprKind::IntImm(v) => Ok(Value::Int(*v)),
            ExprKind::FloatImm(v) => Ok(Value::Float(*v)),
            ExprKind::Var(v) => self
                .bindings
                .get(v)
                .copied()
                .map(Value::Int)
                .ok_or_else(|| EvalError::UnboundVar(v.to_string())),
            ExprKind::Add(l, r) => self.binary(l, r, |a, b| a + b, |a, b| a + b),
            ExprKind::Sub(l, r) => self.binary(l, r, |a, b| a - b, |a, b| a - b),
            ExprKind::Mul(l, r) => self.binary(l, r, |a, b| a * b, |a, b| a * b),
            ExprKind::Div(l, r) => {
                let (l, r) = (self.eval(l)?, self.eval(r)?);
                match (l, r) {
                    (Value::Int(a), Value::Int(b)) => {
                        if b == 0 {
                            Err(EvalError::DivisionByZero)
                        } else {
                            Ok(Value::Int(a / b))
                        }
                    }
                    _ => Ok(Value::Float(l.as_f64() / r.as_f64())),
                }
            }
            ExprKind::Max(l, r) => self.binary(l, r, i64::max, f64::max),
            ExprKind::Min(l, r) => self.binary(l, r, i64::min, f64::min),
            ExprKind::Load { buf, indices } => {
                let offset = self.flat_offset(buf, indices)?;
                let storage = self
                    .buffers
                    .get(buf.name())
                    .ok_or_else(|| EvalError::UnknownBuffer(buf.name().to_string()))?;
                let v = storage.get(offset).ok_or_else(|| EvalError::ShortBuffer {
                    buf: buf.name().to_string(),
                    len: storage.len(),
                    offset,
                })?;
                Ok(Value::Float(*v))
            }
        }
    }

    fn binary(
        &self,
        l: &Expr,
        r: &Expr,
        int_op: impl Fn(i64, i64) -> i64,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, EvalError> {
        let (l, r) = (self.eval(l)?, self.eval(r)?);
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
            _ => Ok(Value::Float(float_op(l.as_f64(), r.as_f64()))),
        }
    }

    // Row-major flattening with bounds checks against the buffer's shape.
    fn flat_offset(&self, buf: &Buf, indices: &[Expr]) -> Result<usize, EvalError> {
        let mut offset: i64 = 0;
        for (idx, dim) in indices.iter().zip(buf.dims()) {
            let extent = self.eval(dim)?.as_bound()?;
            let i = self.eval(idx)?.as_bound()?;
            if i < 0 || i >= extent {
                return Err(EvalError::OutOfBounds {
                    buf: buf.name().to_string(),
                    index: i,
                    extent,
                });
            }
            offset = offset * extent + i;
        }
        Ok(offset as usize)
    }

    fn buffer_size(&self, buf: &Buf) -> Result<usize, EvalError> {
        let mut size: i64 = 1;
        for dim in buf.dims() {
            size *= self.eval(dim)?.as_bound()?;
        }
        Ok(size.max(0) as usize)
    }
}

//! The `Tensor` entity, its builders, and loop-nest lowering.
//!
//! A [`Tensor`] is a named, shaped value defined either by a body
//! expression over index variables (functional form) or by a backing
//! buffer whose contents are already materialized (expanded form).
//! Builders validate arity up front; [`Tensor::lower_to_stmt`] then
//! deterministically expands the definition into a canonical nested-loop
//! statement tree for a downstream scheduler to consume.

use crate::buf::{Buf, Placeholder};
use crate::dim::{unpack_dim_args, DimArg};
use crate::error::{Error, Result};
use crate::expr::{Expr, Var};
use crate::reducer::Reducer;
use crate::stmt::Stmt;
use log::{debug, trace};

/// A declarative tensor definition.
///
/// Immutable after construction. `dims` and `args` are always parallel,
/// as are `reduce_dims` and `reduce_args`. A tensor with no `body` is
/// already expanded: its storage is materialized elsewhere and it carries
/// no further lowering obligation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    buf: Buf,
    dims: Vec<Expr>,
    args: Vec<Var>,
    reduce_dims: Vec<Expr>,
    reduce_args: Vec<Var>,
    body: Option<Expr>,
}

/// A body callable for [`Tensor::compute`].
///
/// Implemented for closures of fixed arity zero through four (each index
/// variable passed by value) and for the variadic form
/// `FnOnce(&[Var]) -> Expr`. Fixed-arity callables declare their expected
/// rank so the builder can reject a mismatched dimension list before the
/// callable runs; the variadic form accepts any rank.
///
/// The `Marker` parameter only disambiguates the closure signatures; it is
/// inferred. One-argument closures need a parameter annotation (`|i: Var|`
/// or `|axes: &[Var]|`) to pick a form.
pub trait ComputeBody<Marker> {
    /// The rank this callable expects, or `None` for the variadic form.
    fn expected_rank(&self) -> Option<usize>;

    /// Invokes the callable; `vars.len()` has already been validated.
    fn invoke(self, vars: &[Var]) -> Expr;
}

/// Marker for the variadic `FnOnce(&[Var]) -> Expr` form.
pub struct Variadic;

impl<F> ComputeBody<Variadic> for F
where
    F: FnOnce(&[Var]) -> Expr,
{
    fn expected_rank(&self) -> Option<usize> {
        None
    }

    fn invoke(self, vars: &[Var]) -> Expr {
        self(vars)
    }
}

macro_rules! var_ty {
    ($v:ident) => {
        Var
    };
}

macro_rules! impl_compute_body {
    ($arity:literal $(, $v:ident)*) => {
        impl<F> ComputeBody<[Var; $arity]> for F
        where
            F: FnOnce($(var_ty!($v)),*) -> Expr,
        {
            fn expected_rank(&self) -> Option<usize> {
                Some($arity)
            }

            #[allow(unused_variables)]
            fn invoke(self, vars: &[Var]) -> Expr {
                let [$($v),*] = vars else {
                    unreachable!("arity validated before invocation");
                };
                self($($v.clone()),*)
            }
        }
    };
}

impl_compute_body!(0);
impl_compute_body!(1, a);
impl_compute_body!(2, a, b);
impl_compute_body!(3, a, b, c);
impl_compute_body!(4, a, b, c, d);

impl Tensor {
    /// Builds a tensor in functional form from a shape and a body callable.
    ///
    /// Dimensions are unpacked into extents and fresh index variables; the
    /// callable receives the variables in dimension order and returns the
    /// scalar expression computed at each output index.
    ///
    /// Fails with [`Error::MalformedInput`] when a fixed-arity callable's
    /// rank differs from `dim_args.len()`; the callable is not invoked in
    /// that case and no tensor is produced.
    ///
    /// ```
    /// use weft::{DimArg, Placeholder, Tensor, Var};
    ///
    /// let a = Placeholder::new("a", &[4i64, 4]);
    /// let add = Tensor::compute(
    ///     "add",
    ///     &[DimArg::named(4i64, "i"), DimArg::named(4i64, "j")],
    ///     |i: Var, j: Var| a.load(&[i, j]) + 1i64,
    /// )
    /// .unwrap();
    /// assert_eq!(add.ndim(), 2);
    /// ```
    pub fn compute<M>(
        name: impl Into<String>,
        dim_args: &[DimArg],
        body: impl ComputeBody<M>,
    ) -> Result<Tensor> {
        if let Some(rank) = body.expected_rank() {
            if rank != dim_args.len() {
                return Err(Error::MalformedInput(format!(
                    "mismatch between body and arg size ({} vs {})",
                    rank,
                    dim_args.len()
                )));
            }
        }
        let name = name.into();
        let (dims, args) = unpack_dim_args(dim_args);
        let body = body.invoke(&args);
        trace!("compute tensor '{name}' with {} axes", dims.len());
        let buf = Buf::new(name, dims.clone());
        Ok(Tensor {
            buf,
            dims,
            args,
            reduce_dims: Vec::new(),
            reduce_args: Vec::new(),
            body: Some(body),
        })
    }

    /// Builds a reduction over a placeholder buffer.
    ///
    /// The value at each output index is the fold, over the reduction
    /// axes, of the buffer read at the concatenation of output and
    /// reduction variables, combined by `reducer`. The output buffer's
    /// initializer is the reducer's initializer.
    ///
    /// Fails with [`Error::MalformedInput`] when the source rank differs
    /// from `dim_args.len() + reduce_dim_args.len()`.
    pub fn reduce(
        name: impl Into<String>,
        dim_args: &[DimArg],
        reducer: &Reducer,
        source: &Placeholder,
        reduce_dim_args: &[DimArg],
    ) -> Result<Tensor> {
        Self::reduce_with(
            name,
            dim_args,
            reducer,
            source.ndim(),
            |indices| source.load(indices),
            reduce_dim_args,
        )
    }

    /// Builds a reduction over another tensor's indexed read.
    ///
    /// The source tensor must be materialized (its own lowered statement
    /// executed) before the reduction's statement runs.
    pub fn reduce_over(
        name: impl Into<String>,
        dim_args: &[DimArg],
        reducer: &Reducer,
        source: &Tensor,
        reduce_dim_args: &[DimArg],
    ) -> Result<Tensor> {
        Self::reduce_with(
            name,
            dim_args,
            reducer,
            source.ndim(),
            |indices| source.call(indices),
            reduce_dim_args,
        )
    }

    // Shared reduction builder, parameterized by the source's indexed read.
    fn reduce_with(
        name: impl Into<String>,
        dim_args: &[DimArg],
        reducer: &Reducer,
        source_rank: usize,
        read: impl FnOnce(&[Expr]) -> Expr,
        reduce_dim_args: &[DimArg],
    ) -> Result<Tensor> {
        let rank = dim_args.len() + reduce_dim_args.len();
        if source_rank != rank {
            return Err(Error::MalformedInput(format!(
                "mismatch between reduction source and arg size ({source_rank} vs {rank})"
            )));
        }
        let name = name.into();
        let (dims, args) = unpack_dim_args(dim_args);
        let (reduce_dims, reduce_args) = unpack_dim_args(reduce_dim_args);
        let indices: Vec<Expr> = args
            .iter()
            .chain(reduce_args.iter())
            .map(Expr::from)
            .collect();
        let value = read(&indices);
        trace!(
            "reduce tensor '{name}' with {} output axes, {} reduction axes",
            dims.len(),
            reduce_dims.len()
        );
        let buf = Buf::with_initializer(name, dims.clone(), reducer.initializer().clone());
        let out_indices: Vec<Expr> = args.iter().map(Expr::from).collect();
        let acc = buf.load(&out_indices);
        let body = reducer.combine(acc, value);
        Ok(Tensor {
            buf,
            dims,
            args,
            reduce_dims,
            reduce_args,
            body: Some(body),
        })
    }

    /// Builds an already-expanded tensor: a bodyless definition over a
    /// fresh buffer whose contents are materialized elsewhere.
    pub fn expanded(name: impl Into<String>, dim_args: &[DimArg]) -> Tensor {
        let (dims, args) = unpack_dim_args(dim_args);
        let buf = Buf::new(name, dims.clone());
        Tensor {
            buf,
            dims,
            args,
            reduce_dims: Vec::new(),
            reduce_args: Vec::new(),
            body: None,
        }
    }

    pub fn name(&self) -> &str {
        self.buf.name()
    }

    pub fn buf(&self) -> &Buf {
        &self.buf
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn reduce_ndim(&self) -> usize {
        self.reduce_dims.len()
    }

    pub fn dim(&self, i: usize) -> &Expr {
        &self.dims[i]
    }

    pub fn arg(&self, i: usize) -> &Var {
        &self.args[i]
    }

    pub fn reduce_dim(&self, i: usize) -> &Expr {
        &self.reduce_dims[i]
    }

    pub fn reduce_arg(&self, i: usize) -> &Var {
        &self.reduce_args[i]
    }

    pub fn args(&self) -> &[Var] {
        &self.args
    }

    pub fn body(&self) -> Option<&Expr> {
        self.body.as_ref()
    }

    /// An indexed read of this tensor's backing buffer.
    pub fn call<I>(&self, indices: &[I]) -> Expr
    where
        I: Clone + Into<Expr>,
    {
        self.buf.load(indices)
    }

    fn store_indices(&self) -> Vec<Expr> {
        self.args.iter().map(Expr::from).collect()
    }

    /// The innermost imperative action: a store of the body expression
    /// into the backing buffer at the tensor's index tuple, under an
    /// always-true mask.
    ///
    /// An expanded tensor has no body; its element statement stores the
    /// buffer's own value at the same indices, an identity store that
    /// downstream passes elide.
    pub fn element_stmt(&self) -> Stmt {
        let indices = self.store_indices();
        let value = match &self.body {
            Some(body) => body.clone(),
            None => self.buf.load(&indices),
        };
        Stmt::store(self.buf.clone(), indices, value)
    }

    /// Expands this tensor into its full, independently executable
    /// loop-nest statement.
    ///
    /// Output axes enclose reduction axes so the accumulator is reset once
    /// per output index; within each axis group the first-declared axis
    /// becomes the outermost loop, matching row-major iteration. When the
    /// backing buffer carries an initializer, a store of it precedes the
    /// reduction nest inside a block.
    ///
    /// Idempotent: repeated calls allocate fresh nodes but always yield
    /// structurally equal trees. Loop bounds are not validated; an extent
    /// that is zero or negative at execution time gives an empty loop.
    pub fn lower_to_stmt(&self) -> Stmt {
        let mut s = self.element_stmt();

        // An expanded tensor's storage is pre-materialized; wrapping it in
        // loops again would be redundant.
        if self.body.is_none() {
            trace!("tensor '{}' is already expanded", self.name());
            return s;
        }

        if self.ndim() == 0 && self.reduce_ndim() == 0 {
            trace!("tensor '{}' is a pure scalar", self.name());
            return s;
        }

        debug!(
            "lowering '{}': {} output axes, {} reduction axes",
            self.name(),
            self.ndim(),
            self.reduce_ndim()
        );

        if self.reduce_ndim() > 0 {
            // Innermost loop first: iterate the reduction axes in reverse
            // declaration order.
            for (var, extent) in self.reduce_args.iter().zip(&self.reduce_dims).rev() {
                trace!("wrapping reduction axis {var}");
                s = Stmt::for_loop(var.clone(), 0i64, extent.clone(), s);
            }
            if let Some(init) = self.buf.initializer() {
                let init_store = Stmt::store(self.buf.clone(), self.store_indices(), init.clone());
                s = Stmt::block(vec![init_store, s]);
            }
        }

        for (var, extent) in self.args.iter().zip(&self.dims).rev() {
            trace!("wrapping output axis {var}");
            s = Stmt::for_loop(var.clone(), 0i64, extent.clone(), s);
        }
        s
    }
}

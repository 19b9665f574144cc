//! Ufunc descriptor and inner-loop registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nd_dtype::{CastOperand, CastOracle, CastingRule, Descr, TypeNum};

use crate::resolve::default_type_resolution;
use crate::{Result, UfuncError};

/// Inner loop over one run of `len` elements.
///
/// `args[k]` points at the first element of operand `k` and `steps[k]` is
/// its byte stride. Inputs come first, then outputs.
///
/// # Safety
///
/// Every `args[k] + i * steps[k]` for `i < len` must be valid for reads (and
/// writes, for outputs) of one element of the dtype the loop was registered
/// for.
pub type LoopFn = unsafe fn(args: &[*mut u8], len: usize, steps: &[isize], data: Option<&LoopData>);

/// Opaque per-loop data handed back to the loop on every call.
#[derive(Clone)]
pub struct LoopData(Arc<dyn Any + Send + Sync>);

impl LoopData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for LoopData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoopData(..)")
    }
}

/// A loop function together with its data.
#[derive(Clone)]
pub struct InnerLoop {
    pub func: LoopFn,
    pub data: Option<LoopData>,
}

impl InnerLoop {
    pub fn new(func: LoopFn) -> Self {
        Self { func, data: None }
    }

    pub fn with_data(func: LoopFn, data: LoopData) -> Self {
        Self {
            func,
            data: Some(data),
        }
    }

    /// Run the loop once over `len` elements.
    ///
    /// # Safety
    ///
    /// Same contract as [`LoopFn`].
    #[inline]
    pub unsafe fn call(&self, args: &[*mut u8], len: usize, steps: &[isize]) {
        (self.func)(args, len, steps, self.data.as_ref())
    }

    /// Whether both loops run the same function.
    pub fn same_func(&self, other: &InnerLoop) -> bool {
        self.func as usize == other.func as usize
    }
}

impl fmt::Debug for InnerLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InnerLoop")
            .field("func", &(self.func as *const ()))
            .field("data", &self.data)
            .finish()
    }
}

/// A loop registered for a user-defined type.
#[derive(Clone, Debug)]
pub struct UserLoop {
    arg_types: Vec<TypeNum>,
    inner: InnerLoop,
}

impl UserLoop {
    pub fn arg_types(&self) -> &[TypeNum] {
        &self.arg_types
    }

    pub fn inner_loop(&self) -> &InnerLoop {
        &self.inner
    }
}

/// One entry of an explicitly requested signature.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeSpec {
    Descr(Descr),
    Code(char),
}

impl From<Descr> for TypeSpec {
    fn from(d: Descr) -> Self {
        TypeSpec::Descr(d)
    }
}

impl From<char> for TypeSpec {
    fn from(c: char) -> Self {
        TypeSpec::Code(c)
    }
}

/// Explicitly requested loop signature: a tuple of one type (the first
/// output) or of every operand type, or a type string such as `"d"` or
/// `"dd->d"`.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeTup {
    Tuple(Vec<TypeSpec>),
    Str(String),
}

impl From<&str> for TypeTup {
    fn from(s: &str) -> Self {
        TypeTup::Str(s.to_string())
    }
}

/// Outcome of type resolution: the dtype of every operand and the loop to run.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub dtypes: Vec<Descr>,
    pub inner_loop: InnerLoop,
}

/// Signature shared by every type resolver.
///
/// `operands` holds `nin + nout` entries; inputs are required, outputs are
/// `None` when the caller lets the ufunc allocate them.
pub type TypeResolutionFn = fn(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved>;

/// Element-wise function descriptor.
///
/// `types` is a row-major table with `nargs` tags per loop; row `i` runs
/// `loops[i]`. The table is fixed at construction; user loops can be added
/// afterwards.
pub struct Ufunc {
    name: String,
    doc: String,
    nin: usize,
    nout: usize,
    types: Vec<TypeNum>,
    loops: Vec<InnerLoop>,
    userloops: HashMap<TypeNum, Vec<UserLoop>>,
    type_resolver: TypeResolutionFn,
}

impl Ufunc {
    pub fn new(
        name: impl Into<String>,
        nin: usize,
        nout: usize,
        types: Vec<TypeNum>,
        loops: Vec<InnerLoop>,
    ) -> Result<Self> {
        let name = name.into();
        let expected = loops.len() * (nin + nout);
        if types.len() != expected {
            return Err(UfuncError::InvalidDescriptor {
                name,
                len: types.len(),
                expected,
            });
        }
        Ok(Self {
            name,
            doc: String::new(),
            nin,
            nout,
            types,
            loops,
            userloops: HashMap::new(),
            type_resolver: default_type_resolution,
        })
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_type_resolver(mut self, resolver: TypeResolutionFn) -> Self {
        self.type_resolver = resolver;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    #[inline]
    pub fn nin(&self) -> usize {
        self.nin
    }

    #[inline]
    pub fn nout(&self) -> usize {
        self.nout
    }

    #[inline]
    pub fn nargs(&self) -> usize {
        self.nin + self.nout
    }

    /// Number of rows in the built-in table.
    #[inline]
    pub fn ntypes(&self) -> usize {
        self.loops.len()
    }

    /// Tags of row `i`.
    pub fn row(&self, i: usize) -> &[TypeNum] {
        let n = self.nargs();
        &self.types[i * n..(i + 1) * n]
    }

    pub fn inner_loop(&self, i: usize) -> &InnerLoop {
        &self.loops[i]
    }

    pub fn type_resolver(&self) -> TypeResolutionFn {
        self.type_resolver
    }

    pub fn has_user_loops(&self) -> bool {
        !self.userloops.is_empty()
    }

    /// Loops registered for `type_num`, in registration order.
    pub fn user_loops(&self, type_num: TypeNum) -> &[UserLoop] {
        self.userloops
            .get(&type_num)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Register a loop for a user-defined type.
    ///
    /// A loop with the same signature replaces the earlier one in place;
    /// otherwise the loop is appended and is tried after those registered
    /// before it.
    pub fn register_loop_for_type(
        &mut self,
        user_type: TypeNum,
        signature: Vec<TypeNum>,
        func: LoopFn,
        data: Option<LoopData>,
    ) -> Result<()> {
        if !user_type.is_user_defined() {
            return Err(UfuncError::BuiltinLoopRegistration(user_type));
        }
        if signature.len() != self.nargs() {
            return Err(UfuncError::SignatureLength {
                len: signature.len(),
                nargs: self.nargs(),
            });
        }
        let inner = InnerLoop { func, data };
        let list = self.userloops.entry(user_type).or_default();
        match list.iter_mut().find(|l| l.arg_types == signature) {
            Some(existing) => existing.inner = inner,
            None => list.push(UserLoop {
                arg_types: signature,
                inner,
            }),
        }
        log::debug!(
            "ufunc {}: {} loop(s) registered for type {}",
            self.name,
            list.len(),
            user_type
        );
        Ok(())
    }

    /// Resolve with the ufunc's own resolver.
    pub fn resolve(
        &self,
        casting: CastingRule,
        operands: &[Option<&dyn CastOperand>],
        type_tup: Option<&TypeTup>,
        oracle: &dyn CastOracle,
    ) -> Result<Resolved> {
        (self.type_resolver)(self, casting, operands, type_tup, oracle)
    }
}

impl fmt::Debug for Ufunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ufunc")
            .field("name", &self.name)
            .field("nin", &self.nin)
            .field("nout", &self.nout)
            .field("ntypes", &self.ntypes())
            .field("user_types", &self.userloops.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn noop(_: &[*mut u8], _: usize, _: &[isize], _: Option<&LoopData>) {}

    unsafe fn other(_: &[*mut u8], _: usize, _: &[isize], _: Option<&LoopData>) {}

    #[test]
    fn test_table_length_is_checked() {
        let err = Ufunc::new("neg", 1, 1, vec![TypeNum::DOUBLE], vec![InnerLoop::new(noop)])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ufunc neg: type table has 1 entries, expected 2"
        );
        let u = Ufunc::new(
            "neg",
            1,
            1,
            vec![TypeNum::DOUBLE, TypeNum::DOUBLE],
            vec![InnerLoop::new(noop)],
        )
        .unwrap()
        .with_doc("negative");
        assert_eq!(u.row(0), &[TypeNum::DOUBLE, TypeNum::DOUBLE]);
        assert_eq!(u.doc(), "negative");
    }

    #[test]
    fn test_register_replaces_identical_signature() {
        let mut u = Ufunc::new("f", 1, 1, vec![], vec![]).unwrap();
        let t = TypeNum(TypeNum::USERDEF);
        u.register_loop_for_type(t, vec![t, t], noop, None).unwrap();
        u.register_loop_for_type(t, vec![t, TypeNum::DOUBLE], noop, None)
            .unwrap();
        u.register_loop_for_type(t, vec![t, t], other, Some(LoopData::new(7u32)))
            .unwrap();
        let loops = u.user_loops(t);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].arg_types(), &[t, t]);
        assert!(loops[0].inner_loop().same_func(&InnerLoop::new(other)));
        let data = loops[0].inner_loop().data.as_ref().unwrap();
        assert_eq!(data.downcast_ref::<u32>(), Some(&7));
        assert_eq!(loops[1].arg_types(), &[t, TypeNum::DOUBLE]);
    }

    #[test]
    fn test_register_rejects_builtin_and_bad_length() {
        let mut u = Ufunc::new("f", 1, 1, vec![], vec![]).unwrap();
        assert_eq!(
            u.register_loop_for_type(TypeNum::DOUBLE, vec![TypeNum::DOUBLE; 2], noop, None),
            Err(UfuncError::BuiltinLoopRegistration(TypeNum::DOUBLE))
        );
        let t = TypeNum(TypeNum::USERDEF + 1);
        assert_eq!(
            u.register_loop_for_type(t, vec![t], noop, None),
            Err(UfuncError::SignatureLength { len: 1, nargs: 2 })
        );
        assert!(!u.has_user_loops());
    }
}

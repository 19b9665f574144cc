//! Universal-function type resolution and inner-loop dispatch.
//!
//! A [`Ufunc`] owns a table of type signatures with one inner loop per row,
//! plus loops registered later for user-defined types. Resolution picks the
//! row (or user loop) that the operands can be cast to and reports the
//! concrete dtype of every operand; the caller then runs the loop over its
//! buffers.
//!
//! # Resolvers
//!
//! - [`default_type_resolution`]: linear search over user loops then rows
//! - [`simple_binary_comparison_type_resolution`],
//!   [`simple_unary_operation_type_resolution`],
//!   [`simple_binary_operation_type_resolution`],
//!   [`absolute_type_resolution`], [`ones_like_type_resolution`]: promote
//!   first, then look the row up by type
//! - [`addition_type_resolution`] and friends: datetime/timedelta arithmetic
//! - [`default_type_resolution_masked`]: wraps any resolver's loop so it only
//!   runs where a mask is set

pub mod datetime;
pub mod masked;
pub mod resolve;
pub mod simple;
mod ufunc;

pub use datetime::{
    addition_type_resolution, division_type_resolution, multiplication_type_resolution,
    subtraction_type_resolution,
};
pub use masked::{default_type_resolution_masked, MaskedLoop, MaskedResolved, MaskerData};
pub use resolve::{
    default_type_resolution, find_best_inner_loop, find_specified_inner_loop, validate_casting,
};
pub use simple::{
    absolute_type_resolution, ones_like_type_resolution,
    simple_binary_comparison_type_resolution, simple_binary_operation_type_resolution,
    simple_unary_operation_type_resolution,
};
pub use ufunc::{
    InnerLoop, LoopData, LoopFn, Resolved, TypeResolutionFn, TypeSpec, TypeTup, Ufunc, UserLoop,
};

use nd_dtype::{CastingRule, DtypeError, TypeNum};

/// Errors raised while resolving or registering ufunc loops.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UfuncError {
    #[error(
        "ufunc '{name}' output (typecode '{src}') could not be coerced to provided output \
         parameter (typecode '{dst}') according to the casting rule {rule}"
    )]
    OutputCoercion {
        name: String,
        src: char,
        dst: char,
        rule: CastingRule,
    },

    #[error(
        "ufunc '{name}' not supported for the input types, and the inputs could not be \
         safely coerced to any supported types according to the casting rule {rule}"
    )]
    UnsupportedInputTypes { name: String, rule: CastingRule },

    /// A row (or user loop) matched the requested signature but the operands
    /// cannot be cast to it.
    #[error(
        "found a {kind} for ufunc '{name}' matching the type-tuple, but the inputs and/or \
         outputs could not be cast according to the casting rule"
    )]
    SpecifiedLoopCasting { name: String, kind: &'static str },

    #[error("No loop matching the specified signature was found for ufunc {name}")]
    NoMatchingSignature { name: String },

    #[error("a type-tuple must be specified of length 1 or {nop} for ufunc '{name}'")]
    BadTypeTupleLength { name: String, nop: usize },

    #[error(
        "a type-string for {name}, requires 1 typecode, or {nin} typecode(s) before and \
         {nout} after the -> sign"
    )]
    BadTypeString {
        name: String,
        nin: usize,
        nout: usize,
    },

    #[error("Cannot cast ufunc {name} input from {from} to {to} with casting rule {rule}")]
    InputCast {
        name: String,
        from: String,
        to: String,
        rule: CastingRule,
    },

    #[error("Cannot cast ufunc {name} output from {from} to {to} with casting rule {rule}")]
    OutputCast {
        name: String,
        from: String,
        to: String,
        rule: CastingRule,
    },

    /// A specialized resolver was attached to a ufunc of the wrong shape.
    #[error(
        "ufunc {name} is configured to use {kind} type resolution but has the wrong number \
         of inputs or outputs"
    )]
    WrongArity { name: String, kind: &'static str },

    #[error("require data type in the type tuple")]
    RequireDtype,

    #[error("ufunc '{name}' not supported for the input types")]
    NotSupported { name: String },

    #[error("user type shouldn't have resulted from type promotion")]
    UserTypeFromPromotion,

    #[error("internal error: could not find appropriate datetime inner loop in {name} ufunc")]
    DatetimeLoopMissing { name: String },

    #[error("ufunc {name} cannot use operands with types {a} and {b}")]
    DatetimeOperands { name: String, a: String, b: String },

    /// The type table does not hold `nargs` tags per loop.
    #[error("ufunc {name}: type table has {len} entries, expected {expected}")]
    InvalidDescriptor {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("loops can only be registered for user-defined types, not {0}")]
    BuiltinLoopRegistration(TypeNum),

    #[error("loop signature has {len} types but the ufunc takes {nargs} arguments")]
    SignatureLength { len: usize, nargs: usize },

    #[error("ufunc {name} expects {expected} operands, got {got}")]
    OperandCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("ufunc {name}: input operand {index} is required")]
    MissingInput { name: String, index: usize },

    #[error(transparent)]
    Dtype(#[from] DtypeError),
}

/// Result type for ufunc operations.
pub type Result<T> = std::result::Result<T, UfuncError>;

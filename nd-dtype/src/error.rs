use crate::datetime::DatetimeMeta;
use crate::TypeNum;

/// Errors raised by the dtype layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DtypeError {
    #[error("unknown type number {0}")]
    UnknownType(TypeNum),

    #[error("data type \"{0}\" not understood")]
    UnknownTypecode(char),

    #[error("invalid type promotion between {0} and {1}")]
    InvalidPromotion(String, String),

    #[error(
        "Cannot get a common metadata divisor for datetime metadata {0} and {1} \
         because they have incompatible nonlinear base time units"
    )]
    IncompatibleDatetimeUnits(DatetimeMeta, DatetimeMeta),

    #[error("Datetime type object is invalid, lacks unit metadata")]
    MissingDatetimeMeta,

    #[error("at least one array or dtype is required")]
    NoOperands,

    #[error("user-defined type {0} is already registered")]
    DuplicateUserType(String),

    #[error("user-defined type {0} needs a nonzero element size")]
    InvalidUserType(String),
}

/// Out-of-range index under the raising clip mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index out of range for array")]
pub struct IndexOutOfRange;

/// Convenience alias for `Result<T, DtypeError>`.
pub type Result<T> = std::result::Result<T, DtypeError>;

use std::fmt;

/// Every failure the engine can raise.
///
/// Overflow is not listed: a finite computation that overflows to `±∞` is
/// saturated to `f64::MAX` / `f64::MIN` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand or argument dimensions disagree.
    ShapeMismatch(String),
    /// A hyperparameter is out of range, or too few operands were given.
    InvalidArgument(String),
    /// A computation produced `NaN` (or an activation went infinite).
    NumericFault(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShapeMismatch(msg) => write!(f, "shape mismatch: {msg}"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::NumericFault(msg) => write!(f, "numeric fault: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

//! Dispatch sentinels.
//!
//! These are the only failures the dispatcher reports on its own. Each one is
//! delivered to the caller as plain text, so the wording below is part of the
//! contract with the chat users reading it.

use thiserror::Error;

/// Reply for input that is neither a bare identifier nor a single-level call.
pub const CALL_UNKNOWN_EXPRESSION: &str = "unknown expression";

/// Reply for a name with no matching operation.
pub const CALL_UNKNOWN_FUNCTION: &str = "unknown function";

/// Reply when fewer arguments than required were supplied.
pub const CALL_TOO_FEW_ARGUMENTS: &str = "too few arguments";

/// Reply when a fixed-arity operation received extra arguments.
pub const CALL_TOO_MANY_ARGUMENTS: &str = "too many arguments";

/// Errors produced while parsing, resolving or binding a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CallError {
    /// Grammar violation.
    #[error("{}", CALL_UNKNOWN_EXPRESSION)]
    UnknownExpression,

    /// No operation matches the parsed name.
    #[error("{}", CALL_UNKNOWN_FUNCTION)]
    UnknownFunction,

    /// Fewer positional arguments than the signature's required minimum.
    #[error("{}", CALL_TOO_FEW_ARGUMENTS)]
    TooFewArguments,

    /// More positional arguments than a fixed-arity signature accepts.
    #[error("{}", CALL_TOO_MANY_ARGUMENTS)]
    TooManyArguments,
}

impl CallError {
    /// The sentinel text for this error.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownExpression => CALL_UNKNOWN_EXPRESSION,
            Self::UnknownFunction => CALL_UNKNOWN_FUNCTION,
            Self::TooFewArguments => CALL_TOO_FEW_ARGUMENTS,
            Self::TooManyArguments => CALL_TOO_MANY_ARGUMENTS,
        }
    }
}

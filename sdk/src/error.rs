//! Leaf error types shared by several modules.
//!
//! Module-specific failures live next to the code that raises them
//! (`KeyError`, `TokenError`, `ResolveError`, ...). The two types here are
//! the generic ones that more than one module needs to surface unchanged.

use thiserror::Error;

/// A precondition on a caller-supplied value did not hold.
///
/// Carries the parameter name, what was wrong with it and the offending
/// value so the message is useful without a debugger attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameter `{parameter}`: {reason} (got {value:?})")]
pub struct ParameterError {
    pub parameter: &'static str,
    pub reason: String,
    pub value: String,
}

impl ParameterError {
    pub fn new(parameter: &'static str, reason: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter,
            reason: reason.into(),
            value: value.into(),
        }
    }
}

/// The operation exists in the API but nothing backs it yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} is not implemented: {reason}")]
pub struct NotImplementedError {
    pub operation: &'static str,
    pub reason: &'static str,
}

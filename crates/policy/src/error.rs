//! Stable error identifiers for the decision engine, matching the wire-level
//! `ERR_DOTNOPE_*` codes the spec defines. The `code()` method is what tests
//! and callers should assert on; the `Display` message is for humans.

use crate::model::Operation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("package '{package}' is not authorized to {operation} '{variable}'")]
    Unauthorized {
        package: String,
        variable: String,
        operation: Operation,
    },
    #[error("caller identity could not be determined and fail-closed is enabled")]
    UnknownCaller,
    #[error("caller originates from dynamically loaded code and allow_eval is disabled")]
    EvalContext,
}

impl DecisionError {
    /// The stable `ERR_DOTNOPE_*` identifier this error corresponds to.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "ERR_DOTNOPE_UNAUTHORIZED",
            Self::UnknownCaller => "ERR_DOTNOPE_UNKNOWN_CALLER",
            Self::EvalContext => "ERR_DOTNOPE_EVAL_CONTEXT",
        }
    }

    /// The finer-grained reason token used internally by the decision
    /// engine's per-operation branches (spec.md 4.3: `UNAUTHORIZED_READ`,
    /// `UNAUTHORIZED_WRITE`, `UNAUTHORIZED_DELETE`).
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unauthorized {
                operation: Operation::Read,
                ..
            } => "UNAUTHORIZED_READ",
            Self::Unauthorized {
                operation: Operation::Write,
                ..
            } => "UNAUTHORIZED_WRITE",
            Self::Unauthorized {
                operation: Operation::Delete,
                ..
            } => "UNAUTHORIZED_DELETE",
            Self::Unauthorized {
                operation: Operation::Enumerate,
                ..
            } => unreachable!("enumeration never denies through DecisionError::Unauthorized"),
            Self::UnknownCaller => "UNKNOWN_CALLER",
            Self::EvalContext => "EVAL_CONTEXT",
        }
    }
}

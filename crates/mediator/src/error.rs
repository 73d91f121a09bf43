//! Stable error identifiers for the runtime mediator and its control
//! surface, mirroring the `ERR_DOTNOPE_*` wire codes from spec.md 7 the
//! same way `dotnope_policy::DecisionError` does for the decision engine.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("a runtime mediator is already installed in this process")]
    AlreadyInstalled,
}

impl InstallError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInstalled => "ERR_DOTNOPE_ALREADY_INSTALLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("control token is invalid, empty, or does not match the installed handle")]
    InvalidToken,
    #[error("this control surface has been removed; call disable(token) instead")]
    Deprecated,
}

impl ControlError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "ERR_DOTNOPE_INVALID_TOKEN",
            Self::Deprecated => "ERR_DOTNOPE_DEPRECATED",
        }
    }
}

/// The union of everything that can go wrong answering a mediated
/// `get`/`set`/`remove`/`contains`/`var_names`/`descriptor` call: either
/// the mediator was never installed, or the decision engine denied it.
#[derive(Debug, Error)]
pub enum MediatorError {
    #[error("no runtime mediator is installed in this process")]
    NotInstalled,
    #[error(transparent)]
    Decision(#[from] dotnope_policy::DecisionError),
}

impl MediatorError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInstalled => "ERR_DOTNOPE_NOT_INSTALLED",
            Self::Decision(err) => err.code(),
        }
    }
}

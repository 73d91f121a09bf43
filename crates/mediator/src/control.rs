//! The Control Handle (C7): the single token-guarded teardown surface
//! returned by `install`. Spec.md 4.7 requires a legacy unconditional-disable
//! method that always fails; `disable_unconditional` is kept here as that
//! deliberately inert stub rather than deleted, since a caller discovering
//! it by name is exactly the scenario the spec wants to guard against.

use std::time::Instant;

use dotnope_policy::PolicyModel;

use crate::error::ControlError;
use crate::env;

pub struct ControlHandle {
    token: [u8; 16],
    installed_at: Instant,
    policy_id: u64,
    policy_snapshot: PolicyModel,
}

impl ControlHandle {
    pub(crate) fn new(
        token: [u8; 16],
        installed_at: Instant,
        policy_id: u64,
        policy_snapshot: PolicyModel,
    ) -> Self {
        Self {
            token,
            installed_at,
            policy_id,
            policy_snapshot,
        }
    }

    pub fn token(&self) -> &[u8; 16] {
        &self.token
    }

    pub fn installed_at(&self) -> Instant {
        self.installed_at
    }

    pub fn policy_id(&self) -> u64 {
        self.policy_id
    }

    /// Tear down enforcement. Once disabled, mediated calls pass through to
    /// the raw environment unconditionally; this is irreversible for the
    /// life of the process, matching spec.md 4.7.
    ///
    /// Validated against the process's currently active installation, not
    /// just against this handle's own stored token: a handle kept around
    /// from an installation that was already torn down (and possibly
    /// replaced by a later `install`) must not be able to disable that
    /// later, unrelated installation.
    pub fn disable(&self, token: &[u8]) -> Result<(), ControlError> {
        env::teardown(token)
    }

    /// Legacy surface, always refused. Exists only so callers migrating
    /// from an unconditional-disable API get a clear, stable error rather
    /// than a missing-method failure.
    pub fn disable_unconditional(&self) -> Result<(), ControlError> {
        Err(ControlError::Deprecated)
    }

    /// The policy this handle's install call was given, for a secondary
    /// thread that wants to call `install` again with an identical view
    /// (spec.md 5, "worker/secondary execution contexts").
    pub fn serializable_config(&self) -> PolicyModel {
        self.policy_snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotnope_policy::GlobalOptions;
    use std::collections::HashMap;

    fn handle_with_token(token: [u8; 16]) -> ControlHandle {
        ControlHandle::new(
            token,
            Instant::now(),
            1,
            PolicyModel::new(HashMap::new(), GlobalOptions::default()),
        )
    }

    #[test]
    fn disable_rejects_mismatched_token() {
        let handle = handle_with_token([1u8; 16]);
        assert_eq!(
            handle.disable(&[2u8; 16]).unwrap_err(),
            ControlError::InvalidToken
        );
    }

    #[test]
    fn disable_rejects_empty_token() {
        let handle = handle_with_token([1u8; 16]);
        assert_eq!(handle.disable(&[]).unwrap_err(), ControlError::InvalidToken);
    }

    #[test]
    fn disable_unconditional_always_fails() {
        let handle = handle_with_token([1u8; 16]);
        assert_eq!(
            handle.disable_unconditional().unwrap_err(),
            ControlError::Deprecated
        );
    }
}

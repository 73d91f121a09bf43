//! Runtime Mediator (C4) and Control Handle (C7) for the dotnope
//! environment-variable access firewall.
//!
//! This crate is the only sanctioned access path to the process
//! environment once installed: consumers call [`get`], [`set`], [`remove`],
//! [`contains`], [`var_names`], and [`descriptor`] instead of `std::env`
//! directly. Rust has no reassignable "environment object" to literally
//! substitute the way a scripting host can replace `process.env`, so this
//! crate honors that invariant at the API-surface level instead (see
//! DESIGN.md).

mod control;
mod env;
mod error;

pub use control::ControlHandle;
pub use env::{
    apply_reload_event, contains, descriptor, get, install, reload, remove, set, status, var_names,
    InstallOptions, MediatorStatus,
};
pub use error::{ControlError, InstallError, MediatorError};

#[cfg(test)]
mod tests {
    use super::*;
    use dotnope_policy::{GlobalOptions, PolicyModel};
    use serial_test::serial;
    use std::collections::HashMap;

    // The install sentinel is process-global; every test that installs must
    // run `#[serial]` so they don't observe each other's state.

    #[test]
    #[serial]
    fn install_then_reinstall_is_refused() {
        let model = PolicyModel::new(HashMap::new(), GlobalOptions::default());
        let handle = install(model.clone(), InstallOptions::default()).unwrap();
        assert!(status().installed);
        assert_eq!(
            install(model.clone(), InstallOptions::default()).unwrap_err(),
            InstallError::AlreadyInstalled
        );
        assert_eq!(handle.policy_id(), status().policy_id.unwrap());

        // clean up so later serialized tests in this binary start uninstalled
        handle.disable(handle.token()).unwrap();
    }

    #[test]
    #[serial]
    fn install_teardown_install_round_trips() {
        let model = PolicyModel::new(HashMap::new(), GlobalOptions::default());
        let handle = install(model.clone(), InstallOptions::default()).unwrap();
        handle.disable(handle.token()).unwrap();
        assert!(!status().installed);

        let second = install(model, InstallOptions::default()).unwrap();
        assert!(status().installed);
        second.disable(second.token()).unwrap();
        assert!(!status().installed);
    }

    #[test]
    #[serial]
    fn a_stale_handle_cannot_tear_down_a_later_installation() {
        let model = PolicyModel::new(HashMap::new(), GlobalOptions::default());
        let first = install(model.clone(), InstallOptions::default()).unwrap();
        first.disable(first.token()).unwrap();

        let second = install(model, InstallOptions::default()).unwrap();
        assert_eq!(
            first.disable(first.token()).unwrap_err(),
            ControlError::InvalidToken
        );
        assert!(status().installed);

        second.disable(second.token()).unwrap();
    }

    #[test]
    #[serial]
    fn reload_is_refused_without_an_active_installation() {
        let model = PolicyModel::new(HashMap::new(), GlobalOptions::default());
        assert!(matches!(reload(model).unwrap_err(), MediatorError::NotInstalled));
    }

    #[test]
    #[serial]
    fn reload_replaces_the_live_policy_and_bumps_the_policy_id() {
        let model = PolicyModel::new(HashMap::new(), GlobalOptions::default());
        let handle = install(model.clone(), InstallOptions::default()).unwrap();
        let before = status().policy_id;

        reload(model).unwrap();
        assert_ne!(status().policy_id, before);

        handle.disable(handle.token()).unwrap();
    }
}

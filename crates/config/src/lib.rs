//! Configuration Loader (C8) for the dotnope environment-variable access
//! firewall: parses the `environment_whitelist` document, resolves
//! workspace/global/default policy precedence, serializes the native
//! plane's `DOTNOPE_POLICY` string, and watches a policy file for edits.

mod doc;
mod load;
mod serialize;
mod watch;

pub use doc::ConfigDocument;
pub use load::{
    find_workspace_root, global_policy_path, load_effective_policy, load_global_policy_or_defaults,
    parse_policy_yaml, workspace_policy_path, PolicySource,
};
pub use serialize::to_native_policy_string;
pub use watch::{recv_timeout, watch_policy_file, ReloadEvent};

//! Policy resolution order: workspace override, then global, then the
//! built-in default — grounded on the teacher's
//! `execution::policy_model::load_effective_policy` and
//! `execution::workspace::find_workspace_root`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use dotnope_policy::PolicyModel;

use crate::doc::ConfigDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    Workspace,
    Global,
    Default,
}

pub fn global_policy_path() -> Result<PathBuf> {
    dotnope_common::paths::global_policy_file()
}

pub fn workspace_policy_path(workspace_root: &Path) -> PathBuf {
    dotnope_common::paths::workspace_policy_file(workspace_root)
}

/// Walk up from `start` looking for a directory carrying a `.dotnope.yaml`
/// override; the override file doubles as its own workspace marker.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| workspace_policy_path(dir).is_file())
        .map(Path::to_path_buf)
}

pub fn parse_policy_yaml(path: &Path, raw: &str) -> Result<PolicyModel> {
    let document: ConfigDocument = serde_yaml::from_str(raw)
        .map_err(|err| anyhow!("invalid YAML in {}: {}", path.display(), err.to_string().trim()))?;
    Ok(document.into_policy_model())
}

fn load_file(path: &Path) -> Result<PolicyModel> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_policy_yaml(path, &raw)
}

/// Load the global policy, or built-in defaults if none exists. Returns
/// whether a file was actually found, for diagnostics (`--status`).
pub fn load_global_policy_or_defaults() -> Result<(PolicyModel, bool)> {
    let path = global_policy_path()?;
    match fs::read_to_string(&path) {
        Ok(raw) => Ok((parse_policy_yaml(&path, &raw)?, true)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok((PolicyModel::default(), false)),
        Err(err) => Err(anyhow!("failed to read {}: {err}", path.display())),
    }
}

/// Workspace policy overrides global policy overrides the built-in default.
pub fn load_effective_policy(cwd: &Path) -> Result<(PolicyModel, PolicySource)> {
    if let Some(workspace_root) = find_workspace_root(cwd) {
        let path = workspace_policy_path(&workspace_root);
        if path.is_file() {
            return Ok((load_file(&path)?, PolicySource::Workspace));
        }
    }

    let global_path = global_policy_path()?;
    if global_path.is_file() {
        return Ok((load_file(&global_path)?, PolicySource::Global));
    }

    Ok((PolicyModel::default(), PolicySource::Default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_files_resolve_to_default() {
        let dir = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("DOTNOPE_HOME", dir.path().join("no-home"));
        }
        let (model, source) = load_effective_policy(dir.path()).unwrap();
        assert_eq!(source, PolicySource::Default);
        assert_eq!(model, PolicyModel::default());
        unsafe {
            std::env::remove_var("DOTNOPE_HOME");
        }
    }

    #[test]
    fn workspace_override_wins_over_global() {
        let dir = tempfile::tempdir().unwrap();
        let workspace_policy = workspace_policy_path(dir.path());
        fs::write(
            &workspace_policy,
            "environment_whitelist:\n  __options__: {}\n  cfg: [NODE_ENV]\n",
        )
        .unwrap();

        let (model, source) = load_effective_policy(dir.path()).unwrap();
        assert_eq!(source, PolicySource::Workspace);
        assert!(model.may_read("cfg", "NODE_ENV"));
    }

    #[test]
    fn parse_policy_yaml_rejects_malformed_documents() {
        let path = Path::new("/tmp/does-not-need-to-exist.yaml");
        assert!(parse_policy_yaml(path, "not: [valid").is_err());
    }
}

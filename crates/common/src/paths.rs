use anyhow::Result;
use std::path::PathBuf;

pub const DOTNOPE_DIR_NAME: &str = ".dotnope";

/// Root directory for dotnope's on-disk state, overridable for tests and
/// multi-tenant hosts via `DOTNOPE_HOME`.
pub fn dotnope_home() -> Result<PathBuf> {
    if let Ok(override_home) = std::env::var("DOTNOPE_HOME") {
        let trimmed = override_home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("No home directory found"))?
        .join(DOTNOPE_DIR_NAME))
}

/// The global policy file consulted when no workspace-local override exists.
pub fn global_policy_file() -> Result<PathBuf> {
    Ok(dotnope_home()?.join("policy.yaml"))
}

/// The workspace-local policy override, relative to a workspace root.
pub fn workspace_policy_file(workspace_root: &std::path::Path) -> PathBuf {
    workspace_root.join(".dotnope.yaml")
}

/// Default location of the native interposer manifest, adjacent to the
/// shared library itself (`<lib>.manifest.json`).
pub fn manifest_path_for(artifact: &std::path::Path) -> PathBuf {
    let mut name = artifact
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".manifest.json");
    artifact
        .parent()
        .map(|p| p.join(&name))
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotnope_home() {
        let path = dotnope_home().unwrap();
        assert!(path.ends_with(DOTNOPE_DIR_NAME));
        assert!(path.is_absolute());
    }

    #[test]
    fn test_global_policy_file() {
        let path = global_policy_file().unwrap();
        assert!(path.ends_with("policy.yaml"));
        assert!(path.parent().unwrap().ends_with(DOTNOPE_DIR_NAME));
    }

    #[test]
    fn test_workspace_policy_file() {
        let root = std::path::Path::new("/tmp/project");
        let path = workspace_policy_file(root);
        assert_eq!(path, PathBuf::from("/tmp/project/.dotnope.yaml"));
    }

    #[test]
    fn test_manifest_path_for() {
        let artifact = std::path::Path::new("/usr/lib/libdotnope_interposer.so");
        let manifest = manifest_path_for(artifact);
        assert_eq!(
            manifest,
            PathBuf::from("/usr/lib/libdotnope_interposer.so.manifest.json")
        );
    }
}

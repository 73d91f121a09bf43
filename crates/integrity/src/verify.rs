//! The Integrity Verifier (C6): hashes the native interposer artifact and
//! compares it against its adjacent manifest. Grounded on the teacher's
//! tree-hashing routine (`sha2::Sha256` over a file's bytes, hex-encoded);
//! this crate hashes a single artifact rather than a directory tree.

use std::fs;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::IntegrityError;
use crate::manifest::Manifest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningReason {
    ManifestAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefusedReason {
    Mismatch { expected: String, actual: String },
    SizeMismatch { expected: u64, actual: u64 },
}

/// Never an `Err` for a mismatched hash: a mismatch is a meaningful,
/// expected outcome (spec.md 7, "never panicking or aborting the process"),
/// not an exceptional condition. `Err` is reserved for I/O and parse
/// failures that leave verification unable to proceed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Warning(WarningReason),
    Refused(RefusedReason),
}

/// SHA-256 digest of a file's contents, hex-encoded lowercase.
pub fn compute_hash(artifact_path: &Path) -> Result<String, IntegrityError> {
    let mut file = fs::File::open(artifact_path).map_err(|source| IntegrityError::ArtifactUnreadable {
        path: artifact_path.display().to_string(),
        source,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buf)
            .map_err(|source| IntegrityError::ArtifactUnreadable {
                path: artifact_path.display().to_string(),
                source,
            })?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify `artifact_path` against its adjacent `<artifact>.manifest.json`.
pub fn verify_artifact(artifact_path: &Path) -> Result<VerifyOutcome, IntegrityError> {
    let actual = compute_hash(artifact_path)?;
    let manifest_path = dotnope_common::paths::manifest_path_for(artifact_path);

    if !manifest_path.exists() {
        tracing::warn!(path = %manifest_path.display(), "integrity manifest absent");
        return Ok(VerifyOutcome::Warning(WarningReason::ManifestAbsent));
    }

    let raw = fs::read_to_string(&manifest_path).map_err(|source| IntegrityError::ArtifactUnreadable {
        path: manifest_path.display().to_string(),
        source,
    })?;
    let manifest: Manifest =
        serde_json::from_str(&raw).map_err(|source| IntegrityError::ManifestMalformed {
            path: manifest_path.display().to_string(),
            source,
        })?;

    let actual_size = fs::metadata(artifact_path)
        .map_err(|source| IntegrityError::ArtifactUnreadable {
            path: artifact_path.display().to_string(),
            source,
        })?
        .len();

    if manifest.addon.size != actual_size {
        tracing::error!(
            expected = manifest.addon.size,
            actual = actual_size,
            "integrity manifest size mismatch"
        );
        return Ok(VerifyOutcome::Refused(RefusedReason::SizeMismatch {
            expected: manifest.addon.size,
            actual: actual_size,
        }));
    }

    if manifest.addon.hash.eq_ignore_ascii_case(&actual) {
        Ok(VerifyOutcome::Verified)
    } else {
        tracing::error!(
            expected = %manifest.addon.hash,
            actual = %actual,
            "integrity manifest hash mismatch"
        );
        Ok(VerifyOutcome::Refused(RefusedReason::Mismatch {
            expected: manifest.addon.hash,
            actual,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{AddonManifest, RustManifest};
    use std::io::Write;

    fn write_artifact(dir: &tempfile::TempDir, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("libdotnope_interposer.so");
        fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    fn write_manifest(artifact_path: &Path, hash: &str) {
        let manifest = Manifest {
            version: "1".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            addon: AddonManifest {
                path: artifact_path.display().to_string(),
                hash: hash.to_string(),
                algorithm: "sha256".to_string(),
                size: 3,
                mtime: "2026-01-01T00:00:00Z".to_string(),
            },
            rust: Some(RustManifest {
                version: "1.89.0".to_string(),
                target_triple: "x86_64-unknown-linux-gnu".to_string(),
            }),
        };
        let manifest_path = dotnope_common::paths::manifest_path_for(artifact_path);
        fs::write(manifest_path, serde_json::to_string(&manifest).unwrap()).unwrap();
    }

    #[test]
    fn matching_hash_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(&dir, b"abc");
        let hash = compute_hash(&artifact).unwrap();
        write_manifest(&artifact, &hash);

        assert_eq!(verify_artifact(&artifact).unwrap(), VerifyOutcome::Verified);
    }

    #[test]
    fn mismatched_hash_is_refused_not_errored() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(&dir, b"abc");
        write_manifest(&artifact, "0".repeat(64).as_str());

        let outcome = verify_artifact(&artifact).unwrap();
        assert!(matches!(outcome, VerifyOutcome::Refused(_)));
    }

    #[test]
    fn missing_manifest_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(&dir, b"abc");

        assert_eq!(
            verify_artifact(&artifact).unwrap(),
            VerifyOutcome::Warning(WarningReason::ManifestAbsent)
        );
    }

    #[test]
    fn unreadable_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.so");
        assert!(compute_hash(&missing).is_err());
    }
}

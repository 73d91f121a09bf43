//! The manifest document adjacent to a native artifact
//! (`<artifact>.manifest.json`), matching spec.md 4.6's shape with a `rust`
//! sub-object standing in for the spec's optional `node` sub-object.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonManifest {
    pub path: String,
    pub hash: String,
    pub algorithm: String,
    pub size: u64,
    pub mtime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RustManifest {
    pub version: String,
    pub target_triple: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub addon: AddonManifest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rust: Option<RustManifest>,
}

/// Build the manifest a release pipeline would write alongside a freshly
/// built interposer artifact, stamping the current toolchain and target
/// triple into the `rust` sub-object.
pub fn generate_manifest(artifact_path: &Path, hash: String) -> Result<Manifest, IntegrityError> {
    let metadata = std::fs::metadata(artifact_path).map_err(|source| IntegrityError::ArtifactUnreadable {
        path: artifact_path.display().to_string(),
        source,
    })?;

    let mtime = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|since_epoch| {
            chrono::DateTime::<Utc>::from_timestamp(since_epoch.as_secs() as i64, 0)
                .unwrap_or_else(|| Utc::now())
                .to_rfc3339()
        })
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    Ok(Manifest {
        version: "1".to_string(),
        generated_at: Utc::now().to_rfc3339(),
        addon: AddonManifest {
            path: artifact_path.display().to_string(),
            hash,
            algorithm: "sha256".to_string(),
            size: metadata.len(),
            mtime,
        },
        rust: Some(RustManifest {
            version: rustc_version(),
            // No target-triple constant ships in `std`; this workspace has
            // no build.rs to capture Cargo's real `TARGET` env var, so the
            // best available approximation is arch-os.
            target_triple: format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
        }),
    })
}

fn rustc_version() -> String {
    option_env!("CARGO_PKG_RUST_VERSION")
        .unwrap_or("unknown")
        .to_string()
}

//! Integrity Verifier (C6) for the dotnope environment-variable access
//! firewall: hashes the native interposer artifact and checks it against
//! an adjacent manifest before the launcher trusts `LD_PRELOAD`-ing it.

mod error;
mod manifest;
mod verify;

pub use error::IntegrityError;
pub use manifest::{generate_manifest, AddonManifest, Manifest, RustManifest};
pub use verify::{compute_hash, verify_artifact, RefusedReason, VerifyOutcome, WarningReason};

//! Backing implementation for `dotnope --status` (spec.md 6): prints
//! platform, whether the preload plane is active, the resolved interposer
//! path, and the current `LD_PRELOAD`/`DOTNOPE_POLICY` values.

use std::path::Path;

use anyhow::Result;

use dotnope_config::{load_effective_policy, to_native_policy_string};
use dotnope_integrity::{verify_artifact, VerifyOutcome};

pub fn print_status(config_override: Option<&Path>) -> Result<()> {
    let interposer = crate::locate_interposer();
    let preload_active = std::env::var_os("LD_PRELOAD")
        .map(|v| !v.is_empty())
        .unwrap_or(false);

    println!("platform: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
    println!("preload_active: {preload_active}");
    match &interposer {
        Some(path) => {
            println!("interposer: {}", path.display());
            match verify_artifact(path) {
                Ok(VerifyOutcome::Verified) => println!("integrity: verified"),
                Ok(VerifyOutcome::Warning(reason)) => println!("integrity: warning ({reason:?})"),
                Ok(VerifyOutcome::Refused(reason)) => println!("integrity: refused ({reason:?})"),
                Err(err) => println!("integrity: error ({err})"),
            }
        }
        None => println!("interposer: not found"),
    }
    println!(
        "LD_PRELOAD: {}",
        std::env::var("LD_PRELOAD").unwrap_or_default()
    );

    let model = match config_override {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            dotnope_config::parse_policy_yaml(path, &raw)?
        }
        None => {
            let cwd = std::env::current_dir()?;
            load_effective_policy(&cwd)?.0
        }
    };
    println!("DOTNOPE_POLICY: {}", to_native_policy_string(&model));
    println!("packages configured: {}", model.packages.len());

    Ok(())
}

//! `dotnope`: the launcher CLI for the environment-variable access firewall
//! (spec.md 6). A deliberately minimal wrapper: it resolves the native
//! interposer's shared library, sets `LD_PRELOAD`/`DOTNOPE_POLICY`/
//! `DOTNOPE_LOG` on a child process, and forwards the child's exit status
//! (or re-raises its terminating signal) to whoever invoked `dotnope`.
//!
//! The in-process Runtime Mediator (`dotnope_mediator::install`) is a
//! library surface the *host* runtime calls from its own startup code, not
//! something this launcher installs on the host's behalf — see spec.md 1,
//! "launcher/CLI wrappers that only spawn a child process" is explicitly
//! out of scope for the core, and this binary stays true to that boundary.

mod status;

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Parser;

use dotnope_config::{load_effective_policy, to_native_policy_string};
use dotnope_integrity::{verify_artifact, VerifyOutcome};

const INTERPOSER_FILE_NAMES: &[&str] = &[
    "libdotnope_interposer.so",
    "libdotnope_interposer.dylib",
    "dotnope_interposer.dll",
];

/// Interpreter-triggering script extensions, the same three the spec names
/// for the host runtime this system was designed against.
const INTERPRETER_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

#[derive(Parser, Debug)]
#[command(
    name = "dotnope",
    version,
    about = "Run a command with the environment-variable access firewall's native plane preloaded",
    disable_help_subcommand = true
)]
struct Cli {
    /// Script path (triggers interpreter invocation for .js/.mjs/.cjs) or,
    /// after `--`, an arbitrary command to run directly.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,

    /// Locate the native interposer and exit 0/1 without running anything.
    #[arg(long)]
    check: bool,

    /// Print platform, preload status, and resolved configuration, then exit.
    #[arg(long)]
    status: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Absolute path for the interposer's decision log (`DOTNOPE_LOG`).
    #[arg(long)]
    log: Option<PathBuf>,

    /// Path to a policy configuration file, overriding workspace/global resolution.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.check {
        return match locate_interposer() {
            Some(path) => {
                println!("{}", path.display());
                Ok(())
            }
            None => std::process::exit(1),
        };
    }

    if cli.status {
        return status::print_status(cli.config.as_deref());
    }

    if cli.command.is_empty() {
        bail!("no command given; pass a script path or `-- <command> [args...]`");
    }

    let interposer = locate_interposer().filter(|path| interposer_is_trusted(path));
    if interposer.is_none() {
        tracing::warn!("native interposer not found or not trusted; LD_PRELOAD plane will not be active");
    }

    let policy_csv = resolve_policy_csv(cli.config.as_deref())?;

    // `--` is an explicit separator, not part of the command itself, when
    // the caller used it to mark "everything after this is the command".
    let command: Vec<String> = match cli.command.split_first() {
        Some((first, rest)) if first == "--" => rest.to_vec(),
        _ => cli.command,
    };
    if command.is_empty() {
        bail!("no command given after `--`");
    }

    let (program, args) = resolve_program(&command);
    let mut child_command = Command::new(&program);
    child_command.args(&args);
    if let Some(ref path) = interposer {
        prepend_preload(&mut child_command, path);
    }
    child_command.env("DOTNOPE_POLICY", &policy_csv);
    if let Some(log_path) = &cli.log {
        child_command.env("DOTNOPE_LOG", log_path);
    }

    let status = child_command
        .status()
        .with_context(|| format!("failed to spawn '{program}'"))?;

    exit_matching_child(status)
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

/// `.js`/`.mjs`/`.cjs` positional arguments are interpreted as a script for
/// the host interpreter; anything else (including everything after `--`) is
/// run as-is. Matches spec.md 6's launcher surface.
fn resolve_program(command: &[String]) -> (String, Vec<String>) {
    let first = &command[0];
    let rest = &command[1..];

    if let Some(ext) = Path::new(first).extension().and_then(|e| e.to_str()) {
        if INTERPRETER_EXTENSIONS.contains(&ext) {
            let mut args = vec![first.clone()];
            args.extend(rest.iter().cloned());
            return ("node".to_string(), args);
        }
    }

    (first.clone(), rest.to_vec())
}

fn resolve_policy_csv(config_override: Option<&Path>) -> Result<String> {
    let model = match config_override {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            dotnope_config::parse_policy_yaml(path, &raw)?
        }
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            load_effective_policy(&cwd)?.0
        }
    };
    Ok(to_native_policy_string(&model))
}

/// Gate between `locate_interposer` and `LD_PRELOAD`ing its result: the
/// native caller-ID helper is never loaded into a child process unless C6
/// has checked it first (spec.md 3, "if native integrity verification (C6)
/// fails, the runtime never calls into the native caller-ID helper for that
/// process"). `Verified` and `Warning` (no adjacent manifest at all, e.g. a
/// local dev build) both proceed; only an explicit `Refused` or a hard `Err`
/// disables the native plane for this run.
fn interposer_is_trusted(path: &Path) -> bool {
    match verify_artifact(path) {
        Ok(VerifyOutcome::Verified) => true,
        Ok(VerifyOutcome::Warning(reason)) => {
            tracing::warn!(path = %path.display(), ?reason, "interposer integrity warning; preloading anyway");
            true
        }
        Ok(VerifyOutcome::Refused(reason)) => {
            tracing::error!(path = %path.display(), ?reason, "interposer failed integrity verification; native plane disabled for this run");
            false
        }
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "interposer integrity verification failed; native plane disabled for this run");
            false
        }
    }
}

/// Look for the interposer next to this executable first (a co-located
/// release layout), then under `$DOTNOPE_HOME/lib` (an installed layout).
pub(crate) fn locate_interposer() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.to_path_buf());
        }
    }
    if let Ok(home) = dotnope_common::paths::dotnope_home() {
        candidates.push(home.join("lib"));
    }

    for dir in candidates {
        for name in INTERPOSER_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Some(path);
            }
        }
    }
    None
}

#[cfg(unix)]
fn prepend_preload(command: &mut Command, interposer: &Path) {
    let existing = std::env::var_os("LD_PRELOAD");
    let mut value = interposer.as_os_str().to_os_string();
    if let Some(existing) = existing {
        if !existing.is_empty() {
            value.push(":");
            value.push(existing);
        }
    }
    command.env("LD_PRELOAD", value);
}

#[cfg(not(unix))]
fn prepend_preload(_command: &mut Command, _interposer: &Path) {
    // LD_PRELOAD is a Unix loader mechanism; the native plane is advisory
    // elsewhere (spec.md 1, non-goals).
}

/// Forward the child's exit code; if it was killed by a signal, re-raise
/// that same signal against this process rather than translating it into
/// an exit code (spec.md 6: "on child signal, re-raises the same signal").
#[cfg(unix)]
fn exit_matching_child(status: std::process::ExitStatus) -> Result<()> {
    use std::os::unix::process::ExitStatusExt;

    if let Some(signal) = status.signal() {
        unsafe {
            libc::signal(signal, libc::SIG_DFL);
            libc::raise(signal);
        }
        // raise() of a default-disposition terminating signal does not
        // return; this is reached only for signals that don't terminate
        // the process (e.g. a caught-and-ignored one upstream), in which
        // case falling through to the code path below is reasonable.
    }
    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(not(unix))]
fn exit_matching_child(status: std::process::ExitStatus) -> Result<()> {
    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_extension_triggers_interpreter() {
        let (program, args) = resolve_program(&["app.mjs".to_string(), "--flag".to_string()]);
        assert_eq!(program, "node");
        assert_eq!(args, vec!["app.mjs".to_string(), "--flag".to_string()]);
    }

    #[test]
    fn arbitrary_command_runs_directly() {
        let (program, args) = resolve_program(&["echo".to_string(), "hi".to_string()]);
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["hi".to_string()]);
    }

    #[test]
    fn unrecognized_extension_runs_directly() {
        let (program, args) = resolve_program(&["binary.bin".to_string()]);
        assert_eq!(program, "binary.bin");
        assert!(args.is_empty());
    }

    #[test]
    fn interposer_without_a_manifest_is_trusted_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("libdotnope_interposer.so");
        std::fs::write(&artifact, b"stub").unwrap();

        assert!(interposer_is_trusted(&artifact));
    }

    #[test]
    fn interposer_with_a_tampered_hash_is_not_trusted() {
        use dotnope_integrity::{AddonManifest, Manifest};

        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("libdotnope_interposer.so");
        std::fs::write(&artifact, b"stub").unwrap();

        let manifest = Manifest {
            version: "1".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            addon: AddonManifest {
                path: artifact.display().to_string(),
                hash: "0".repeat(64),
                algorithm: "sha256".to_string(),
                size: 4,
                mtime: "2026-01-01T00:00:00Z".to_string(),
            },
            rust: None,
        };
        let manifest_path = dotnope_common::paths::manifest_path_for(&artifact);
        std::fs::write(manifest_path, serde_json::to_string(&manifest).unwrap()).unwrap();

        assert!(!interposer_is_trusted(&artifact));
    }
}

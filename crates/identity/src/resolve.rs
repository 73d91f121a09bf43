//! Path classification and the frame-skip / caching logic behind
//! `identify()`. Grounded on the teacher's `resolver.rs` cache idiom
//! (`once_cell::sync::Lazy<RwLock<HashMap<...>>>`) and on Cargo's own
//! on-disk source layout, which is the closest native analog of Node's
//! `node_modules/<package>/...` convention the spec was written against.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

use dotnope_policy::CallerIdentity;

use crate::frame::Frame;

/// File suffixes belonging to this crate and its sibling mediator: frames
/// whose file ends with one of these are interception machinery, not the
/// caller, and must be skipped so the firewall doesn't attribute its own
/// code to `Main`.
const SELF_FILE_SUFFIXES: &[&str] = &[
    "dotnope-identity/src/capture.rs",
    "dotnope-identity/src/resolve.rs",
    "dotnope-identity/src/lib.rs",
    "dotnope-mediator/src/env.rs",
    "dotnope-mediator/src/lib.rs",
    "dotnope-interposer/src/lib.rs",
];

/// Rust standard library and runtime-internal path prefixes. A frame that
/// resolves into these is never a meaningful caller and is always skipped,
/// the same way the spec skips `node:internal/...` frames.
const RUNTIME_INTERNAL_PREFIXES: &[&str] = &["/rustc/", "/rustc\\"];

fn is_self_frame(frame: &Frame) -> bool {
    match &frame.file {
        Some(file) => SELF_FILE_SUFFIXES.iter().any(|suffix| file.ends_with(suffix)),
        None => false,
    }
}

fn is_runtime_internal(frame: &Frame) -> bool {
    match &frame.file {
        Some(file) => RUNTIME_INTERNAL_PREFIXES
            .iter()
            .any(|prefix| file.starts_with(prefix)),
        None => false,
    }
}

/// Path -> package name cache, append-only for the process lifetime. Frame
/// file paths are stable for a given build, so there is no eviction need.
static PACKAGE_NAME_CACHE: Lazy<RwLock<HashMap<String, Option<String>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Classify a resolved source file path into the crate it belongs to, using
/// Cargo's two on-disk vendoring conventions:
///
/// - `~/.cargo/registry/src/<index>/<crate>-<version>/...`
/// - `~/.cargo/git/checkouts/<repo>-<hash>/<rev>/<crate>/...`
///
/// A path under neither convention (the workspace's own `src/` tree, or a
/// path-dependency sibling crate) is not a third-party "package" under the
/// spec's model and resolves to `None`, meaning "attribute to Main".
pub fn classify_path(path: &str) -> Option<String> {
    if let Some(cached) = PACKAGE_NAME_CACHE.read().unwrap().get(path) {
        return cached.clone();
    }

    let classified = classify_path_uncached(path);

    PACKAGE_NAME_CACHE
        .write()
        .unwrap()
        .insert(path.to_string(), classified.clone());

    classified
}

fn classify_path_uncached(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");

    if let Some(after) = find_after(&normalized, "/registry/src/") {
        // after = "<index>/<crate>-<version>/..."
        let mut segments = after.splitn(2, '/');
        let _index = segments.next();
        let crate_dir = segments.next()?.split('/').next()?;
        return strip_version_suffix(crate_dir);
    }

    if let Some(prefix_end) = normalized.find("/git/checkouts/") {
        // after = "<repo>-<hash>/<rev>/<crate-or-workspace-root>/..."
        let after = &normalized[prefix_end + "/git/checkouts/".len()..];
        let mut segments = after.splitn(3, '/');
        let repo_hash = segments.next()?;
        let rev = segments.next()?;
        let third_segment = segments.next()?.split('/').next()?;

        // `checkouts/<repo>-<hash>/<rev>/...` holds either a single crate
        // (its `Cargo.toml` sits directly under `<rev>/`, and the third path
        // segment is just a subdirectory like `src`) or a workspace (its
        // `Cargo.toml` sits under `<rev>/<member>/`, and the third segment is
        // a real member crate name). Only trust the third segment as the
        // package name when `<rev>/` actually has a workspace manifest;
        // otherwise the checkout is a single crate and the package name is
        // the repo directory with its trailing git-hash suffix stripped.
        let rev_dir = format!("{}{}/{}", &normalized[..prefix_end + "/git/checkouts/".len()], repo_hash, rev);
        if is_workspace_manifest(&rev_dir) {
            return Some(third_segment.to_string());
        }
        return strip_hash_suffix(repo_hash);
    }

    None
}

/// Whether `<rev_dir>/Cargo.toml` exists and declares a `[workspace]` table.
/// A missing or unreadable manifest is treated as "not a workspace" rather
/// than an error: `classify_path` always resolves to its best-effort answer,
/// never fails the caller.
fn is_workspace_manifest(rev_dir: &str) -> bool {
    let manifest_path = std::path::Path::new(rev_dir).join("Cargo.toml");
    std::fs::read_to_string(manifest_path)
        .map(|contents| contents.contains("[workspace]"))
        .unwrap_or(false)
}

/// `checkouts/<repo>-<hash>` directory names suffix the repo name with a
/// short hex hash Cargo derives from the git URL, not a semver string, so
/// [`strip_version_suffix`]'s digit-prefix rule doesn't apply here; strip the
/// trailing hyphen segment only when it's entirely hex digits.
fn strip_hash_suffix(repo_dir: &str) -> Option<String> {
    match repo_dir.rsplit_once('-') {
        Some((name, suffix)) if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_hexdigit()) => {
            Some(name.to_string())
        }
        _ => Some(repo_dir.to_string()),
    }
}

fn find_after<'a>(haystack: &'a str, needle: &str) -> Option<&'a str> {
    haystack.find(needle).map(|idx| &haystack[idx + needle.len()..])
}

/// Cargo registry directory names are `<crate>-<semver>`; semver can itself
/// contain hyphens (pre-release identifiers), so strip from the right,
/// requiring the suffix to look like a version (starts with a digit).
fn strip_version_suffix(crate_dir: &str) -> Option<String> {
    let hyphen_positions: Vec<usize> = crate_dir
        .char_indices()
        .filter(|(_, c)| *c == '-')
        .map(|(i, _)| i)
        .collect();

    for &pos in hyphen_positions.iter().rev() {
        let candidate_version = &crate_dir[pos + 1..];
        if candidate_version
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
        {
            return Some(crate_dir[..pos].to_string());
        }
    }

    Some(crate_dir.to_string())
}

/// The result of resolving a captured stack to a caller identity.
pub struct Resolution {
    pub identity: CallerIdentity,
    pub is_eval: bool,
    /// Whether the backend backtrace had at least one frame it could not
    /// symbolicate (stripped binary, missing debug info) before reaching
    /// the frame this resolution was based on. Surfaced on
    /// `MediatorStatus` so a caller can tell a possibly-degraded
    /// identification from a fully-trusted one (SPEC_FULL.md 4.2).
    pub symbolication_incomplete: bool,
}

/// Walk the frames outward from the interception point, skipping the
/// firewall's own frames and runtime-internal frames, and classify the
/// first frame that remains (spec.md 4.2 steps 1-4).
pub fn resolve(frames: &[Frame], symbolication_incomplete: bool) -> Resolution {
    for frame in frames {
        if is_self_frame(frame) || is_runtime_internal(frame) {
            continue;
        }

        let is_eval = frame.looks_like_eval();

        let identity = match &frame.file {
            Some(file) => match classify_path(file) {
                Some(name) => CallerIdentity::Package(name),
                None => CallerIdentity::Main,
            },
            None => {
                if is_eval {
                    CallerIdentity::Unknown
                } else {
                    CallerIdentity::Main
                }
            }
        };

        return Resolution {
            identity,
            is_eval,
            symbolication_incomplete,
        };
    }

    Resolution {
        identity: CallerIdentity::Unknown,
        is_eval: false,
        symbolication_incomplete,
    }
}

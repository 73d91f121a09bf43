//! The Runtime Mediator (C4): the in-process facade over `std::env` that
//! every mediated access funnels through. Identification is delegated to
//! `dotnope_identity::identify`, authorization to `dotnope_policy::decide`/
//! `decide_enumerate`; this module owns only the install lifecycle, the
//! mutation lock, and the pass-through once torn down.

use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use arc_swap::ArcSwap;
use rand::RngCore;

use dotnope_config::ReloadEvent;
use dotnope_policy::{decide, decide_enumerate, Operation, PolicyModel};

use crate::control::ControlHandle;
use crate::error::{InstallError, MediatorError};

static INSTALLED: AtomicBool = AtomicBool::new(false);
static POLICY: OnceLock<ArcSwap<PolicyModel>> = OnceLock::new();
static ENFORCEMENT_ENABLED: AtomicBool = AtomicBool::new(true);
static NEXT_POLICY_ID: AtomicU64 = AtomicU64::new(0);

/// Whether caller identification has, at any point since the current
/// installation, resolved from a backtrace with at least one
/// unsymbolicated frame. Sticky for the life of the installation rather
/// than per-call, since a stripped-binary environment doesn't get better
/// between calls and the launcher's `--status` output should reflect that
/// the process as a whole may be degraded (SPEC_FULL.md 4.2).
static SYMBOLICATION_INCOMPLETE: AtomicBool = AtomicBool::new(false);

/// The token that authorizes tearing down the *currently active*
/// installation. Set by `install`, cleared by a successful `teardown`.
/// `ControlHandle::disable` validates against this, not against the token
/// baked into the handle instance, so a handle from a prior installation
/// cannot tear down a later, unrelated one (spec.md 4.7, spec.md 8).
static ACTIVE_TOKEN: Mutex<Option<[u8; 16]>> = Mutex::new(None);

/// Serializes every mutating call (`set`, `remove`) against `std::env`.
/// `std::env::set_var`/`remove_var` are `unsafe` as of recent Rust editions
/// because concurrent native environment mutation is not thread-safe at the
/// libc level; this lock is what makes the mediator's guarantee of being
/// "atomic with respect to the calling operation" (spec.md 5) true without
/// relying on the caller to hold anything.
static MUTATION_LOCK: Mutex<()> = Mutex::new(());

/// Reserved for future extension (e.g. whether `install` should also spin
/// up the native interposer's companion state); currently empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    pub start_interposer: bool,
}

/// Runtime visibility into the mediator's own state, independent of any
/// particular decision — used by the launcher's `--status` flag.
#[derive(Debug, Clone)]
pub struct MediatorStatus {
    pub installed: bool,
    pub enforcement_enabled: bool,
    pub policy_id: Option<u64>,
    pub symbolication_incomplete: bool,
}

/// Install the mediator for this process. Refused if a mediator is already
/// installed, process-wide — including from a different thread, since this
/// is a process-level invariant, not a thread-level one (spec.md 5).
///
/// A prior successful `install` followed by a token-authorized `teardown`
/// clears the installed flag, so a later `install` call succeeds again
/// (spec.md 8, "Install -> teardown -> install succeeds again"); the
/// underlying `ArcSwap` is reused rather than re-created, since `OnceLock`
/// itself cannot be reset.
pub fn install(policy: PolicyModel, _options: InstallOptions) -> Result<ControlHandle, InstallError> {
    INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .map_err(|_| InstallError::AlreadyInstalled)?;

    let snapshot = policy.clone();
    let policy_id = NEXT_POLICY_ID.fetch_add(1, Ordering::SeqCst) + 1;
    let arc_policy = std::sync::Arc::new(policy);
    match POLICY.get() {
        Some(existing) => existing.store(arc_policy),
        None => {
            let _ = POLICY.set(ArcSwap::new(arc_policy));
        }
    }
    ENFORCEMENT_ENABLED.store(true, Ordering::SeqCst);
    SYMBOLICATION_INCOMPLETE.store(false, Ordering::SeqCst);

    let mut token = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut token);
    *ACTIVE_TOKEN.lock().unwrap() = Some(token);

    Ok(ControlHandle::new(token, Instant::now(), policy_id, snapshot))
}

/// Tear down enforcement for the currently active installation, provided
/// `token` matches it. A token from a superseded installation (one already
/// torn down, or one replaced by a later `install`) is rejected even if it
/// was valid at some point in the process's lifetime (spec.md 4.7, 8).
pub(crate) fn teardown(token: &[u8]) -> Result<(), crate::error::ControlError> {
    let mut active = ACTIVE_TOKEN.lock().unwrap();
    match *active {
        Some(expected) if !token.is_empty() && token == expected => {
            *active = None;
            drop(active);
            ENFORCEMENT_ENABLED.store(false, Ordering::SeqCst);
            INSTALLED.store(false, Ordering::SeqCst);
            Ok(())
        }
        _ => Err(crate::error::ControlError::InvalidToken),
    }
}

/// Apply a newly parsed policy to the live installation, replacing the
/// previous one in place. Refused if no installation is active, the same
/// invariant `get`/`set`/etc. already enforce via `current_policy`.
pub fn reload(new_policy: PolicyModel) -> Result<(), MediatorError> {
    if !INSTALLED.load(Ordering::SeqCst) {
        return Err(MediatorError::NotInstalled);
    }
    let policy = POLICY.get().ok_or(MediatorError::NotInstalled)?;
    policy.store(std::sync::Arc::new(new_policy));
    NEXT_POLICY_ID.fetch_add(1, Ordering::SeqCst);
    tracing::info!("mediator policy reloaded");
    Ok(())
}

/// Apply a [`ReloadEvent`] from `dotnope_config::watch_policy_file` to the
/// live installation. A parse failure is logged and otherwise ignored: the
/// previous, still-valid policy remains in effect rather than being torn
/// down over a bad edit (spec.md 5's "fail closed" concerns authorization
/// decisions, not the watcher's own resilience to a malformed file).
pub fn apply_reload_event(event: ReloadEvent) -> Result<(), MediatorError> {
    match event {
        ReloadEvent::Reloaded(policy) => reload(policy),
        ReloadEvent::ParseFailed(err) => {
            tracing::warn!(error = %err, "policy file reload failed to parse; keeping previous policy");
            Ok(())
        }
    }
}

pub fn status() -> MediatorStatus {
    MediatorStatus {
        installed: INSTALLED.load(Ordering::SeqCst),
        enforcement_enabled: ENFORCEMENT_ENABLED.load(Ordering::SeqCst),
        policy_id: POLICY.get().map(|_| NEXT_POLICY_ID.load(Ordering::SeqCst)),
        symbolication_incomplete: SYMBOLICATION_INCOMPLETE.load(Ordering::SeqCst),
    }
}

fn current_policy() -> Result<arc_swap::Guard<std::sync::Arc<PolicyModel>>, MediatorError> {
    POLICY.get().map(ArcSwap::load).ok_or(MediatorError::NotInstalled)
}

/// Resolve and authorize one access. Returns `Ok(None)` when enforcement
/// has been torn down (pass-through); `Ok(Some(policy))` when the access is
/// authorized and the caller should proceed against `std::env`.
fn authorize(op: Operation, var: &str) -> Result<Option<arc_swap::Guard<std::sync::Arc<PolicyModel>>>, MediatorError> {
    let policy = current_policy()?;
    if !ENFORCEMENT_ENABLED.load(Ordering::SeqCst) {
        return Ok(None);
    }
    let resolution = dotnope_identity::identify();
    if resolution.symbolication_incomplete {
        SYMBOLICATION_INCOMPLETE.store(true, Ordering::SeqCst);
    }
    match decide(&resolution.identity, op, var, resolution.is_eval, &policy) {
        Ok(()) => {
            tracing::debug!(operation = %op, variable = var, decision = "allow", "mediated environment access allowed");
            Ok(Some(policy))
        }
        Err(err) => {
            tracing::warn!(operation = %op, variable = var, decision = "deny", reason = err.code(), "mediated environment access denied");
            Err(err.into())
        }
    }
}

pub fn get(name: &str) -> Result<Option<String>, MediatorError> {
    authorize(Operation::Read, name)?;
    Ok(std::env::var(name).ok())
}

pub fn contains(name: &str) -> Result<bool, MediatorError> {
    authorize(Operation::Read, name)?;
    Ok(std::env::var_os(name).is_some())
}

pub fn descriptor(name: &str) -> Result<Option<OsString>, MediatorError> {
    authorize(Operation::Read, name)?;
    Ok(std::env::var_os(name))
}

pub fn set(name: &str, value: &str) -> Result<(), MediatorError> {
    authorize(Operation::Write, name)?;
    tracing::trace!(variable = name, value = %dotnope_common::redact_value(value), "writing environment variable");
    let _guard = MUTATION_LOCK.lock().unwrap();
    unsafe {
        std::env::set_var(name, value);
    }
    Ok(())
}

pub fn remove(name: &str) -> Result<(), MediatorError> {
    authorize(Operation::Delete, name)?;
    let _guard = MUTATION_LOCK.lock().unwrap();
    unsafe {
        std::env::remove_var(name);
    }
    Ok(())
}

pub fn var_names() -> Result<Vec<String>, MediatorError> {
    let policy = current_policy()?;
    let all: Vec<String> = std::env::vars().map(|(key, _)| key).collect();
    if !ENFORCEMENT_ENABLED.load(Ordering::SeqCst) {
        return Ok(all);
    }
    let resolution = dotnope_identity::identify();
    if resolution.symbolication_incomplete {
        SYMBOLICATION_INCOMPLETE.store(true, Ordering::SeqCst);
    }
    Ok(decide_enumerate(
        &resolution.identity,
        resolution.is_eval,
        &policy,
        &all,
    )?)
}

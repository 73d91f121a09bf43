//! Native Interposer (C5): an `LD_PRELOAD`-loaded shared library that
//! intercepts `getenv`/`secure_getenv` so C-linked code cannot sidestep
//! `dotnope-mediator` to read a variable the runtime plane would have
//! hidden. Deliberately coarse — no per-package identity at this layer,
//! only the process-wide allow-set serialized into `DOTNOPE_POLICY` by the
//! launcher (spec.md 4.5).
//!
//! `LD_PRELOAD` and `dlsym(RTLD_NEXT, ...)` are POSIX loader mechanisms;
//! spec.md 1 already documents the native plane as advisory-only on
//! platforms without a preload mechanism, so this whole crate is unix-only,
//! the same way the teacher gates its Windows-only `forwarder` binary with
//! `#![cfg(target_os = "windows")]`.
#![cfg(unix)]

mod allowset;
mod hook;
mod log;

pub use allowset::AllowSet;

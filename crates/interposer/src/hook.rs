//! Real-symbol resolution and the exported `getenv`/`secure_getenv`
//! replacements (spec.md 4.5).
//!
//! The allow-set and the real `getenv` pointer are each resolved once,
//! behind a `OnceLock`, mirroring the append-only caching idiom the rest of
//! this workspace uses (`dotnope_identity`'s path cache) — here it is a
//! `static` rather than a `RwLock<HashMap<...>>` because there is exactly
//! one value to cache, not a growing set of them.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::sync::OnceLock;

use crate::allowset::{self, AllowSet};

type GetenvFn = unsafe extern "C" fn(*const c_char) -> *mut c_char;

static REAL_GETENV: OnceLock<GetenvFn> = OnceLock::new();
static ALLOW_SET: OnceLock<AllowSet> = OnceLock::new();

fn resolve_real(symbol: &str) -> Option<GetenvFn> {
    let name = CString::new(symbol).ok()?;
    unsafe {
        let ptr = libc::dlsym(libc::RTLD_NEXT, name.as_ptr());
        if ptr.is_null() {
            None
        } else {
            Some(std::mem::transmute::<*mut c_void, GetenvFn>(ptr))
        }
    }
}

fn real_getenv() -> GetenvFn {
    *REAL_GETENV.get_or_init(|| {
        resolve_real("getenv").expect("dlsym(RTLD_NEXT, \"getenv\") must resolve under LD_PRELOAD")
    })
}

/// Read an environment variable through the real `getenv`, bypassing this
/// module's own interception. Used for the interposer's own configuration
/// (`DOTNOPE_POLICY`, `DOTNOPE_LOG`) so reading them never recurses through
/// the hook it is about to install.
pub fn read_raw(name: &str) -> Option<String> {
    let cname = CString::new(name).ok()?;
    unsafe {
        let ptr = (real_getenv())(cname.as_ptr());
        if ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
        }
    }
}

fn allow_set() -> &'static AllowSet {
    ALLOW_SET.get_or_init(|| allowset::parse(read_raw("DOTNOPE_POLICY").as_deref()))
}

fn intercepted_getenv(name: *const c_char) -> *mut c_char {
    if name.is_null() {
        return std::ptr::null_mut();
    }

    let requested = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
    let allowed = allow_set().allows(&requested);
    crate::log::record(&requested, allowed);

    if !allowed {
        return std::ptr::null_mut();
    }

    unsafe { (real_getenv())(name) }
}

// These exports are the whole point of the cdylib artifact, but a global
// symbol named `getenv` baked into a *test* binary would shadow libc's own
// and send the test harness's own environment reads through this hook —
// `cfg(not(test))` keeps them out of `cargo test`'s link step while still
// unit-testing every function they call.

/// # Safety
/// `name` must be a valid, NUL-terminated C string pointer for the duration
/// of the call, matching libc's `getenv` contract exactly.
#[cfg(not(test))]
#[no_mangle]
pub unsafe extern "C" fn getenv(name: *const c_char) -> *mut c_char {
    intercepted_getenv(name)
}

/// # Safety
/// Same contract as [`getenv`]. Only exported on glibc targets, matching
/// the real symbol's availability.
#[cfg(all(not(test), target_os = "linux"))]
#[no_mangle]
pub unsafe extern "C" fn secure_getenv(name: *const c_char) -> *mut c_char {
    intercepted_getenv(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_raw_of_a_set_variable_round_trips() {
        unsafe {
            std::env::set_var("DOTNOPE_INTERPOSER_TEST_VAR", "hello");
        }
        assert_eq!(
            read_raw("DOTNOPE_INTERPOSER_TEST_VAR"),
            Some("hello".to_string())
        );
        unsafe {
            std::env::remove_var("DOTNOPE_INTERPOSER_TEST_VAR");
        }
    }

    #[test]
    fn read_raw_of_an_unset_variable_is_none() {
        assert_eq!(read_raw("DOTNOPE_INTERPOSER_DEFINITELY_UNSET"), None);
    }
}

//! Caller identification (C2) for the dotnope environment-variable access
//! firewall.
//!
//! Given the interception point inside `dotnope-mediator`, this crate walks
//! a real native backtrace and resolves it to a [`dotnope_policy::CallerIdentity`],
//! the same three-way `Main | Package(name) | Unknown` split the decision
//! engine consumes. The resolution algorithm itself is backend-agnostic
//! (see [`resolve::resolve`]) and is unit-tested directly against synthetic
//! [`Frame`] lists; [`capture::capture`] is the only piece that talks to the
//! real unwinder and is exercised indirectly through [`identify`].

mod capture;
mod frame;
mod resolve;

pub use frame::Frame;
pub use resolve::{classify_path, Resolution};

/// How many innermost frames to discard before classification begins: the
/// call to [`capture::capture`] itself plus `identify`'s own frame.
const SKIP_FRAMES: usize = 2;

/// Identify the caller responsible for the environment access currently
/// being mediated. Always returns a usable identity; the worst case is
/// [`CallerIdentity::Unknown`], which the decision engine treats as "deny
/// unless unrestricted" per spec.md 4.3.
pub fn identify() -> Resolution {
    let outcome = capture::capture(SKIP_FRAMES);
    resolve::resolve(&outcome.frames, outcome.symbolication_incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_from_this_crate_does_not_panic() {
        let resolution = identify();
        let _ = resolution.identity;
    }
}

//! The decision engine (C3): a pure, side-effect-free function from
//! `(identity, operation, variable, policy)` to an allow/deny verdict.
//!
//! Enumeration is handled by a sibling function, `decide_enumerate`, because
//! its "denial" is expressed as key omission rather than a raised error
//! (spec.md 4.3, rule 5's enumerate branch).

use crate::error::DecisionError;
use crate::model::{CallerIdentity, GlobalOptions, Operation, PackagePolicy, PolicyModel};

/// Rules 1-4 of spec.md 4.3, shared by `decide` and `decide_enumerate`.
/// Returns `Some(verdict)` when one of the identity-agnostic rules already
/// resolves the access; `None` when the per-package rule (5) must run.
fn gate(
    id: &CallerIdentity,
    op: Operation,
    is_eval: bool,
    options: &GlobalOptions,
) -> Option<Result<(), DecisionError>> {
    if matches!(id, CallerIdentity::Main) && options.treat_main_as_unrestricted {
        return Some(Ok(()));
    }

    let protected = match op {
        Operation::Write => options.protect_writes,
        Operation::Delete => options.protect_deletes,
        Operation::Enumerate => options.protect_enumeration,
        Operation::Read => true,
    };
    if !protected {
        return Some(Ok(()));
    }

    if matches!(id, CallerIdentity::Unknown) {
        return Some(if options.fail_closed {
            Err(DecisionError::UnknownCaller)
        } else {
            Ok(())
        });
    }

    if is_eval && !options.allow_eval {
        return Some(Err(DecisionError::EvalContext));
    }

    None
}

/// Decide a read, write, or delete access. Enumeration has its own entry
/// point below since a denial there is silent.
///
/// `main` falling through an explicit `treat_main_as_unrestricted = false`
/// has no dedicated rule in the spec (rule 5 only names `package(X)`); this
/// implementation resolves that gap by treating `main` exactly like a
/// package with no configured entry (an empty policy — see DESIGN.md).
pub fn decide(
    id: &CallerIdentity,
    op: Operation,
    var: &str,
    is_eval: bool,
    model: &PolicyModel,
) -> Result<(), DecisionError> {
    debug_assert!(!matches!(op, Operation::Enumerate), "use decide_enumerate");

    if let Some(verdict) = gate(id, op, is_eval, &model.options) {
        return verdict;
    }

    let (owner, policy) = match id {
        CallerIdentity::Package(name) => (name.as_str(), model.policy_for(name)),
        CallerIdentity::Main => ("main", PackagePolicy::default()),
        CallerIdentity::Unknown => unreachable!("gate always resolves Unknown"),
    };

    let allowed = match op {
        Operation::Read => policy.may_read(var),
        Operation::Write => policy.may_write(var),
        Operation::Delete => policy.may_delete(var),
        Operation::Enumerate => unreachable!(),
    };

    if allowed {
        Ok(())
    } else {
        Err(DecisionError::Unauthorized {
            package: owner.to_string(),
            variable: var.to_string(),
            operation: op,
        })
    }
}

/// Decide an enumeration access. A `package(X)` caller is always allowed,
/// with the visible key set filtered to what policy grants; an `unknown`
/// caller can still be denied outright under `fail_closed`, and an
/// eval-context caller can still be denied under `allow_eval = false` —
/// those two rules run identically to `decide`, only the package-identity
/// branch differs (filtering instead of pass/fail).
pub fn decide_enumerate(
    id: &CallerIdentity,
    is_eval: bool,
    model: &PolicyModel,
    all_keys: &[String],
) -> Result<Vec<String>, DecisionError> {
    if let Some(verdict) = gate(id, Operation::Enumerate, is_eval, &model.options) {
        return verdict.map(|_| all_keys.to_vec());
    }

    let policy = match id {
        CallerIdentity::Package(name) => model.policy_for(name),
        CallerIdentity::Main => PackagePolicy::default(),
        CallerIdentity::Unknown => unreachable!("gate always resolves Unknown"),
    };

    Ok(policy.visible_keys(all_keys.iter()))
}

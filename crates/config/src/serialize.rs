//! Serialization of a `PolicyModel` into the native plane's `DOTNOPE_POLICY`
//! string (spec.md 8.6): every variable any package may read, written as a
//! sorted CSV, or `*` if any package's any set grants the wildcard.

use std::collections::BTreeSet;

use dotnope_policy::{PolicyModel, WILDCARD};

pub fn to_native_policy_string(model: &PolicyModel) -> String {
    let mut names = BTreeSet::new();

    for policy in model.packages.values() {
        for set in [&policy.allowed, &policy.can_write, &policy.can_delete] {
            if set.contains(WILDCARD) {
                return WILDCARD.to_string();
            }
            names.extend(set.iter().cloned());
        }
    }

    names.into_iter().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotnope_policy::{GlobalOptions, PackagePolicy};
    use std::collections::{HashMap, HashSet};

    #[test]
    fn combines_and_sorts_across_packages() {
        // spec.md 8.6
        let mut packages = HashMap::new();
        packages.insert(
            "a".to_string(),
            PackagePolicy {
                allowed: HashSet::from(["Y".to_string(), "X".to_string()]),
                ..Default::default()
            },
        );
        packages.insert(
            "b".to_string(),
            PackagePolicy {
                can_write: HashSet::from(["Z".to_string()]),
                ..Default::default()
            },
        );
        let model = PolicyModel::new(packages, GlobalOptions::default());
        assert_eq!(to_native_policy_string(&model), "X,Y,Z");
    }

    #[test]
    fn any_wildcard_collapses_to_wildcard() {
        let mut packages = HashMap::new();
        packages.insert(
            "a".to_string(),
            PackagePolicy {
                allowed: HashSet::from(["X".to_string()]),
                ..Default::default()
            },
        );
        packages.insert(
            "b".to_string(),
            PackagePolicy {
                can_delete: HashSet::from(["*".to_string()]),
                ..Default::default()
            },
        );
        let model = PolicyModel::new(packages, GlobalOptions::default());
        assert_eq!(to_native_policy_string(&model), "*");
    }

    #[test]
    fn empty_model_is_empty_string() {
        let model = PolicyModel::default();
        assert_eq!(to_native_policy_string(&model), "");
    }
}

//! The policy model (C1): a pure, immutable-once-built value type describing
//! which environment variables each third-party package may read, write, or
//! delete, plus the global options that shape how the decision engine reacts
//! to ambiguous or disabled enforcement states.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The reserved sentinel meaning "any variable".
pub const WILDCARD: &str = "*";

/// One of the four mediated operation classes. `membership` and
/// `descriptor-query` call sites map onto `Read` rather than getting their
/// own variant (mirrors the spec's "map to read").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Delete,
    Enumerate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Enumerate => "enumerate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attribution of an access to `main`, a named package, or `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallerIdentity {
    Main,
    Package(String),
    Unknown,
}

impl CallerIdentity {
    pub fn package_name(&self) -> Option<&str> {
        match self {
            Self::Package(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Per-package rule set. Each set may contain the `*` wildcard. `can_write`
/// and `can_delete` also grant read; `allowed` grants only read. The sets
/// are permissive unions, never subtracted from one another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePolicy {
    #[serde(default)]
    pub allowed: HashSet<String>,
    #[serde(default, alias = "canWrite")]
    pub can_write: HashSet<String>,
    #[serde(default, alias = "canDelete")]
    pub can_delete: HashSet<String>,
}

fn set_grants(set: &HashSet<String>, var: &str) -> bool {
    set.contains(WILDCARD) || set.contains(var)
}

impl PackagePolicy {
    pub fn may_read(&self, var: &str) -> bool {
        set_grants(&self.allowed, var) || self.may_write(var) || self.may_delete(var)
    }

    pub fn may_write(&self, var: &str) -> bool {
        set_grants(&self.can_write, var)
    }

    pub fn may_delete(&self, var: &str) -> bool {
        set_grants(&self.can_delete, var)
    }

    /// Any of the three sets containing the wildcard grants visibility into
    /// the full key set, matching the spec's "`*` ... short-circuits
    /// membership to true and `visibleKeys` to `allKeys`".
    fn has_wildcard(&self) -> bool {
        self.allowed.contains(WILDCARD)
            || self.can_write.contains(WILDCARD)
            || self.can_delete.contains(WILDCARD)
    }

    /// The subset of `all_keys` this package may see when enumerating.
    pub fn visible_keys<'a, I>(&self, all_keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        if self.has_wildcard() {
            return all_keys.into_iter().cloned().collect();
        }
        all_keys
            .into_iter()
            .filter(|key| self.may_read(key))
            .cloned()
            .collect()
    }
}

/// Global options, the `__options__` entry of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalOptions {
    #[serde(alias = "failClosed")]
    pub fail_closed: bool,
    #[serde(alias = "protectWrites")]
    pub protect_writes: bool,
    #[serde(alias = "protectDeletes")]
    pub protect_deletes: bool,
    #[serde(alias = "protectEnumeration")]
    pub protect_enumeration: bool,
    #[serde(alias = "allowEval")]
    pub allow_eval: bool,
    #[serde(alias = "treatMainAsUnrestricted")]
    pub treat_main_as_unrestricted: bool,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            fail_closed: true,
            protect_writes: true,
            protect_deletes: true,
            protect_enumeration: true,
            allow_eval: false,
            treat_main_as_unrestricted: true,
        }
    }
}

/// `{packages: map<PackageName, PackagePolicy>, options: GlobalOptions}`.
/// Immutable after construction; a reconfiguration replaces the whole value,
/// it never mutates one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyModel {
    pub packages: HashMap<String, PackagePolicy>,
    pub options: GlobalOptions,
}

impl PolicyModel {
    pub fn new(packages: HashMap<String, PackagePolicy>, options: GlobalOptions) -> Self {
        Self { packages, options }
    }

    /// A missing package entry yields an empty policy.
    pub fn policy_for(&self, name: &str) -> PackagePolicy {
        self.packages.get(name).cloned().unwrap_or_default()
    }

    pub fn may_read(&self, name: &str, var: &str) -> bool {
        self.policy_for(name).may_read(var)
    }

    pub fn may_write(&self, name: &str, var: &str) -> bool {
        self.policy_for(name).may_write(var)
    }

    pub fn may_delete(&self, name: &str, var: &str) -> bool {
        self.policy_for(name).may_delete(var)
    }

    pub fn visible_keys<'a, I>(&self, name: &str, all_keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.policy_for(name).visible_keys(all_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_package_is_empty_policy() {
        let model = PolicyModel::default();
        assert!(!model.may_read("sketchy", "AWS_SECRET"));
        assert!(!model.may_write("sketchy", "AWS_SECRET"));
        assert!(!model.may_delete("sketchy", "AWS_SECRET"));
    }

    #[test]
    fn write_and_delete_imply_read() {
        let policy = PackagePolicy {
            allowed: HashSet::new(),
            can_write: HashSet::from(["NODE_ENV".to_string()]),
            can_delete: HashSet::from(["TMP".to_string()]),
        };
        assert!(policy.may_read("NODE_ENV"));
        assert!(policy.may_read("TMP"));
        assert!(!policy.may_read("OTHER"));
    }

    #[test]
    fn wildcard_grants_everything() {
        let policy = PackagePolicy {
            allowed: HashSet::new(),
            can_write: HashSet::from([WILDCARD.to_string()]),
            can_delete: HashSet::new(),
        };
        assert!(policy.may_write("ANYTHING"));
        assert!(policy.may_read("ANYTHING"));

        let keys = vec!["A".to_string(), "B".to_string()];
        assert_eq!(policy.visible_keys(&keys), keys);
    }

    #[test]
    fn enumeration_filters_to_allowed_keys() {
        let policy = PackagePolicy {
            allowed: HashSet::from(["A".to_string()]),
            can_write: HashSet::new(),
            can_delete: HashSet::new(),
        };
        let keys = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(policy.visible_keys(&keys), vec!["A".to_string()]);
    }

    #[test]
    fn deserializes_bare_array_shape_is_rejected_needs_normalization() {
        // PackagePolicy itself only understands the record shape; the bare
        // array shape from the configuration document is normalized by
        // dotnope-config before it ever reaches PolicyModel.
        let err = serde_json::from_str::<PackagePolicy>(r#"["A","B"]"#);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let policy: PackagePolicy =
            serde_json::from_str(r#"{"allowed":["A"],"canWrite":["B"],"canDelete":["C"]}"#)
                .unwrap();
        assert!(policy.may_read("A"));
        assert!(policy.may_write("B"));
        assert!(policy.may_delete("C"));
    }

    #[test]
    fn default_options_match_spec() {
        let options = GlobalOptions::default();
        assert!(options.fail_closed);
        assert!(options.protect_writes);
        assert!(options.protect_deletes);
        assert!(options.protect_enumeration);
        assert!(!options.allow_eval);
        assert!(options.treat_main_as_unrestricted);
    }
}

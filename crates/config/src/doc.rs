//! The on-disk configuration shape (spec.md 6): a record under
//! `environment_whitelist` with a reserved `__options__` entry and, for
//! every other key, either a bare array of variable names or the full
//! `{allowed, canWrite, canDelete}` record.

use std::collections::HashMap;

use serde::Deserialize;

use dotnope_policy::{GlobalOptions, PackagePolicy, PolicyModel};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PackageEntryDoc {
    Bare(Vec<String>),
    Record(PackagePolicy),
}

impl From<PackageEntryDoc> for PackagePolicy {
    fn from(doc: PackageEntryDoc) -> Self {
        match doc {
            PackageEntryDoc::Bare(names) => PackagePolicy {
                allowed: names.into_iter().collect(),
                ..Default::default()
            },
            PackageEntryDoc::Record(policy) => policy,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentWhitelistDoc {
    #[serde(rename = "__options__", default)]
    options: GlobalOptions,
    #[serde(flatten)]
    packages: HashMap<String, PackageEntryDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    #[serde(alias = "environmentWhitelist")]
    environment_whitelist: EnvironmentWhitelistDoc,
}

impl ConfigDocument {
    pub fn into_policy_model(self) -> PolicyModel {
        let doc = self.environment_whitelist;
        let packages = doc
            .packages
            .into_iter()
            .map(|(name, entry)| (name, entry.into()))
            .collect();
        PolicyModel::new(packages, doc.options)
    }
}

//! Parsing of the serialized native-plane policy carried in `DOTNOPE_POLICY`
//! (spec.md 6): `*` (allow-all), the empty string (allow-none), or a
//! comma-separated list of variable names.

use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowSet {
    All,
    None,
    Names(BTreeSet<String>),
}

impl AllowSet {
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Names(names) => names.contains(name),
        }
    }
}

pub fn parse(raw: Option<&str>) -> AllowSet {
    match raw {
        None => AllowSet::None,
        Some("") => AllowSet::None,
        Some("*") => AllowSet::All,
        Some(csv) => AllowSet::Names(
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    }
}

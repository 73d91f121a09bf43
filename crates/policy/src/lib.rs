//! Policy model and decision engine for the dotnope environment-variable
//! access firewall.
//!
//! This crate is the "true core" the specification calls out: a pure value
//! type (`PolicyModel`) and a pure decision function (`decide`/
//! `decide_enumerate`). It has no knowledge of how callers are identified or
//! how the environment is actually mediated — those are the concerns of
//! `dotnope-identity` and `dotnope-mediator` respectively.

mod decision;
mod error;
mod model;

pub use decision::{decide, decide_enumerate};
pub use error::DecisionError;
pub use model::{
    CallerIdentity, GlobalOptions, Operation, PackagePolicy, PolicyModel, WILDCARD,
};

//! In-memory collaborators for the quarry pipeline, for local development and tests.
#![cfg_attr(test, allow(unused_crate_dependencies))]

mod broadcast;
mod cache;
mod hashing;
mod ids;
mod local;
mod policy;
mod rules;
mod store;

pub use broadcast::{InMemoryBroadcaster, Published};
pub use cache::InMemoryFieldCache;
pub use hashing::BcryptHasher;
pub use ids::Base64IdCodec;
pub use local::LocalRuntime;
pub use policy::{Policy, PolicyRegistry};
pub use rules::LocalRuleEvaluator;
pub use store::{InMemoryDataStore, Relation, StoreCalls};

#![deny(clippy::future_not_send)]
#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod auth;
pub mod broadcast;
pub mod cache;
pub mod entity;
pub mod hashing;
pub mod ids;
pub mod plan;
pub mod rules;
pub mod store;

use std::{future::Future, time::Duration};

pub use entity::{Arguments, Entity, key_to_string};

/// Every collaborator the pipeline reaches out to.
pub trait Runtime: Send + Sync + 'static {
    type DataStore: store::DataStore;
    type Authorizer: auth::Authorizer;
    type Hasher: hashing::PasswordHasher;
    type IdCodec: ids::IdCodec;
    type RuleEvaluator: rules::RuleEvaluator;
    type FieldCache: cache::FieldCache;
    type Broadcaster: broadcast::Broadcaster;

    fn data_store(&self) -> &Self::DataStore;
    fn authorizer(&self) -> &Self::Authorizer;
    fn hasher(&self) -> &Self::Hasher;
    fn id_codec(&self) -> &Self::IdCodec;
    fn rule_evaluator(&self) -> &Self::RuleEvaluator;
    fn field_cache(&self) -> &Self::FieldCache;
    fn broadcaster(&self) -> &Self::Broadcaster;
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

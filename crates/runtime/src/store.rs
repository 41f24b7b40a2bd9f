use std::future::Future;

use serde_json::Value;

use crate::{Arguments, Entity, plan::QueryPlan};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
    #[error("Unknown relation '{relation}' on model '{model}'")]
    UnknownRelation { model: String, relation: String },
    #[error("Unknown scope '{scope}' on model '{model}'")]
    UnknownScope { model: String, scope: String },
    #[error("No {model} with key {key}")]
    NotFound { model: String, key: String },
    #[error("Data store error: {0}")]
    Other(String),
}

/// Data store primitives the resolution strategies are built on.
pub trait DataStore: Send + Sync + 'static {
    /// Entities matching the plan, sorted and windowed as it says.
    fn query(&self, plan: &QueryPlan) -> impl Future<Output = Result<Vec<Entity>, StoreError>> + Send;

    /// Number of entities matching the plan, ignoring its window.
    fn count(&self, plan: &QueryPlan) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn find_by_key(&self, model: &str, key: &Value) -> impl Future<Output = Result<Option<Entity>, StoreError>> + Send;

    fn create(&self, model: &str, attributes: Arguments) -> impl Future<Output = Result<Entity, StoreError>> + Send;

    /// Merges `attributes` into the existing entity. `StoreError::NotFound` when it doesn't exist.
    fn update(
        &self,
        model: &str,
        key: &Value,
        attributes: Arguments,
    ) -> impl Future<Output = Result<Entity, StoreError>> + Send;

    /// Returns the deleted entity. `StoreError::NotFound` when it doesn't exist.
    fn delete(&self, model: &str, key: &Value) -> impl Future<Output = Result<Entity, StoreError>> + Send;

    /// Fetches `relation` for all `parents` in one go. The result holds one group per parent, in
    /// the order of `parents`.
    fn fetch_relation(
        &self,
        model: &str,
        relation: &str,
        parents: &[&Entity],
    ) -> impl Future<Output = Result<Vec<Vec<Entity>>, StoreError>> + Send;
}

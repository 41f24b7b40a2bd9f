use pretty_assertions::assert_eq;
use quarry_engine::RequestContext;
use runtime::auth::Principal;
use runtime_local::InMemoryFieldCache;
use schema::{CacheDirective, Directive, FieldDefinition, InputValueDefinition, QueryConstraint};
use serde_json::json;

use crate::{TestEngine, posts};

fn cached_posts(private: bool) -> FieldDefinition {
    FieldDefinition::new("Query", "posts")
        .directive(Directive::all("Post"))
        .directive(Directive::Cache(CacheDirective { max_age: None, private }))
        .argument(InputValueDefinition::new("user_id").directive(Directive::QueryConstraint(QueryConstraint::Eq { key: None })))
}

#[tokio::test]
async fn second_resolution_is_served_from_the_cache() {
    let engine = TestEngine::builder()
        .with_store(posts(3))
        .with_field(cached_posts(false))
        .build();

    let first = engine.resolve("Query.posts", json!({ "user_id": 1 })).await.unwrap();
    let second = engine.resolve("Query.posts", json!({ "user_id": 1 })).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.runtime().data_store.calls().query, 1);

    // Other arguments, other entry.
    engine.resolve("Query.posts", json!({ "user_id": 2 })).await.unwrap();
    assert_eq!(engine.runtime().data_store.calls().query, 2);
}

#[tokio::test]
async fn private_entries_are_scoped_to_the_principal() {
    let engine = TestEngine::builder()
        .with_store(posts(3))
        .with_field(cached_posts(true))
        .build();

    let alice = RequestContext::new().with_principal(Principal::new("1", "api"));
    let bob = RequestContext::new().with_principal(Principal::new("2", "api"));

    engine.resolve_with("Query.posts", json!({}), &alice).await.unwrap();
    engine.resolve_with("Query.posts", json!({}), &alice).await.unwrap();
    assert_eq!(engine.runtime().data_store.calls().query, 1);

    engine.resolve_with("Query.posts", json!({}), &bob).await.unwrap();
    assert_eq!(engine.runtime().data_store.calls().query, 2);

    // Anonymous requests never touch private entries.
    engine.resolve("Query.posts", json!({})).await.unwrap();
    engine.resolve("Query.posts", json!({})).await.unwrap();
    assert_eq!(engine.runtime().data_store.calls().query, 4);
}

#[tokio::test]
async fn disabled_cache_always_resolves() {
    let engine = TestEngine::builder()
        .with_config(|config| config.cache.enabled = false)
        .with_store(posts(3))
        .with_field(cached_posts(false))
        .build();

    engine.resolve("Query.posts", json!({})).await.unwrap();
    engine.resolve("Query.posts", json!({})).await.unwrap();

    assert_eq!(engine.runtime().data_store.calls().query, 2);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let engine = TestEngine::builder()
        .with_store(posts(3))
        .with_field(
            FieldDefinition::new("Query", "post")
                .directive(Directive::find("Post"))
                .directive(Directive::Cache(CacheDirective::default()))
                .argument(InputValueDefinition::new("id").directive(Directive::QueryConstraint(QueryConstraint::Eq { key: None }))),
        )
        .build();

    assert!(engine.resolve("Query.post", json!({ "id": 42 })).await.is_err());
    assert!(engine.resolve("Query.post", json!({ "id": 42 })).await.is_err());

    assert_eq!(engine.runtime().data_store.calls().query, 2);
}

#[tokio::test]
async fn unreachable_caches_count_as_misses() {
    let engine = TestEngine::builder()
        .with_store(posts(3))
        .with_field_cache(InMemoryFieldCache::failing("connection refused"))
        .with_field(cached_posts(false))
        .build();

    for _ in 0..2 {
        let value = engine.resolve("Query.posts", json!({ "user_id": 1 })).await.unwrap();
        assert_eq!(value.entities().len(), 2);
    }

    assert_eq!(engine.runtime().data_store.calls().query, 2);
}

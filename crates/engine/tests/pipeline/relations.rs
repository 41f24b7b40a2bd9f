use pretty_assertions::assert_eq;
use quarry_engine::{ErrorCode, RequestContext, ResolvedValue};
use runtime_local::{InMemoryDataStore, Relation};
use schema::{CacheDirective, Directive, FieldDefinition, RelationKind};
use serde_json::json;

use crate::{TestEngine, keys, posts};

fn store(count: u64) -> InMemoryDataStore {
    posts(count)
        .relation("Post", "author", Relation::belongs_to("User", "user_id"))
        .relation("User", "posts", Relation::has_many("Post", "user_id"))
        .insert("Tag", json!({ "id": 1, "name": "rust" }))
        .insert("Tag", json!({ "id": 2, "name": "graphql" }))
        .insert("PostTag", json!({ "post_id": 1, "tag_id": 2 }))
        .insert("PostTag", json!({ "post_id": 1, "tag_id": 1 }))
        .relation("Post", "tags", Relation::belongs_to_many("Tag", "PostTag", "post_id", "tag_id"))
}

fn engine(count: u64) -> TestEngine {
    TestEngine::builder()
        .with_store(store(count))
        .with_field(
            FieldDefinition::new("Query", "posts")
                .directive(Directive::all("Post"))
                .directive(Directive::with(["author"])),
        )
        .with_field(FieldDefinition::new("Query", "users").directive(Directive::all("User")))
        .with_field(FieldDefinition::new("Query", "plainPosts").directive(Directive::all("Post")))
        .with_field(
            FieldDefinition::new("Query", "authors")
                .directive(Directive::all("User"))
                .directive(Directive::with(["posts.author", "posts.tags"])),
        )
        .with_field(
            FieldDefinition::new("Post", "author").directive(Directive::relation(RelationKind::BelongsTo, "author")),
        )
        .with_field(FieldDefinition::new("Post", "tags").directive(Directive::relation(RelationKind::BelongsToMany, "tags")))
        .with_field(
            FieldDefinition::new("User", "posts")
                .directive(Directive::relation(RelationKind::HasMany, "posts"))
                .directive(Directive::Cache(CacheDirective::default())),
        )
        .build()
}

#[tokio::test]
async fn eager_loading_costs_one_call_whatever_the_number_of_parents() {
    let engine = engine(100);

    let value = engine.resolve("Query.posts", json!({})).await.unwrap();

    let posts = value.entities();
    assert_eq!(posts.len(), 100);
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 1);

    let authors = posts
        .iter()
        .map(|post| post.relation("author").unwrap()[0].key.clone())
        .take(4)
        .collect::<Vec<_>>();
    assert_eq!(authors, vec![json!(1), json!(2), json!(1), json!(2)]);
}

#[tokio::test]
async fn relation_fields_reuse_eager_loaded_entities() {
    let engine = engine(10);

    let value = engine.resolve("Query.posts", json!({})).await.unwrap();
    let posts = value.entities().into_iter().cloned().collect::<Vec<_>>();

    let authors = engine
        .engine()
        .resolve_batch(engine.field("Post.author"), &posts, Default::default(), &RequestContext::new())
        .await;

    assert_eq!(authors.len(), 10);
    assert!(authors.iter().all(|author| matches!(author, Ok(ResolvedValue::Entity(_)))));
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 1);
}

#[tokio::test]
async fn batched_relation_fields_share_one_call() {
    let engine = engine(50);

    let value = engine.resolve("Query.plainPosts", json!({})).await.unwrap();
    let posts = value.entities().into_iter().cloned().collect::<Vec<_>>();
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 0);

    let authors = engine
        .engine()
        .resolve_batch(engine.field("Post.author"), &posts, Default::default(), &RequestContext::new())
        .await
        .into_iter()
        .map(|author| keys(&author.unwrap()))
        .collect::<Vec<_>>();

    assert_eq!(authors[0], vec![json!(1)]);
    assert_eq!(authors[1], vec![json!(2)]);
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 1);

    let tags = engine
        .engine()
        .resolve_batch(engine.field("Post.tags"), &posts[..2], Default::default(), &RequestContext::new())
        .await;
    assert_eq!(keys(tags[0].as_ref().unwrap()), vec![json!(2), json!(1)]);
    assert_eq!(tags[1], Ok(ResolvedValue::Entities(Vec::new())));
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 2);
}

#[tokio::test]
async fn nested_eager_loads() {
    let engine = engine(4);

    let value = engine.resolve("Query.authors", json!({})).await.unwrap();

    let alice = value.entities()[0].clone();
    let posts = alice.relation("posts").unwrap();
    assert_eq!(posts.iter().map(|post| post.key.clone()).collect::<Vec<_>>(), vec![json!(1), json!(3)]);
    assert_eq!(posts[0].relation("author").unwrap()[0].key, json!(1));
    assert_eq!(posts[0].relation("tags").map(<[_]>::len), Some(2));

    // One call per relation level and name: posts, posts.author, posts.tags.
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 3);
}

#[tokio::test]
async fn cached_relations_skip_the_batch() {
    let engine = engine(4);

    let value = engine.resolve("Query.users", json!({})).await.unwrap();
    let users = value.entities().into_iter().cloned().collect::<Vec<_>>();

    let field = engine.field("User.posts");
    let first = engine
        .engine()
        .resolve_batch(field, &users, Default::default(), &RequestContext::new())
        .await;
    let second = engine
        .engine()
        .resolve_batch(field, &users, Default::default(), &RequestContext::new())
        .await;

    assert_eq!(first, second);
    assert_eq!(keys(first[1].as_ref().unwrap()), vec![json!(2), json!(4)]);
    assert_eq!(engine.runtime().data_store.calls().fetch_relation, 1);
}

#[tokio::test]
async fn batch_failures_are_reported_per_parent() {
    let engine = TestEngine::builder()
        .with_store(posts(2))
        .with_field(FieldDefinition::new("Query", "posts").directive(Directive::all("Post")))
        .with_field(
            FieldDefinition::new("Post", "comments").directive(Directive::relation(RelationKind::HasMany, "comments")),
        )
        .build();

    let value = engine.resolve("Query.posts", json!({})).await.unwrap();
    let posts = value.entities().into_iter().cloned().collect::<Vec<_>>();

    let results = engine
        .engine()
        .resolve_batch(engine.field("Post.comments"), &posts, Default::default(), &RequestContext::new())
        .await;

    let paths = results
        .iter()
        .map(|result| {
            let err = result.as_ref().unwrap_err();
            assert_eq!(err.code, ErrorCode::DataStoreError);
            serde_json::to_value(&err.path).unwrap()
        })
        .collect::<Vec<_>>();
    assert_eq!(paths, vec![json!([0, "comments"]), json!([1, "comments"])]);
}

use pretty_assertions::assert_eq;
use quarry_engine::{ErrorCode, ResolvedValue};
use runtime::ids::IdCodec;
use runtime_local::{InMemoryBroadcaster, InMemoryDataStore, Published};
use schema::{
    ArgTransform, BroadcastDirective, Directive, FieldDefinition, GlobalIdProjection, InputValueDefinition,
    MutateDirective, MutationKind,
};
use serde_json::json;

use crate::{TestEngine, keys, posts};

fn mutation(name: &str, kind: MutationKind) -> FieldDefinition {
    FieldDefinition::new("Mutation", name).directive(Directive::mutate(kind, "Post"))
}

fn spread_input() -> InputValueDefinition {
    InputValueDefinition::new("input")
        .directive(Directive::ArgTransform(ArgTransform::Spread))
        .field(InputValueDefinition::new("title").directive(Directive::ArgTransform(ArgTransform::Trim)))
}

#[tokio::test]
async fn create_trims_then_spreads_the_input() {
    let engine = TestEngine::builder()
        .with_store(InMemoryDataStore::new().model("Post", "id"))
        .with_field(mutation("createPost", MutationKind::Create).argument(spread_input()))
        .build();

    let value = engine
        .resolve("Mutation.createPost", json!({ "input": { "title": "  Hi  " } }))
        .await
        .unwrap();

    let post = value.as_entity().unwrap();
    assert_eq!(post.key, json!(1));
    assert_eq!(serde_json::Value::Object(post.attributes.clone()), json!({ "title": "Hi", "id": 1 }));
}

#[tokio::test]
async fn renamed_inputs_are_spread_after_trimming() {
    let engine = TestEngine::builder()
        .with_store(InMemoryDataStore::new().model("Post", "id"))
        .with_field(
            mutation("createPost", MutationKind::Create).argument(
                InputValueDefinition::new("input")
                    .directive(Directive::ArgTransform(ArgTransform::Trim))
                    .directive(Directive::rename("data"))
                    .directive(Directive::ArgTransform(ArgTransform::Spread))
                    .field(InputValueDefinition::new("title").directive(Directive::ArgTransform(ArgTransform::Trim))),
            ),
        )
        .build();

    let value = engine
        .resolve("Mutation.createPost", json!({ "input": { "title": "  Hi  " } }))
        .await
        .unwrap();

    let post = value.as_entity().unwrap();
    assert_eq!(serde_json::Value::Object(post.attributes.clone()), json!({ "title": "Hi", "id": 1 }));
    assert_eq!(post.attribute("data"), None);
    assert_eq!(post.attribute("input"), None);
}

#[tokio::test]
async fn update_requires_an_existing_key() {
    let engine = TestEngine::builder()
        .with_store(posts(2))
        .with_field(
            mutation("updatePost", MutationKind::Update)
                .argument(InputValueDefinition::new("id"))
                .argument(spread_input()),
        )
        .build();

    let value = engine
        .resolve("Mutation.updatePost", json!({ "id": 2, "input": { "title": " Edited " } }))
        .await
        .unwrap();
    let post = value.as_entity().unwrap();
    assert_eq!(post.attribute("title"), Some(&json!("Edited")));
    assert_eq!(post.attribute("views"), Some(&json!(20)));

    let err = engine
        .resolve("Mutation.updatePost", json!({ "id": 42, "input": { "title": "x" } }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = engine
        .resolve("Mutation.updatePost", json!({ "input": { "title": "x" } }))
        .await
        .unwrap_err();
    assert_eq!(err.message, "The `id` argument is required.");
}

#[tokio::test]
async fn upsert_creates_missing_entities() {
    let engine = TestEngine::builder()
        .with_store(posts(2))
        .with_field(mutation("upsertPost", MutationKind::Upsert).argument(InputValueDefinition::new("id")))
        .build();

    engine
        .resolve("Mutation.upsertPost", json!({ "id": 1, "title": "Updated" }))
        .await
        .unwrap();
    let value = engine
        .resolve("Mutation.upsertPost", json!({ "id": 7, "title": "Created" }))
        .await
        .unwrap();
    assert_eq!(keys(&value), vec![json!(7)]);

    let calls = engine.runtime().data_store.calls();
    assert_eq!((calls.update, calls.create), (1, 1));

    let titles = engine
        .runtime()
        .data_store
        .all("Post")
        .await
        .into_iter()
        .map(|post| post.attributes["title"].clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec![json!("Updated"), json!("Post 2"), json!("Created")]);
}

#[tokio::test]
async fn list_inputs_create_one_entity_each() {
    let engine = TestEngine::builder()
        .with_store(InMemoryDataStore::new().model("Post", "id"))
        .with_field(
            FieldDefinition::new("Mutation", "createPosts")
                .directive(Directive::Mutate(MutateDirective {
                    kind: MutationKind::Create,
                    model: "Post".into(),
                    key: "id".into(),
                    global_id: false,
                    input: Some("posts".into()),
                }))
                .argument(
                    InputValueDefinition::new("posts")
                        .field(InputValueDefinition::new("title").directive(Directive::ArgTransform(ArgTransform::Trim))),
                ),
        )
        .build();

    let value = engine
        .resolve("Mutation.createPosts", json!({ "posts": [{ "title": " a " }, { "title": "b" }] }))
        .await
        .unwrap();

    assert_eq!(keys(&value), vec![json!(1), json!(2)]);
    assert_eq!(value.entities()[0].attribute("title"), Some(&json!("a")));

    let err = engine
        .resolve("Mutation.createPosts", json!({ "posts": "nope" }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

fn delete_engine() -> TestEngine {
    TestEngine::builder()
        .with_store(posts(5))
        .with_field(mutation("deletePosts", MutationKind::Delete).argument(InputValueDefinition::new("id")))
        .build()
}

#[tokio::test]
async fn delete_returns_entities_in_input_order() {
    let engine = delete_engine();

    let value = engine
        .resolve("Mutation.deletePosts", json!({ "id": [4, 1, 3] }))
        .await
        .unwrap();

    assert_eq!(keys(&value), vec![json!(4), json!(1), json!(3)]);
    assert_eq!(engine.runtime().data_store.all("Post").await.len(), 2);

    let value = engine.resolve("Mutation.deletePosts", json!({ "id": 2 })).await.unwrap();
    assert!(matches!(value, ResolvedValue::Entity(post) if post.key == json!(2)));
}

#[tokio::test]
async fn delete_is_all_or_nothing() {
    let engine = delete_engine();

    let err = engine
        .resolve("Mutation.deletePosts", json!({ "id": [1, 42, 2] }))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(engine.runtime().data_store.calls().delete, 0);
    assert_eq!(engine.runtime().data_store.all("Post").await.len(), 5);
}

#[tokio::test]
async fn delete_rejects_repeated_keys() {
    let engine = delete_engine();

    let err = engine
        .resolve("Mutation.deletePosts", json!({ "id": [1, "1"] }))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "The key 1 is given more than once.");
    assert_eq!(engine.runtime().data_store.calls().delete, 0);
    assert_eq!(engine.runtime().data_store.all("Post").await.len(), 5);
}

#[tokio::test]
async fn delete_by_global_id() {
    let engine = TestEngine::builder()
        .with_store(posts(3))
        .with_field(
            mutation("deletePost", MutationKind::Delete).argument(InputValueDefinition::new("id").directive(
                Directive::ArgTransform(ArgTransform::GlobalId {
                    decode: GlobalIdProjection::Full,
                }),
            )),
        )
        .build();

    let ids = [1, 3].map(|id| engine.runtime().id_codec.encode("Post", &id.to_string()));

    let value = engine
        .resolve("Mutation.deletePost", json!({ "id": ids }))
        .await
        .unwrap();
    assert_eq!(keys(&value), vec![json!(1), json!(3)]);

    let id = engine.runtime().id_codec.encode("Post", "2");
    let value = engine.resolve("Mutation.deletePost", json!({ "id": id })).await.unwrap();
    assert_eq!(keys(&value), vec![json!(2)]);

    let err = engine
        .resolve("Mutation.deletePost", json!({ "id": "%%%" }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedIdentifier);
}

fn broadcasting(broadcaster: InMemoryBroadcaster) -> TestEngine {
    TestEngine::builder()
        .with_store(InMemoryDataStore::new().model("Post", "id"))
        .with_broadcaster(broadcaster)
        .with_field(
            mutation("createPost", MutationKind::Create)
                .argument(InputValueDefinition::new("title"))
                .directive(Directive::Broadcast(BroadcastDirective {
                    subscription: "postCreated".into(),
                    should_queue: true,
                }))
                .directive(Directive::Broadcast(BroadcastDirective {
                    subscription: "feedUpdated".into(),
                    should_queue: false,
                })),
        )
        .build()
}

#[tokio::test]
async fn mutations_broadcast_their_result() {
    let engine = broadcasting(InMemoryBroadcaster::new());
    let mut subscriber = engine.runtime().broadcaster.subscribe();

    engine
        .resolve("Mutation.createPost", json!({ "title": "Hi" }))
        .await
        .unwrap();

    let payload = json!({ "entity": { "model": "Post", "key": 1, "attributes": { "title": "Hi", "id": 1 } } });
    assert_eq!(
        engine.runtime().broadcaster.published(),
        vec![
            Published {
                subscription: "postCreated".into(),
                payload: payload.clone(),
                queued: true,
            },
            Published {
                subscription: "feedUpdated".into(),
                payload,
                queued: false,
            },
        ]
    );
    assert_eq!(subscriber.recv().await.unwrap().subscription, "postCreated");
}

#[tokio::test]
async fn broadcast_failures_do_not_fail_the_mutation() {
    let engine = broadcasting(InMemoryBroadcaster::failing("connection refused"));

    let value = engine
        .resolve("Mutation.createPost", json!({ "title": "Hi" }))
        .await
        .unwrap();

    assert_eq!(keys(&value), vec![json!(1)]);
    assert!(engine.runtime().broadcaster.published().is_empty());
}

#[tokio::test]
async fn failed_mutations_do_not_broadcast() {
    let engine = TestEngine::builder()
        .with_store(posts(1))
        .with_field(
            mutation("updatePost", MutationKind::Update)
                .argument(InputValueDefinition::new("id"))
                .directive(Directive::Broadcast(BroadcastDirective {
                    subscription: "postUpdated".into(),
                    should_queue: false,
                })),
        )
        .build();

    assert!(engine.resolve("Mutation.updatePost", json!({ "id": 9 })).await.is_err());
    assert!(engine.runtime().broadcaster.published().is_empty());
}

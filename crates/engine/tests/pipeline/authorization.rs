use pretty_assertions::assert_eq;
use quarry_engine::{ErrorCode, RequestContext};
use runtime::auth::{AuthorizationTarget, Principal};
use runtime_local::{PolicyRegistry, StoreCalls};
use schema::{Authorize, CanDirective, Directive, FieldDefinition, InputValueDefinition, MutationKind};
use serde_json::json;

use crate::{TestEngine, posts};

fn owner_policy() -> PolicyRegistry {
    PolicyRegistry::new()
        .policy("Post", "update", |principal, target, _| match (principal, target) {
            (Some(principal), AuthorizationTarget::Entity(post)) => {
                post.attribute("user_id").map(|id| id.to_string()) == Some(principal.id.clone())
            }
            _ => false,
        })
        .fallback("viewAny", |principal, _, _| principal.is_some())
}

fn engine() -> TestEngine {
    TestEngine::builder()
        .with_store(posts(3))
        .with_authorizer(owner_policy())
        .with_field(
            FieldDefinition::new("Mutation", "updatePost")
                .directive(Directive::Authorize(Authorize::Auth { guards: vec!["api".into()] }))
                .directive(Directive::Authorize(Authorize::Can(CanDirective {
                    ability: "update".into(),
                    find: Some("id".into()),
                    model: None,
                    args: Vec::new(),
                })))
                .directive(Directive::mutate(MutationKind::Update, "Post"))
                .argument(InputValueDefinition::new("id")),
        )
        .with_field(
            FieldDefinition::new("Query", "posts")
                .directive(Directive::all("Post"))
                .directive(Directive::can("viewAny")),
        )
        .with_field(
            FieldDefinition::new("Mutation", "deletePost")
                .directive(Directive::can("delete"))
                .directive(Directive::mutate(MutationKind::Delete, "Post"))
                .argument(InputValueDefinition::new("id")),
        )
        .build()
}

#[tokio::test]
async fn unauthenticated_requests_are_denied_without_side_effects() {
    let engine = engine();

    let err = engine
        .resolve("Mutation.updatePost", json!({ "id": 1, "title": "Hacked" }))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(err.extension("directive"), Some(&json!("auth")));
    assert_eq!(engine.runtime().authorizer.checks(), 0);
    assert_eq!(engine.runtime().data_store.calls(), StoreCalls::default());
}

#[tokio::test]
async fn guards_restrict_principals() {
    let engine = engine();
    let request = RequestContext::new().with_principal(Principal::new("1", "web"));

    let err = engine
        .resolve_with("Mutation.updatePost", json!({ "id": 1, "title": "Edited" }), &request)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(engine.runtime().authorizer.checks(), 0);
}

#[tokio::test]
async fn policies_check_the_entity_found_by_key() {
    let engine = engine();
    let alice = RequestContext::new().with_principal(Principal::new("1", "api"));

    // Post 2 belongs to user 2.
    let err = engine
        .resolve_with("Mutation.updatePost", json!({ "id": 2, "title": "Edited" }), &alice)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(err.extension("directive"), Some(&json!("can")));
    assert_eq!(engine.runtime().data_store.calls().update, 0);

    let value = engine
        .resolve_with("Mutation.updatePost", json!({ "id": 1, "title": "Edited" }), &alice)
        .await
        .unwrap();
    assert_eq!(value.as_entity().unwrap().attribute("title"), Some(&json!("Edited")));

    let err = engine
        .resolve_with("Mutation.updatePost", json!({ "id": 42, "title": "Edited" }), &alice)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn fallback_policies_and_missing_policies() {
    let engine = engine();

    let err = engine.resolve("Query.posts", json!({})).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(engine.runtime().data_store.calls().query, 0);

    let request = RequestContext::new().with_principal(Principal::new("1", "api"));
    let value = engine.resolve_with("Query.posts", json!({}), &request).await.unwrap();
    assert_eq!(value.entities().len(), 3);

    // No policy for `delete`.
    let err = engine
        .resolve_with("Mutation.deletePost", json!({ "id": 1 }), &request)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(engine.runtime().data_store.all("Post").await.len(), 3);
}

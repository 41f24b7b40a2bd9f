use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use quarry_engine::{ErrorCode, RequestContext, ResolvedValue};
use runtime::{auth::Principal, ids::IdCodec};
use runtime_local::InMemoryDataStore;
use schema::{
    ArgTransform, Directive, FieldDefinition, GlobalIdProjection, InputValueDefinition, MutationKind, QueryConstraint,
    RulesDirective, Validate,
};
use serde_json::json;

use crate::{TestEngine, keys, posts};

fn create_user() -> FieldDefinition {
    FieldDefinition::new("Mutation", "createUser")
        .directive(Directive::mutate(MutationKind::Create, "User"))
        .argument(
            InputValueDefinition::new("name")
                .directive(Directive::ArgTransform(ArgTransform::Trim))
                .directive(Directive::rules(["required", "min:3"])),
        )
        .argument(InputValueDefinition::new("email").directive(Directive::rules(["required", "email"])))
        .argument(
            InputValueDefinition::new("password")
                .directive(Directive::rules(["nullable", "min:8"]))
                .directive(Directive::ArgTransform(ArgTransform::Bcrypt)),
        )
        .argument(
            InputValueDefinition::new("tags")
                .directive(Directive::Validate(Validate::RulesForArray(RulesDirective {
                    rules: vec![schema::Rule::new("max:2")],
                    messages: IndexMap::from([("max".to_string(), "Too many :attribute.".to_string())]),
                })))
                .directive(Directive::rules(["alpha_num"])),
        )
}

fn engine() -> TestEngine {
    TestEngine::builder()
        .with_store(InMemoryDataStore::new().model("User", "id"))
        .with_field(create_user())
        .build()
}

#[tokio::test]
async fn validation_failures_are_aggregated() {
    let engine = engine();

    let err = engine
        .resolve(
            "Mutation.createUser",
            json!({ "name": "  ab  ", "password": "short", "tags": ["a", "b-c", "d"] }),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    insta::assert_json_snapshot!(err.extension("validation"), @r#"
    {
      "name": [
        "The name field must be at least 3 characters."
      ],
      "email": [
        "The email field is required."
      ],
      "password": [
        "The password field must be at least 8 characters."
      ],
      "tags": [
        "Too many tags."
      ],
      "tags.1": [
        "The tags.1 field must only contain letters and numbers."
      ]
    }
    "#);

    // Nothing is written when validation fails.
    assert_eq!(engine.runtime().data_store.calls().create, 0);
}

#[tokio::test]
async fn validated_arguments_are_hashed() {
    let engine = engine();

    let value = engine
        .resolve(
            "Mutation.createUser",
            json!({ "name": " Alice ", "email": "alice@example.com", "password": "correct horse" }),
        )
        .await
        .unwrap();

    let user = value.as_entity().unwrap();
    assert_eq!(user.attribute("name"), Some(&json!("Alice")));

    let hash = user.attribute("password").and_then(|hash| hash.as_str()).unwrap();
    assert_ne!(hash, "correct horse");
    assert!(engine.runtime().hasher.verify("correct horse", hash));
}

#[tokio::test]
async fn nullable_values_skip_their_rules() {
    let engine = engine();

    let value = engine
        .resolve(
            "Mutation.createUser",
            json!({ "name": "Bob", "email": "bob@example.com", "password": null }),
        )
        .await
        .unwrap();

    assert_eq!(value.as_entity().unwrap().attribute("password"), Some(&json!(null)));
}

#[tokio::test]
async fn injected_values_overwrite_client_input() {
    let engine = TestEngine::builder()
        .with_store(InMemoryDataStore::new().model("Post", "id"))
        .with_field(
            FieldDefinition::new("Mutation", "createPost")
                .directive(Directive::mutate(MutationKind::Create, "Post"))
                .directive(Directive::ArgTransform(ArgTransform::Inject {
                    context: "principal.id".into(),
                    name: "user_id".into(),
                }))
                .directive(Directive::ArgTransform(ArgTransform::Inject {
                    context: "tenant.region".into(),
                    name: "meta.region".into(),
                })),
        )
        .build();

    let request = RequestContext::new()
        .with_principal(Principal::new("7", "api"))
        .with_value("tenant", json!({ "region": "eu" }));

    let value = engine
        .resolve_with("Mutation.createPost", json!({ "title": "Hi", "user_id": "1" }), &request)
        .await
        .unwrap();

    let post = value.as_entity().unwrap();
    assert_eq!(post.attribute("user_id"), Some(&json!("7")));
    assert_eq!(post.attribute("meta"), Some(&json!({ "region": "eu" })));
}

#[tokio::test]
async fn renamed_arguments_drive_constraints() {
    let engine = TestEngine::builder()
        .with_store(posts(4))
        .with_field(
            FieldDefinition::new("Query", "posts").directive(Directive::all("Post")).argument(
                InputValueDefinition::new("author")
                    .directive(Directive::rename("user_id"))
                    .directive(Directive::QueryConstraint(QueryConstraint::Eq { key: None })),
            ),
        )
        .build();

    let value = engine.resolve("Query.posts", json!({ "author": 2 })).await.unwrap();

    assert_eq!(keys(&value), vec![json!(2), json!(4)]);
}

#[tokio::test]
async fn global_ids_are_decoded_and_encoded() {
    let engine = TestEngine::builder()
        .with_store(posts(3))
        .with_field(
            FieldDefinition::new("Query", "post").directive(Directive::find("Post")).argument(
                InputValueDefinition::new("id")
                    .directive(Directive::ArgTransform(ArgTransform::GlobalId {
                        decode: GlobalIdProjection::Id,
                    }))
                    .directive(Directive::QueryConstraint(QueryConstraint::Eq { key: None })),
            ),
        )
        .with_field(
            FieldDefinition::new("Post", "id").directive(Directive::ArgTransform(ArgTransform::GlobalId {
                decode: GlobalIdProjection::Full,
            })),
        )
        .with_field(FieldDefinition::new("Post", "headline").directive(Directive::rename("title")))
        .build();

    let id = engine.runtime().id_codec.encode("Post", "2");
    assert_eq!(id, "UG9zdDoy");

    let value = engine.resolve("Query.post", json!({ "id": id })).await.unwrap();
    let post = value.as_entity().unwrap();
    assert_eq!(post.key, json!(2));

    let request = RequestContext::new();
    let encoded = engine
        .engine()
        .resolve(engine.field("Post.id"), Some(post), Default::default(), &request)
        .await
        .unwrap();
    assert_eq!(encoded, ResolvedValue::Json(json!("UG9zdDoy")));

    let headline = engine
        .engine()
        .resolve(engine.field("Post.headline"), Some(post), Default::default(), &request)
        .await
        .unwrap();
    assert_eq!(headline, ResolvedValue::Json(json!("Post 2")));

    let err = engine.resolve("Query.post", json!({ "id": "not-an-id" })).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedIdentifier);
    assert_eq!(engine.runtime().data_store.calls().query, 1);
}

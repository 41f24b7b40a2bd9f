use std::sync::Arc;

use pretty_assertions::assert_eq;
use quarry_engine::{CustomContext, CustomResolvers, Engine, ErrorCode, FieldError, RequestContext, ResolvedValue, Schema, SchemaError};
use runtime::{
    auth::Principal,
    plan::{Constraint, Predicate},
};
use runtime_local::LocalRuntime;
use schema::{Config, Custom, Directive, FieldDefinition, InputValueDefinition, Operator};
use serde_json::json;

use crate::{TestEngine, keys, posts};

fn resolvers() -> CustomResolvers {
    CustomResolvers::new()
        .field("greeting", |ctx: CustomContext| async move {
            let name = ctx.arguments.get("name").and_then(|name| name.as_str()).unwrap_or("stranger");
            let by = ctx.principal.map(|principal| principal.id).unwrap_or_default();
            Ok(json!({ "message": format!("Hello {name}"), "by": by }))
        })
        .field("explode", |_| async { Err(FieldError::new("Boom", ErrorCode::CustomResolverError)) })
        .method("Post", "excerpt", |ctx: CustomContext| async move {
            let title = ctx
                .parent
                .as_ref()
                .and_then(|post| post.attribute("title"))
                .and_then(|title| title.as_str())
                .unwrap_or_default();
            Ok(json!(title.chars().take(4).collect::<String>()))
        })
        .builder("popular", |value, _| {
            Ok(if value.as_bool() == Some(true) {
                vec![Constraint::Filter(Predicate::compare("views", Operator::Gte, json!(30)))]
            } else {
                Vec::new()
            })
        })
}

fn engine() -> TestEngine {
    TestEngine::builder()
        .with_store(posts(4))
        .with_custom_resolvers(resolvers())
        .with_field(
            FieldDefinition::new("Query", "greeting")
                .directive(Directive::Custom(Custom::Field {
                    resolver: "greeting".into(),
                }))
                .argument(InputValueDefinition::new("name").directive(Directive::ArgTransform(schema::ArgTransform::Trim))),
        )
        .with_field(FieldDefinition::new("Query", "explode").directive(Directive::Custom(Custom::Field {
            resolver: "explode".into(),
        })))
        .with_field(FieldDefinition::new("Post", "excerpt").directive(Directive::Custom(Custom::Method {
            name: "excerpt".into(),
        })))
        .with_field(
            FieldDefinition::new("Query", "posts").directive(Directive::all("Post")).argument(
                InputValueDefinition::new("popular").directive(Directive::Custom(Custom::Builder {
                    method: "popular".into(),
                })),
            ),
        )
        .build()
}

#[tokio::test]
async fn custom_resolvers_receive_transformed_arguments() {
    let engine = engine();
    let request = RequestContext::new().with_principal(Principal::new("9", "api"));

    let value = engine
        .resolve_with("Query.greeting", json!({ "name": "  Ada " }), &request)
        .await
        .unwrap();

    assert_eq!(value, ResolvedValue::Json(json!({ "message": "Hello Ada", "by": "9" })));
}

#[tokio::test]
async fn custom_errors_are_tagged_with_the_field() {
    let engine = engine();

    let err = engine.resolve("Query.explode", json!({})).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::CustomResolverError);
    assert_eq!(err.message, "Boom");
    assert_eq!(err.extension("field"), Some(&json!("Query.explode")));
    assert_eq!(serde_json::to_value(&err.path).unwrap(), json!(["explode"]));
}

#[tokio::test]
async fn methods_receive_their_parent() {
    let engine = engine();

    let value = engine.resolve("Query.posts", json!({})).await.unwrap();
    let posts = value.entities().into_iter().cloned().collect::<Vec<_>>();

    let excerpts = engine
        .engine()
        .resolve_batch(engine.field("Post.excerpt"), &posts[..2], Default::default(), &RequestContext::new())
        .await;

    assert_eq!(
        excerpts,
        vec![
            Ok(ResolvedValue::Json(json!("Post"))),
            Ok(ResolvedValue::Json(json!("Post")))
        ]
    );
}

#[tokio::test]
async fn builders_add_constraints() {
    let engine = engine();

    let value = engine.resolve("Query.posts", json!({ "popular": true })).await.unwrap();
    assert_eq!(keys(&value), vec![json!(3), json!(4)]);

    let value = engine.resolve("Query.posts", json!({ "popular": false })).await.unwrap();
    assert_eq!(keys(&value).len(), 4);
}

#[tokio::test]
async fn unknown_custom_resolvers_are_rejected_at_startup() {
    let config = Config::default();
    let schema = Schema::builder(config.clone())
        .field(FieldDefinition::new("Query", "missing").directive(Directive::Custom(Custom::Field {
            resolver: "nowhere".into(),
        })))
        .build()
        .unwrap();

    let err = Engine::new(Arc::new(schema), LocalRuntime::new(&config), CustomResolvers::new()).err();

    assert_eq!(
        err,
        Some(SchemaError::UnknownCustomResolver {
            field: "Query.missing".into(),
            kind: "field",
            name: "nowhere".into(),
        })
    );
}

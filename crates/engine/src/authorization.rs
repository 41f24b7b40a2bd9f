use error::FieldError;
use runtime::{
    Arguments, Entity, Runtime,
    auth::{AuthorizationTarget, Authorizer},
    ids::IdCodec,
    store::DataStore,
};
use schema::{ArgTransform, Authorize, CanDirective, Directive, ResolverDefinition};
use serde_json::Value;

use crate::context::ResolutionContext;

/// Evaluates the authorization directives of the field in declaration order. The first denial
/// short-circuits the resolution.
pub(crate) async fn authorize<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    arguments: &Arguments,
) -> Result<(), FieldError> {
    for authorize in ctx.field.authorizations() {
        match authorize {
            Authorize::Auth { guards } => {
                let allowed = ctx
                    .principal()
                    .is_some_and(|principal| guards.is_empty() || guards.contains(&principal.guard));

                if !allowed {
                    tracing::debug!("Unauthenticated access to {} denied", ctx.field.qualified_name());
                    return Err(FieldError::forbidden("auth"));
                }
            }
            Authorize::Can(can) => {
                if !check(ctx, can, arguments).await? {
                    tracing::debug!(
                        "Ability '{}' denied on {}",
                        can.ability,
                        ctx.field.qualified_name()
                    );
                    return Err(FieldError::forbidden("can"));
                }
            }
        }
    }

    Ok(())
}

async fn check<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    can: &CanDirective,
    arguments: &Arguments,
) -> Result<bool, FieldError> {
    let model = can.model.as_deref().or_else(|| ctx.field.resolver().model());

    let (Some(find), Some(model)) = (&can.find, model) else {
        let target = model.map(AuthorizationTarget::Model).unwrap_or(AuthorizationTarget::None);
        return ask(ctx, can, target).await;
    };

    let keys = match arguments.get(find) {
        Some(Value::Array(keys)) => keys.clone(),
        Some(Value::Null) | None => return Err(FieldError::not_found(model)),
        Some(key) => vec![key.clone()],
    };

    let decodes_global_id = ctx
        .field
        .definition()
        .find_argument(find)
        .is_some_and(|argument| {
            argument
                .directives
                .iter()
                .any(|directive| matches!(directive, Directive::ArgTransform(ArgTransform::GlobalId { .. })))
        })
        || matches!(ctx.field.resolver(), ResolverDefinition::Mutate(mutate) if mutate.global_id && mutate.key == *find);

    for key in keys {
        let key = if decodes_global_id {
            decode_key(ctx.runtime().id_codec(), key)?
        } else {
            key
        };

        let entity = find_entity(ctx, model, &key).await?;
        if !ask(ctx, can, AuthorizationTarget::Entity(&entity)).await? {
            return Ok(false);
        }
    }

    Ok(true)
}

async fn find_entity<R: Runtime>(ctx: ResolutionContext<'_, R>, model: &str, key: &Value) -> Result<Entity, FieldError> {
    ctx.runtime()
        .data_store()
        .find_by_key(model, key)
        .await
        .map_err(FieldError::data_store)?
        .ok_or_else(|| FieldError::not_found(model))
}

async fn ask<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    can: &CanDirective,
    target: AuthorizationTarget<'_>,
) -> Result<bool, FieldError> {
    ctx.runtime()
        .authorizer()
        .authorize(&can.ability, ctx.principal(), target, &can.args)
        .await
        .map_err(|err| {
            tracing::error!("Authorizer failed for ability '{}': {err:#}", can.ability);
            FieldError::internal_server_error()
        })
}

pub(crate) fn decode_key(codec: &impl IdCodec, key: Value) -> Result<Value, FieldError> {
    match key {
        Value::String(global_id) => codec
            .decode(&global_id)
            .map(|(_, id)| Value::String(id))
            .map_err(|_| FieldError::malformed_identifier(&global_id)),
        other => Ok(other),
    }
}

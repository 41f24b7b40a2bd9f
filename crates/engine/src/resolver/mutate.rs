use std::collections::HashSet;

use error::FieldError;
use runtime::{
    Arguments, Entity, Runtime, key_to_string,
    store::{DataStore, StoreError},
};
use schema::{ArgTransform, Directive, GlobalIdProjection, MutateDirective, MutationKind};
use serde_json::Value;

use crate::{ResolvedValue, authorization::decode_key, context::ResolutionContext};

pub(super) async fn resolve<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    mutate: &MutateDirective,
    arguments: &Arguments,
) -> Result<ResolvedValue, FieldError> {
    if mutate.kind == MutationKind::Delete {
        return delete(ctx, mutate, arguments).await;
    }

    let (inputs, is_list) = match &mutate.input {
        None => (vec![arguments.clone()], false),
        Some(name) => match arguments.get(name) {
            Some(Value::Object(input)) => (vec![input.clone()], false),
            Some(Value::Array(items)) => {
                let inputs = items
                    .iter()
                    .map(|item| item.as_object().cloned().ok_or_else(|| invalid_input(name)))
                    .collect::<Result<Vec<_>, _>>()?;
                (inputs, true)
            }
            _ => return Err(invalid_input(name)),
        },
    };

    let mut entities = Vec::with_capacity(inputs.len());
    for input in inputs {
        entities.push(write(ctx, mutate, input).await?);
    }

    Ok(if is_list {
        ResolvedValue::Entities(entities)
    } else {
        entities
            .into_iter()
            .next()
            .map(ResolvedValue::Entity)
            .unwrap_or(ResolvedValue::Null)
    })
}

async fn write<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    mutate: &MutateDirective,
    mut input: Arguments,
) -> Result<Entity, FieldError> {
    let store = ctx.runtime().data_store();
    let model = mutate.model.as_str();

    let result = match mutate.kind {
        MutationKind::Create => store.create(model, input).await,
        MutationKind::Update => {
            let key = match input.remove(&mutate.key) {
                Some(key) if !key.is_null() => normalize_key(ctx, mutate, key)?,
                _ => return Err(missing_key(&mutate.key)),
            };
            store.update(model, &key, input).await
        }
        MutationKind::Upsert => {
            let key = match input.remove(&mutate.key) {
                Some(key) if !key.is_null() => Some(normalize_key(ctx, mutate, key)?),
                _ => None,
            };

            let exists = match &key {
                Some(key) => store
                    .find_by_key(model, key)
                    .await
                    .map_err(|err| store_error(model, err))?
                    .is_some(),
                None => false,
            };

            match key {
                Some(key) if exists => store.update(model, &key, input).await,
                key => {
                    if let Some(key) = key {
                        input.insert(mutate.key.clone(), key);
                    }
                    store.create(model, input).await
                }
            }
        }
        // Deletions go through `delete`.
        MutationKind::Delete => return Err(FieldError::internal_server_error()),
    };

    result.map_err(|err| store_error(model, err))
}

/// Deleting a list is all or nothing: every key must exist before the first deletion.
async fn delete<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    mutate: &MutateDirective,
    arguments: &Arguments,
) -> Result<ResolvedValue, FieldError> {
    let store = ctx.runtime().data_store();
    let model = mutate.model.as_str();

    let pairs = decodes_to_pairs(ctx, mutate);
    let (keys, is_list) = match arguments.get(&mutate.key) {
        // A single decoded global id is a `[type, id]` pair, a list of them is a list of pairs.
        Some(Value::Array(keys)) if !pairs || keys.iter().all(Value::is_array) => (keys.clone(), true),
        Some(Value::Null) | None => return Err(missing_key(&mutate.key)),
        Some(key) => (vec![key.clone()], false),
    };

    let keys = keys
        .into_iter()
        .map(|key| normalize_key(ctx, mutate, key))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::with_capacity(keys.len());
    if let Some(key) = keys.iter().find(|key| !seen.insert(key_to_string(key))) {
        return Err(FieldError::invalid_argument(format!(
            "The key {} is given more than once.",
            key_to_string(key)
        )));
    }

    for key in &keys {
        let exists = store
            .find_by_key(model, key)
            .await
            .map_err(|err| store_error(model, err))?
            .is_some();

        if !exists {
            tracing::debug!("Refusing to delete {model}: {key} does not exist");
            return Err(FieldError::not_found(model));
        }
    }

    let mut deleted = Vec::with_capacity(keys.len());
    for key in &keys {
        deleted.push(store.delete(model, key).await.map_err(|err| store_error(model, err))?);
    }

    Ok(if is_list {
        ResolvedValue::Entities(deleted)
    } else {
        deleted
            .into_iter()
            .next()
            .map(ResolvedValue::Entity)
            .unwrap_or(ResolvedValue::Null)
    })
}

/// Keys are either still encoded global ids, or were decoded by the argument's `globalId`
/// transform into a `[type, id]` pair.
fn normalize_key<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    mutate: &MutateDirective,
    key: Value,
) -> Result<Value, FieldError> {
    match key {
        Value::Array(mut pair) if pair.len() == 2 && decodes_to_pairs(ctx, mutate) => Ok(pair.swap_remove(1)),
        key if mutate.global_id => decode_key(ctx.runtime().id_codec(), key),
        key => Ok(key),
    }
}

fn decodes_to_pairs<R: Runtime>(ctx: ResolutionContext<'_, R>, mutate: &MutateDirective) -> bool {
    ctx.field
        .definition()
        .find_argument(&mutate.key)
        .is_some_and(|argument| {
            argument.directives.iter().any(|directive| {
                matches!(
                    directive,
                    Directive::ArgTransform(ArgTransform::GlobalId {
                        decode: GlobalIdProjection::Full
                    })
                )
            })
        })
}

fn store_error(model: &str, err: StoreError) -> FieldError {
    match err {
        StoreError::NotFound { .. } => FieldError::not_found(model),
        err => FieldError::data_store(err),
    }
}

fn missing_key(key: &str) -> FieldError {
    FieldError::invalid_argument(format!("The `{key}` argument is required."))
}

fn invalid_input(name: &str) -> FieldError {
    FieldError::invalid_argument(format!(
        "The `{name}` argument must be an object or a list of objects."
    ))
}

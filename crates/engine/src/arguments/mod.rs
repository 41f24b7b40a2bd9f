//! The argument transformer chain.
//!
//! Transforms are scoped to the value they are declared on: nested input fields carry their own
//! directives and never see their siblings. The chain runs in stages:
//!
//! 1. `trim` sanitizes raw values,
//! 2. validation rules are evaluated on the sanitized values,
//! 3. `bcrypt`, `rename` and `globalId` apply in declaration order,
//! 4. field level `inject` writes request context values,
//! 5. `spread` flattens object arguments into their parent.

mod validation;

use error::FieldError;
use futures::{FutureExt, future::BoxFuture};
use runtime::{
    Arguments, Runtime,
    hashing::PasswordHasher,
    ids::IdCodec,
};
use schema::{ArgTransform, Directive, GlobalIdProjection, InputValueDefinition};
use serde_json::Value;

use crate::context::ResolutionContext;

pub(crate) async fn prepare<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    mut arguments: Arguments,
) -> Result<Arguments, FieldError> {
    let definitions = ctx.field.arguments();

    sanitize(definitions, &mut arguments);
    validation::validate(ctx, definitions, &arguments).await?;

    let mut arguments = transform(ctx.runtime(), definitions, arguments).await?;

    for (context, name) in ctx.field.injections() {
        inject(&mut arguments, name, ctx.request.lookup(context));
    }

    spread(definitions, &mut arguments);

    Ok(arguments)
}

/// Key of the value once `rename` applied.
pub(crate) fn output_key(definition: &InputValueDefinition) -> &str {
    definition
        .directives
        .iter()
        .rev()
        .find_map(|directive| match directive {
            Directive::ArgTransform(ArgTransform::Rename { attribute }) => Some(attribute.as_str()),
            _ => None,
        })
        .unwrap_or(&definition.name)
}

fn has_transform(definition: &InputValueDefinition, transform: &ArgTransform) -> bool {
    definition
        .directives
        .iter()
        .any(|directive| matches!(directive, Directive::ArgTransform(t) if t == transform))
}

fn sanitize(definitions: &[InputValueDefinition], arguments: &mut Arguments) {
    for definition in definitions {
        if let Some(value) = arguments.get_mut(&definition.name) {
            sanitize_value(definition, value);
        }
    }
}

fn sanitize_value(definition: &InputValueDefinition, value: &mut Value) {
    if has_transform(definition, &ArgTransform::Trim) {
        trim(value);
    }

    if definition.fields.is_empty() {
        return;
    }

    match value {
        Value::Object(object) => sanitize(&definition.fields, object),
        Value::Array(items) => {
            for item in items {
                if let Value::Object(object) = item {
                    sanitize(&definition.fields, object);
                }
            }
        }
        _ => {}
    }
}

fn trim(value: &mut Value) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(trim),
        _ => {}
    }
}

fn transform<'a, R: Runtime>(
    runtime: &'a R,
    definitions: &'a [InputValueDefinition],
    arguments: Arguments,
) -> BoxFuture<'a, Result<Arguments, FieldError>> {
    async move {
        let mut output = Arguments::new();

        for (name, value) in arguments {
            let Some(definition) = definitions.iter().find(|definition| definition.name == name) else {
                output.insert(name, value);
                continue;
            };

            let mut value = transform_nested(runtime, definition, value).await?;
            let mut key = name;

            for directive in &definition.directives {
                match directive {
                    Directive::ArgTransform(ArgTransform::Bcrypt) => {
                        value = hash(runtime.hasher(), &key, value).await?;
                    }
                    Directive::ArgTransform(ArgTransform::Rename { attribute }) => key = attribute.clone(),
                    Directive::ArgTransform(ArgTransform::GlobalId { decode }) => {
                        value = decode_global_id(runtime.id_codec(), value, *decode)?;
                    }
                    _ => {}
                }
            }

            output.insert(key, value);
        }

        Ok(output)
    }
    .boxed()
}

async fn transform_nested<R: Runtime>(
    runtime: &R,
    definition: &InputValueDefinition,
    value: Value,
) -> Result<Value, FieldError> {
    if definition.fields.is_empty() {
        return Ok(value);
    }

    match value {
        Value::Object(object) => Ok(Value::Object(transform(runtime, &definition.fields, object).await?)),
        Value::Array(items) => {
            let mut output = Vec::with_capacity(items.len());
            for item in items {
                output.push(match item {
                    Value::Object(object) => Value::Object(transform(runtime, &definition.fields, object).await?),
                    other => other,
                });
            }
            Ok(Value::Array(output))
        }
        other => Ok(other),
    }
}

async fn hash(hasher: &impl PasswordHasher, argument: &str, value: Value) -> Result<Value, FieldError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(plaintext) => hasher
            .hash(&plaintext)
            .await
            .map(Value::String)
            .map_err(|err| FieldError::hashing(err.to_string())),
        _ => Err(FieldError::hashing(format!(
            "The argument `{argument}` must be a string to be hashed."
        ))),
    }
}

fn decode_global_id(codec: &impl IdCodec, value: Value, projection: GlobalIdProjection) -> Result<Value, FieldError> {
    match value {
        Value::String(global_id) => {
            let (ty, id) = codec
                .decode(&global_id)
                .map_err(|_| FieldError::malformed_identifier(&global_id))?;

            Ok(match projection {
                GlobalIdProjection::Full => Value::Array(vec![Value::String(ty), Value::String(id)]),
                GlobalIdProjection::Type => Value::String(ty),
                GlobalIdProjection::Id => Value::String(id),
            })
        }
        Value::Array(items) => items
            .into_iter()
            .map(|item| decode_global_id(codec, item, projection))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Null => Ok(Value::Null),
        other => Err(FieldError::malformed_identifier(&other.to_string())),
    }
}

/// Writes `value` at the dotted `path`, creating intermediate objects and overwriting whatever
/// was there.
fn inject(arguments: &mut Arguments, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = arguments;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }

        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if !slot.is_object() {
            *slot = Value::Object(Default::default());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
}

fn spread(definitions: &[InputValueDefinition], arguments: &mut Arguments) {
    for definition in definitions {
        let key = output_key(definition);

        if !definition.fields.is_empty() {
            match arguments.get_mut(key) {
                Some(Value::Object(object)) => spread(&definition.fields, object),
                Some(Value::Array(items)) => {
                    for item in items {
                        if let Value::Object(object) = item {
                            spread(&definition.fields, object);
                        }
                    }
                }
                _ => {}
            }
        }

        if has_transform(definition, &ArgTransform::Spread) {
            match arguments.remove(key) {
                Some(Value::Object(object)) => arguments.extend(object),
                Some(Value::Null) | None => {}
                Some(other) => {
                    arguments.insert(key.to_string(), other);
                }
            }
        }
    }
}

use std::{future::Future, time::Duration};

use error::FieldError;
use runtime::{
    Arguments, Entity, Runtime,
    auth::Principal,
    cache::{CacheResult, FieldCache},
};
use schema::Field;
use serde_json::Value;
use tracing::Instrument;

use crate::{ResolvedValue, context::ResolutionContext};

/// Deterministic key of a field resolution: field identity, parent entity, effective arguments
/// and, for private caches, the principal.
pub(crate) fn key(field: &Field, parent: Option<&Entity>, arguments: &Arguments, principal: Option<&Principal>) -> String {
    let mut hasher = blake3::Hasher::new();

    hasher.update(field.qualified_name().as_bytes());
    hasher.update(&[0]);

    if let Some(parent) = parent {
        hasher.update(parent.model.as_bytes());
        hasher.update(&[0]);
        hasher.update(parent.key_string().as_bytes());
    }
    hasher.update(&[0]);

    let mut canonical = Vec::new();
    write_canonical(&mut canonical, &Value::Object(arguments.clone()));
    hasher.update(&canonical);
    hasher.update(&[0]);

    if let Some(principal) = principal {
        hasher.update(principal.id.as_bytes());
    }

    format!("field.{}", hasher.finalize().to_hex())
}

/// JSON with object keys sorted, so argument order doesn't change the key.
fn write_canonical(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Object(object) => {
            let mut entries = object.iter().collect::<Vec<_>>();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

            out.push(b'{');
            for (i, (name, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(out, &Value::String(name.clone()));
                out.push(b':');
                write_canonical(out, value);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(out, item);
            }
            out.push(b']');
        }
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}

/// Outcome of a cache lookup for one field resolution.
pub(crate) enum Lookup {
    /// No cache directive, caching disabled or a private cache without principal.
    Bypass,
    Hit(ResolvedValue),
    Miss { key: String, ttl: Option<Duration> },
}

/// Serves the field from the cache when its `cache` directive allows it, otherwise awaits
/// `value_fut` and stores its output. Cache failures are logged and treated as misses.
pub(crate) async fn cached<R, F>(
    ctx: ResolutionContext<'_, R>,
    arguments: &Arguments,
    value_fut: F,
) -> Result<ResolvedValue, FieldError>
where
    R: Runtime,
    F: Future<Output = Result<ResolvedValue, FieldError>>,
{
    match lookup(ctx, arguments).await {
        Lookup::Bypass => value_fut.await,
        Lookup::Hit(value) => Ok(value),
        Lookup::Miss { key, ttl } => {
            let value = value_fut.await?;
            store(ctx, &key, ttl, &value).await;
            Ok(value)
        }
    }
}

pub(crate) async fn lookup<R: Runtime>(ctx: ResolutionContext<'_, R>, arguments: &Arguments) -> Lookup {
    let Some(directive) = ctx.field.cache() else {
        return Lookup::Bypass;
    };

    let config = &ctx.config().cache;
    if !config.enabled {
        return Lookup::Bypass;
    }

    let principal = match (directive.private, ctx.principal()) {
        (false, _) => None,
        (true, Some(principal)) => Some(principal),
        (true, None) => {
            tracing::debug!("Cache BYPASS - {} is private and the request is anonymous", ctx.field.qualified_name());
            return Lookup::Bypass;
        }
    };

    let key = key(ctx.field, ctx.parent, arguments, principal);

    let cached_value = read(ctx.runtime().field_cache(), &key)
        .instrument(tracing::info_span!("cache_get"))
        .await
        .unwrap_or_else(|err| {
            tracing::warn!("Error loading {} from cache: {}", key, err);
            None
        });

    match cached_value {
        Some(value) => {
            tracing::info!("Cache HIT - {}", key);
            Lookup::Hit(value)
        }
        None => {
            tracing::info!("Cache MISS - {}", key);
            let ttl = directive.max_age.map(Duration::from_secs).or(config.default_ttl);
            Lookup::Miss { key, ttl }
        }
    }
}

pub(crate) async fn store<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    key: &str,
    ttl: Option<Duration>,
    value: &ResolvedValue,
) {
    if let Err(err) = write(ctx.runtime().field_cache(), key, ttl, value)
        .instrument(tracing::info_span!("cache_put"))
        .await
    {
        tracing::error!("Error cache PUT {}: {}", key, err);
    }
}

async fn read(cache: &impl FieldCache, key: &str) -> CacheResult<Option<ResolvedValue>> {
    match cache.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

async fn write(cache: &impl FieldCache, key: &str, ttl: Option<Duration>, value: &ResolvedValue) -> CacheResult<()> {
    let bytes = serde_json::to_vec(value)?;
    cache.put(key, bytes, ttl).await
}

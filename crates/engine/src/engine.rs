mod runtime;

use std::{future::Future, sync::Arc, time::Duration};

use ::runtime::{Arguments, Entity};
use error::{ErrorPath, FieldError};
use futures::future::join_all;
use schema::{Field, FieldId, ResolverDefinition, Schema, SchemaError};
use tracing::Instrument;

pub(crate) use runtime::*;

pub use runtime::Runtime;

use crate::{
    CustomResolvers, RequestContext, ResolvedValue, arguments, authorization, broadcast, cache, constraints,
    context::ResolutionContext, resolver,
};

pub struct Engine<R: Runtime> {
    pub(crate) schema: Arc<Schema>,
    pub runtime: R,
    pub(crate) custom: CustomResolvers,
}

impl<R: Runtime> Engine<R> {
    /// Fails when a custom directive of the schema refers to a function `custom` doesn't have.
    pub fn new(schema: Arc<Schema>, runtime: R, custom: CustomResolvers) -> Result<Self, SchemaError> {
        custom.validate(&schema)?;

        Ok(Self {
            schema,
            runtime,
            custom,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolves one field for one parent. Errors carry the field name as path.
    pub async fn resolve(
        &self,
        field: FieldId,
        parent: Option<&Entity>,
        arguments: Arguments,
        request: &RequestContext,
    ) -> Result<ResolvedValue, FieldError> {
        let field = &self.schema[field];
        let ctx = ResolutionContext {
            engine: self,
            field,
            request,
            parent,
        };

        let span = tracing::info_span!("resolve", field = %field.qualified_name());
        self.with_deadline(request, pipeline(ctx, arguments))
            .instrument(span)
            .await
            .map_err(|err| err.with_default_path(field.name()))
            .inspect_err(|err| log_error(field, err))
    }

    /// Resolves one field for every parent of a sibling set, in parent order. Relation fields
    /// share a single data store call for all parents, other fields are resolved concurrently.
    /// Errors carry `[index, field]` as path.
    pub async fn resolve_batch(
        &self,
        field: FieldId,
        parents: &[Entity],
        arguments: Arguments,
        request: &RequestContext,
    ) -> Vec<Result<ResolvedValue, FieldError>> {
        let field = &self.schema[field];
        let ctx = ResolutionContext {
            engine: self,
            field,
            request,
            parent: None,
        };

        let span = tracing::info_span!("resolve_batch", field = %field.qualified_name(), parents = parents.len());

        let results = match field.resolver() {
            ResolverDefinition::Relation(relation) => {
                let batch = async {
                    authorization::authorize(ctx, &arguments)
                        .instrument(tracing::info_span!("authorize"))
                        .await?;

                    let arguments = arguments::prepare(ctx, arguments.clone())
                        .instrument(tracing::info_span!("transform_arguments"))
                        .await?;

                    Ok::<_, FieldError>(
                        resolver::resolve_relation_batch(ctx, relation, parents, &arguments)
                            .instrument(tracing::info_span!("resolver"))
                            .await,
                    )
                };

                match self.with_deadline(request, batch).instrument(span).await {
                    Ok(results) => results,
                    Err(err) => vec![Err(err); parents.len()],
                }
            }
            _ => {
                join_all(parents.iter().map(|parent| {
                    self.with_deadline(request, pipeline(ctx.with_parent(Some(parent)), arguments.clone()))
                }))
                .instrument(span)
                .await
            }
        };

        results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result
                    .map_err(|err| err.with_default_path(ErrorPath::default().child(index).child(field.name())))
                    .inspect_err(|err| log_error(field, err))
            })
            .collect()
    }

    /// Resolves sibling fields of the same parent concurrently. A failing field never affects
    /// the others.
    pub async fn resolve_siblings(
        &self,
        parent: Option<&Entity>,
        fields: impl IntoIterator<Item = (FieldId, Arguments)>,
        request: &RequestContext,
    ) -> Vec<Result<ResolvedValue, FieldError>> {
        join_all(
            fields
                .into_iter()
                .map(|(field, arguments)| self.resolve(field, parent, arguments, request)),
        )
        .await
    }

    /// Bounds `fut` by the request deadline and the configured request timeout, whichever is
    /// sooner.
    async fn with_deadline<T>(
        &self,
        request: &RequestContext,
        fut: impl Future<Output = Result<T, FieldError>>,
    ) -> Result<T, FieldError> {
        let timeout = match (request.remaining(), self.schema.config().request.timeout) {
            (Some(remaining), Some(timeout)) => Some(remaining.min(timeout)),
            (remaining, timeout) => remaining.or(timeout),
        };

        let Some(timeout) = timeout else {
            return fut.await;
        };

        if timeout == Duration::ZERO {
            tracing::debug!("Request deadline already passed");
            return Err(FieldError::request_timeout());
        }

        self.runtime
            .with_timeout(timeout, fut)
            .await
            .unwrap_or_else(|| Err(FieldError::request_timeout()))
    }
}

fn log_error(field: &Field, err: &FieldError) {
    if err.code.is_client_error() {
        tracing::debug!("Field {} failed with {}: {}", field.qualified_name(), err.code, err.message);
    } else {
        tracing::warn!("Field {} failed with {}: {}", field.qualified_name(), err.code, err.message);
    }
}

/// Authorization, argument transforms, constraints, cache and strategy, strictly in this order.
async fn pipeline<R: Runtime>(ctx: ResolutionContext<'_, R>, arguments: Arguments) -> Result<ResolvedValue, FieldError> {
    authorization::authorize(ctx, &arguments)
        .instrument(tracing::info_span!("authorize"))
        .await?;

    let arguments = arguments::prepare(ctx, arguments)
        .instrument(tracing::info_span!("transform_arguments"))
        .await?;

    let plan = match ctx.field.resolver() {
        ResolverDefinition::Fetch(fetch) => Some(constraints::build(ctx, fetch, &arguments)?),
        _ => None,
    };

    let value = cache::cached(ctx, &arguments, resolver::dispatch(ctx, &arguments, plan))
        .instrument(tracing::info_span!("resolver"))
        .await?;

    if matches!(ctx.field.resolver(), ResolverDefinition::Mutate(_)) {
        broadcast::publish(ctx, &value).await;
    }

    Ok(value)
}

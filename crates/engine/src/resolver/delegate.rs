use error::FieldError;
use runtime::{Arguments, Runtime};

use crate::{CustomContext, ResolvedValue, context::ResolutionContext, custom::CustomResolverFn};

pub(super) async fn resolve_field<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    resolver: &str,
    arguments: &Arguments,
) -> Result<ResolvedValue, FieldError> {
    match ctx.custom().get_field(resolver) {
        Some(function) => call(ctx, function, arguments).await,
        None => Err(unregistered(ctx, resolver)),
    }
}

pub(super) async fn resolve_method<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    name: &str,
    arguments: &Arguments,
) -> Result<ResolvedValue, FieldError> {
    match ctx.custom().get_method(ctx.field.parent_type(), name) {
        Some(function) => call(ctx, function, arguments).await,
        None => Err(unregistered(ctx, name)),
    }
}

async fn call<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    function: &CustomResolverFn,
    arguments: &Arguments,
) -> Result<ResolvedValue, FieldError> {
    let context = CustomContext {
        parent: ctx.parent.cloned(),
        arguments: arguments.clone(),
        principal: ctx.principal().cloned(),
        values: ctx.request.values().clone(),
    };

    function(context)
        .await
        .map(ResolvedValue::Json)
        .map_err(|err| err.with_extension("field", ctx.field.qualified_name()))
}

// Registries are checked when the engine is built, so this only happens on a misconfigured engine.
fn unregistered<R: Runtime>(ctx: ResolutionContext<'_, R>, name: &str) -> FieldError {
    tracing::error!("No custom resolver '{name}' registered for {}", ctx.field.qualified_name());
    FieldError::internal_server_error()
}

use runtime::{Runtime, broadcast::Broadcaster};

use crate::{ResolvedValue, context::ResolutionContext};

/// Publishes a successful mutation result to every subscription the field broadcasts to.
/// Failures are logged, the mutation already happened.
pub(crate) async fn publish<R: Runtime>(ctx: ResolutionContext<'_, R>, value: &ResolvedValue) {
    let mut broadcasts = ctx.field.broadcasts().peekable();
    if broadcasts.peek().is_none() {
        return;
    }

    let payload = match serde_json::to_value(value) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!("Could not serialize the result of {} for broadcasting: {err}", ctx.field.qualified_name());
            return;
        }
    };

    for broadcast in broadcasts {
        tracing::debug!("Broadcasting {} to {}", ctx.field.qualified_name(), broadcast.subscription);

        if let Err(err) = ctx
            .runtime()
            .broadcaster()
            .broadcast(&broadcast.subscription, payload.clone(), broadcast.should_queue)
            .await
        {
            tracing::error!("Broadcast to {} failed: {err:#}", broadcast.subscription);
        }
    }
}

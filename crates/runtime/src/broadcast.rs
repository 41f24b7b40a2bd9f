use std::future::Future;

use serde_json::Value;

/// Publishes mutation results to subscription channels.
pub trait Broadcaster: Send + Sync + 'static {
    fn broadcast(
        &self,
        subscription: &str,
        payload: Value,
        should_queue: bool,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

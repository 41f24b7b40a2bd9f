use std::sync::Mutex;

use runtime::broadcast::Broadcaster;
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub subscription: String,
    pub payload: Value,
    pub queued: bool,
}

/// Keeps every published message and forwards it to live subscribers.
pub struct InMemoryBroadcaster {
    published: Mutex<Vec<Published>>,
    sender: broadcast::Sender<Published>,
    failure: Option<String>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        InMemoryBroadcaster {
            published: Mutex::new(Vec::new()),
            sender,
            failure: None,
        }
    }

    /// A broadcaster rejecting every message.
    pub fn failing(message: impl Into<String>) -> Self {
        InMemoryBroadcaster {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.sender.subscribe()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published
            .lock()
            .map(|published| published.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for InMemoryBroadcaster {
    async fn broadcast(&self, subscription: &str, payload: Value, should_queue: bool) -> anyhow::Result<()> {
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }

        let message = Published {
            subscription: subscription.to_string(),
            payload,
            queued: should_queue,
        };

        self.published
            .lock()
            .map_err(|_| anyhow::anyhow!("broadcast log poisoned"))?
            .push(message.clone());

        // No live subscriber is not an error.
        let _ = self.sender.send(message);

        Ok(())
    }
}

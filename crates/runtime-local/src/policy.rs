use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use runtime::auth::{AuthorizationTarget, Authorizer, Principal};
use serde_json::Value;

pub type Policy = Arc<dyn Fn(Option<&Principal>, AuthorizationTarget<'_>, &[Value]) -> bool + Send + Sync>;

/// Policies registered per `(model, ability)`, with model independent fallbacks. Abilities
/// without any policy are denied.
#[derive(Default)]
pub struct PolicyRegistry {
    policies: HashMap<(Option<String>, String), Policy>,
    checks: AtomicUsize,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn policy<F>(mut self, model: impl Into<String>, ability: impl Into<String>, policy: F) -> Self
    where
        F: Fn(Option<&Principal>, AuthorizationTarget<'_>, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.policies
            .insert((Some(model.into()), ability.into()), Arc::new(policy));
        self
    }

    /// Applies to every model without a policy of its own for `ability`.
    #[must_use]
    pub fn fallback<F>(mut self, ability: impl Into<String>, policy: F) -> Self
    where
        F: Fn(Option<&Principal>, AuthorizationTarget<'_>, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.policies.insert((None, ability.into()), Arc::new(policy));
        self
    }

    /// Number of checks performed so far.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::Relaxed)
    }

    fn find(&self, model: Option<&str>, ability: &str) -> Option<&Policy> {
        model
            .and_then(|model| self.policies.get(&(Some(model.to_string()), ability.to_string())))
            .or_else(|| self.policies.get(&(None, ability.to_string())))
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("policies", &self.policies.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Authorizer for PolicyRegistry {
    async fn authorize(
        &self,
        ability: &str,
        principal: Option<&Principal>,
        target: AuthorizationTarget<'_>,
        arguments: &[Value],
    ) -> anyhow::Result<bool> {
        self.checks.fetch_add(1, Ordering::Relaxed);

        match self.find(target.model(), ability) {
            Some(policy) => Ok(policy(principal, target, arguments)),
            None => {
                tracing::debug!("No policy for '{ability}' on {:?}, denying", target.model());
                Ok(false)
            }
        }
    }
}

use std::time::{Duration, Instant};

use runtime::auth::Principal;
use serde_json::Value;

/// Request scoped state shared by every field of one request.
#[derive(Debug, Default, Clone)]
pub struct RequestContext {
    principal: Option<Principal>,
    values: serde_json::Map<String, Value>,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Value available to `inject` directives under `name`.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn values(&self) -> &serde_json::Map<String, Value> {
        &self.values
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it passed.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Reads a dotted path: `principal.id`, `principal.guard`, `principal.claims.<path>` or a
    /// request value. Missing values are `Null`.
    pub fn lookup(&self, path: &str) -> Value {
        let segments = path.split('.').collect::<Vec<_>>();
        match segments.as_slice() {
            ["principal", rest @ ..] => {
                let Some(principal) = &self.principal else {
                    return Value::Null;
                };
                match rest {
                    ["id"] => Value::String(principal.id.clone()),
                    ["guard"] => Value::String(principal.guard.clone()),
                    ["claims", claims @ ..] => principal.get_claim_with_path(claims).clone(),
                    _ => Value::Null,
                }
            }
            [root, rest @ ..] => {
                let parent = self.values.get(*root).unwrap_or(&Value::Null);
                rest.iter()
                    .try_fold(parent, |parent, key| parent.as_object()?.get(*key))
                    .cloned()
                    .unwrap_or(Value::Null)
            }
            [] => Value::Null,
        }
    }
}

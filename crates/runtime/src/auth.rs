use std::future::Future;

use serde_json::Value;

use crate::Entity;

/// The authenticated actor of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: String,
    /// Authentication guard which authenticated the principal, e.g. `api` or `web`.
    pub guard: String,
    /// Claims can be empty.
    pub claims: serde_json::Map<String, Value>,
}

impl Principal {
    pub fn new(id: impl Into<String>, guard: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            guard: guard.into(),
            claims: Default::default(),
        }
    }

    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn get_claim(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    pub fn get_claim_with_path(&self, path: &[&str]) -> &Value {
        let mut path = path.iter();
        let Some(root) = path.next() else {
            return &Value::Null;
        };
        let parent = self.get_claim(root).unwrap_or(&Value::Null);
        path.fold(parent, |parent, key| {
            if let Some(object) = parent.as_object() {
                object.get(*key).unwrap_or(&Value::Null)
            } else {
                &Value::Null
            }
        })
    }
}

/// What a policy is asked about.
#[derive(Debug, Clone, Copy)]
pub enum AuthorizationTarget<'a> {
    None,
    Model(&'a str),
    Entity(&'a Entity),
}

impl AuthorizationTarget<'_> {
    pub fn model(&self) -> Option<&str> {
        match self {
            AuthorizationTarget::None => None,
            AuthorizationTarget::Model(model) => Some(model),
            AuthorizationTarget::Entity(entity) => Some(&entity.model),
        }
    }
}

/// Policy checks. A missing principal is not a denial by itself, policies decide whether guests
/// are allowed.
pub trait Authorizer: Send + Sync + 'static {
    fn authorize(
        &self,
        ability: &str,
        principal: Option<&Principal>,
        target: AuthorizationTarget<'_>,
        arguments: &[Value],
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

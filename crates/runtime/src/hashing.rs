use std::future::Future;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Hashing failed: {0}")]
pub struct HashingError(pub String);

/// One-way salted hashing of secrets before they reach the data store.
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, plaintext: &str) -> impl Future<Output = Result<String, HashingError>> + Send;
}

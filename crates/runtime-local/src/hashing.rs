use runtime::hashing::{HashingError, PasswordHasher};

/// bcrypt with a fixed cost. Every hash gets a fresh salt.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        BcryptHasher { cost }
    }

    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        BcryptHasher::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        let (plaintext, cost) = (plaintext.to_owned(), self.cost);

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|err| HashingError(err.to_string()))?
            .map_err(|err| HashingError(err.to_string()))
    }
}

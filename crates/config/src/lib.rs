mod cache;
mod hashing;
mod pagination;
mod request;
mod schema;

pub use cache::CacheConfig;
pub use hashing::HashingConfig;
pub use pagination::PaginationConfig;
pub use request::RequestConfig;
pub use schema::SchemaConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The configuration record threaded through schema build and engine construction.
#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub schema: SchemaConfig,
    pub pagination: PaginationConfig,
    pub cache: CacheConfig,
    pub hashing: HashingConfig,
    pub request: RequestConfig,
}

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(default_count), Some(max_count)) = (self.pagination.default_count, self.pagination.max_count) {
            if default_count > max_count {
                return Err(ConfigError::Invalid(format!(
                    "pagination.default_count ({default_count}) must not exceed pagination.max_count ({max_count})"
                )));
            }
        }

        if !(bcrypt_cost::MIN..=bcrypt_cost::MAX).contains(&self.hashing.cost) {
            return Err(ConfigError::Invalid(format!(
                "hashing.cost must be between {} and {}, got {}",
                bcrypt_cost::MIN,
                bcrypt_cost::MAX,
                self.hashing.cost
            )));
        }

        Ok(())
    }
}

mod bcrypt_cost {
    pub const MIN: u32 = 4;
    pub const MAX: u32 = 31;
}

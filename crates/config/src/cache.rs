use std::time::Duration;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// TTL applied to `cache` directives without an explicit `max_age`. Entries are kept forever
    /// when both are absent.
    #[serde(deserialize_with = "duration_str::deserialize_option_duration")]
    pub default_ttl: Option<Duration>,
    /// Maximum number of entries kept by the in-memory store.
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: None,
            capacity: 10_000,
        }
    }
}

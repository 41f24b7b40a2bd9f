use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Deadline applied to requests that don't carry their own.
    #[serde(deserialize_with = "duration_str::deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

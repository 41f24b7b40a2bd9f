#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashingConfig {
    /// bcrypt work factor.
    pub cost: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self { cost: 10 }
    }
}

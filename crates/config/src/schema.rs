#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Root fields without a resolver directive fail the schema build instead of resolving to
    /// null.
    pub strict: bool,
}

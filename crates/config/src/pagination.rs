#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size used when neither the client nor the directive provides one.
    pub default_count: Option<usize>,
    /// Upper bound on the page size a client can request. Directives may lower it.
    pub max_count: Option<usize>,
}

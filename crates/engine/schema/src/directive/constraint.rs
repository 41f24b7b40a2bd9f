/// Argument directives turning the argument value into query plan constraints. `key` is the
/// column and defaults to the argument name.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryConstraint {
    Eq {
        #[serde(default)]
        key: Option<String>,
    },
    Neq {
        #[serde(default)]
        key: Option<String>,
    },
    In {
        #[serde(default)]
        key: Option<String>,
    },
    NotIn {
        #[serde(default)]
        key: Option<String>,
    },
    Where {
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        operator: Operator,
    },
    WhereBetween {
        #[serde(default)]
        key: Option<String>,
    },
    WhereNotBetween {
        #[serde(default)]
        key: Option<String>,
    },
    /// Client supplied `{ column, operator, value, AND, OR, NOT }` trees.
    WhereConditions {
        /// Allowed columns, any column when empty.
        #[serde(default)]
        columns: Vec<String>,
    },
    /// A list of `{ column, order }` pairs, the first one being the primary sort key.
    OrderBy {
        /// Allowed columns, any column when empty.
        #[serde(default)]
        columns: Vec<String>,
    },
    Search {
        /// Name of the search index.
        #[serde(default)]
        within: Option<String>,
        /// Columns covered by the search. Structured filters on them are dropped from the plan.
        #[serde(default)]
        columns: Vec<String>,
    },
    /// Applies a named data store scope when the argument is truthy.
    Scope { name: String },
}

impl QueryConstraint {
    pub fn name(&self) -> &'static str {
        match self {
            QueryConstraint::Eq { .. } => "eq",
            QueryConstraint::Neq { .. } => "neq",
            QueryConstraint::In { .. } => "in",
            QueryConstraint::NotIn { .. } => "notIn",
            QueryConstraint::Where { .. } => "where",
            QueryConstraint::WhereBetween { .. } => "whereBetween",
            QueryConstraint::WhereNotBetween { .. } => "whereNotBetween",
            QueryConstraint::WhereConditions { .. } => "whereConditions",
            QueryConstraint::OrderBy { .. } => "orderBy",
            QueryConstraint::Search { .. } => "search",
            QueryConstraint::Scope { .. } => "scope",
        }
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Operator {
    #[default]
    #[serde(rename = "=", alias = "EQ")]
    #[strum(to_string = "=", serialize = "EQ")]
    Eq,
    #[serde(rename = "!=", alias = "<>", alias = "NEQ")]
    #[strum(to_string = "!=", serialize = "<>", serialize = "NEQ")]
    Neq,
    #[serde(rename = ">", alias = "GT")]
    #[strum(to_string = ">", serialize = "GT")]
    Gt,
    #[serde(rename = ">=", alias = "GTE")]
    #[strum(to_string = ">=", serialize = "GTE")]
    Gte,
    #[serde(rename = "<", alias = "LT")]
    #[strum(to_string = "<", serialize = "LT")]
    Lt,
    #[serde(rename = "<=", alias = "LTE")]
    #[strum(to_string = "<=", serialize = "LTE")]
    Lte,
    #[serde(rename = "like", alias = "LIKE")]
    #[strum(to_string = "like", serialize = "LIKE")]
    Like,
    #[serde(rename = "not like", alias = "NOT_LIKE")]
    #[strum(to_string = "not like", serialize = "NOT_LIKE")]
    NotLike,
}

//! The abstract instruction list handed to the data store.

use schema::Operator;
use serde_json::Value;

/// Ordered, append-only list of constraints for one field resolution. The strategy consuming it
/// is the only reader.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryPlan {
    model: String,
    constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    Filter(Predicate),
    Sort(Sort),
    Search(Search),
    Scope(String),
    EagerLoad(String),
    Window(Window),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
    Compare {
        column: String,
        operator: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Search {
    pub query: String,
    /// Named search index, the model's default one when absent.
    pub index: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

impl QueryPlan {
    pub fn new(model: impl Into<String>) -> Self {
        QueryPlan {
            model: model.into(),
            constraints: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn filters(&self) -> impl Iterator<Item = &Predicate> + '_ {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Constraint::Filter(predicate) => Some(predicate),
            _ => None,
        })
    }

    pub fn sorts(&self) -> impl Iterator<Item = &Sort> + '_ {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Constraint::Sort(sort) => Some(sort),
            _ => None,
        })
    }

    pub fn search(&self) -> Option<&Search> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::Search(search) => Some(search),
            _ => None,
        })
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> + '_ {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Constraint::Scope(scope) => Some(scope.as_str()),
            _ => None,
        })
    }

    pub fn eager_loads(&self) -> impl Iterator<Item = &str> + '_ {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Constraint::EagerLoad(relation) => Some(relation.as_str()),
            _ => None,
        })
    }

    /// The last window wins.
    pub fn window(&self) -> Option<Window> {
        self.constraints.iter().rev().find_map(|constraint| match constraint {
            Constraint::Window(window) => Some(*window),
            _ => None,
        })
    }
}

impl Predicate {
    pub fn compare(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Predicate::Compare {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Whether any leaf of the predicate tree filters on `column`.
    pub fn references(&self, column: &str) -> bool {
        match self {
            Predicate::Compare { column: c, .. } | Predicate::In { column: c, .. } | Predicate::Between { column: c, .. } => {
                c == column
            }
            Predicate::And(predicates) | Predicate::Or(predicates) => {
                predicates.iter().any(|predicate| predicate.references(column))
            }
            Predicate::Not(predicate) => predicate.references(column),
        }
    }
}

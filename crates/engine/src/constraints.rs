//! Turns the arguments of a read field into a [`QueryPlan`]. Nothing is executed here.

use std::str::FromStr;

use error::FieldError;
use runtime::{
    Arguments, Runtime,
    plan::{Constraint, Predicate, QueryPlan, Search, Sort, SortDirection},
};
use schema::{Custom, Directive, FetchDirective, Operator, QueryConstraint};
use serde_json::Value;

use crate::{arguments::output_key, context::ResolutionContext};

pub(crate) fn build<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    fetch: &FetchDirective,
    arguments: &Arguments,
) -> Result<QueryPlan, FieldError> {
    let mut constraints = fetch
        .scopes
        .iter()
        .map(|scope| Constraint::Scope(scope.clone()))
        .collect::<Vec<_>>();

    for definition in ctx.field.arguments() {
        let Some(value) = arguments.get(output_key(definition)).filter(|value| !value.is_null()) else {
            continue;
        };

        for directive in &definition.directives {
            match directive {
                Directive::QueryConstraint(constraint) => {
                    let column = constraint_column(constraint, output_key(definition));
                    constraints.extend(lower(constraint, column, &definition.name, value)?);
                }
                Directive::Custom(Custom::Builder { method }) => {
                    let Some(builder) = ctx.custom().get_builder(method) else {
                        return Err(FieldError::internal_server_error());
                    };
                    constraints.extend(builder(value, arguments)?);
                }
                _ => {}
            }
        }
    }

    let searched_columns = constraints
        .iter()
        .filter_map(|constraint| match constraint {
            Constraint::Search(search) => Some(search.columns.clone()),
            _ => None,
        })
        .flatten()
        .collect::<Vec<_>>();

    if !searched_columns.is_empty() {
        constraints.retain(|constraint| match constraint {
            Constraint::Filter(predicate) => !searched_columns.iter().any(|column| predicate.references(column)),
            _ => true,
        });
    }

    constraints.extend(
        ctx.field
            .eager_loads()
            .map(|relation| Constraint::EagerLoad(relation.to_string())),
    );

    let mut plan = QueryPlan::new(fetch.model.clone());
    for constraint in constraints {
        plan.push(constraint);
    }

    Ok(plan)
}

fn constraint_column<'a>(constraint: &'a QueryConstraint, default: &'a str) -> &'a str {
    match constraint {
        QueryConstraint::Eq { key }
        | QueryConstraint::Neq { key }
        | QueryConstraint::In { key }
        | QueryConstraint::NotIn { key }
        | QueryConstraint::Where { key, .. }
        | QueryConstraint::WhereBetween { key }
        | QueryConstraint::WhereNotBetween { key } => key.as_deref().unwrap_or(default),
        _ => default,
    }
}

fn lower(
    constraint: &QueryConstraint,
    column: &str,
    argument: &str,
    value: &Value,
) -> Result<Vec<Constraint>, FieldError> {
    let filter = |predicate: Predicate| -> Result<Vec<Constraint>, FieldError> { Ok(vec![Constraint::Filter(predicate)]) };

    match constraint {
        QueryConstraint::Eq { .. } => filter(Predicate::compare(column, Operator::Eq, value.clone())),
        QueryConstraint::Neq { .. } => filter(Predicate::compare(column, Operator::Neq, value.clone())),
        QueryConstraint::Where { operator, .. } => filter(Predicate::compare(column, *operator, value.clone())),
        QueryConstraint::In { .. } | QueryConstraint::NotIn { .. } => filter(Predicate::In {
            column: column.to_string(),
            values: match value {
                Value::Array(values) => values.clone(),
                value => vec![value.clone()],
            },
            negated: matches!(constraint, QueryConstraint::NotIn { .. }),
        }),
        QueryConstraint::WhereBetween { .. } | QueryConstraint::WhereNotBetween { .. } => {
            let (low, high) = bounds(argument, value)?;
            filter(Predicate::Between {
                column: column.to_string(),
                low,
                high,
                negated: matches!(constraint, QueryConstraint::WhereNotBetween { .. }),
            })
        }
        QueryConstraint::WhereConditions { columns } => match lower_conditions(argument, columns, value)? {
            Some(predicate) => filter(predicate),
            None => Ok(Vec::new()),
        },
        QueryConstraint::OrderBy { columns } => order_by(argument, columns, value),
        QueryConstraint::Search { within, columns } => {
            let Value::String(query) = value else {
                return Err(FieldError::invalid_argument(format!(
                    "The argument `{argument}` must be a search string."
                )));
            };
            Ok(vec![Constraint::Search(Search {
                query: query.clone(),
                index: within.clone(),
                columns: columns.clone(),
            })])
        }
        QueryConstraint::Scope { name } => Ok(if is_truthy(value) {
            vec![Constraint::Scope(name.clone())]
        } else {
            Vec::new()
        }),
    }
}

/// An input object with exactly two non-null fields, lower bound first.
fn bounds(argument: &str, value: &Value) -> Result<(Value, Value), FieldError> {
    let values: Vec<&Value> = match value {
        Value::Object(object) => object.values().collect(),
        _ => Vec::new(),
    };

    match values.as_slice() {
        [low, high] if !low.is_null() && !high.is_null() => Ok(((*low).clone(), (*high).clone())),
        _ => Err(FieldError::invalid_range_input(argument)),
    }
}

fn order_by(argument: &str, allowed: &[String], value: &Value) -> Result<Vec<Constraint>, FieldError> {
    let clauses = match value {
        Value::Array(clauses) => clauses.iter().collect::<Vec<_>>(),
        clause => vec![clause],
    };

    clauses
        .into_iter()
        .map(|clause| {
            let column = clause
                .get("column")
                .and_then(Value::as_str)
                .ok_or_else(|| FieldError::invalid_argument(format!("The argument `{argument}` requires a column.")))?;
            check_column(argument, allowed, column)?;

            let direction = match clause.get("order").and_then(Value::as_str) {
                Some(order) => SortDirection::from_str(order).map_err(|_| {
                    FieldError::invalid_argument(format!("Invalid sort order `{order}` for `{argument}`."))
                })?,
                None => SortDirection::default(),
            };

            Ok(Constraint::Sort(Sort {
                column: column.to_string(),
                direction,
            }))
        })
        .collect()
}

/// Lowers a `{ column, operator, value, AND, OR, NOT }` tree. Sibling conditions of one node are
/// joined with AND.
fn lower_conditions(argument: &str, allowed: &[String], value: &Value) -> Result<Option<Predicate>, FieldError> {
    let Value::Object(node) = value else {
        return Err(FieldError::invalid_argument(format!(
            "The argument `{argument}` must be a condition object."
        )));
    };

    let mut predicates = Vec::new();

    if let Some(column) = node.get("column").and_then(Value::as_str) {
        check_column(argument, allowed, column)?;
        let operator = node.get("operator").and_then(Value::as_str).unwrap_or("EQ");
        let value = node.get("value").cloned().unwrap_or(Value::Null);
        predicates.push(condition(argument, column, operator, value)?);
    }

    if let Some(Value::Array(children)) = node.get("AND") {
        for child in children {
            predicates.extend(lower_conditions(argument, allowed, child)?);
        }
    }

    if let Some(Value::Array(children)) = node.get("OR") {
        let children = children
            .iter()
            .filter_map(|child| lower_conditions(argument, allowed, child).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        if !children.is_empty() {
            predicates.push(Predicate::Or(children));
        }
    }

    if let Some(child) = node.get("NOT").filter(|child| !child.is_null()) {
        if let Some(predicate) = lower_conditions(argument, allowed, child)? {
            predicates.push(Predicate::Not(Box::new(predicate)));
        }
    }

    Ok(match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(Predicate::And(predicates)),
    })
}

fn condition(argument: &str, column: &str, operator: &str, value: Value) -> Result<Predicate, FieldError> {
    let predicate = match operator {
        "IN" | "NOT_IN" => Predicate::In {
            column: column.to_string(),
            values: match value {
                Value::Array(values) => values,
                value => vec![value],
            },
            negated: operator == "NOT_IN",
        },
        "BETWEEN" | "NOT_BETWEEN" => {
            let (low, high) = match value {
                Value::Array(values) if values.len() == 2 && values.iter().all(|value| !value.is_null()) => {
                    let mut values = values.into_iter();
                    (
                        values.next().unwrap_or_default(),
                        values.next().unwrap_or_default(),
                    )
                }
                _ => return Err(FieldError::invalid_range_input(argument)),
            };
            Predicate::Between {
                column: column.to_string(),
                low,
                high,
                negated: operator == "NOT_BETWEEN",
            }
        }
        operator => {
            let operator = Operator::from_str(operator)
                .map_err(|_| FieldError::invalid_argument(format!("Unknown operator `{operator}` in `{argument}`.")))?;
            Predicate::compare(column, operator, value)
        }
    };

    Ok(predicate)
}

fn check_column(argument: &str, allowed: &[String], column: &str) -> Result<(), FieldError> {
    if allowed.is_empty() || allowed.iter().any(|allowed| allowed == column) {
        Ok(())
    } else {
        Err(FieldError::invalid_argument(format!(
            "The column `{column}` is not allowed in `{argument}`."
        )))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(value) => !value.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Object(_) => true,
    }
}

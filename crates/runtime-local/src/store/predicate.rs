//! Evaluation of plan predicates against stored entities. Comparisons are loose: `1` equals
//! `"1"`, which is what decoded global ids need.

use std::{cmp::Ordering, collections::HashMap};

use regex::Regex;
use runtime::{Entity, key_to_string, plan::Predicate};
use schema::Operator;
use serde_json::Value;

/// Predicates of one scan, with their `like` patterns compiled once.
pub(super) struct Filter<'a> {
    predicates: Vec<&'a Predicate>,
    patterns: HashMap<&'a str, Option<Regex>>,
}

impl<'a> Filter<'a> {
    pub fn new(predicates: Vec<&'a Predicate>) -> Self {
        let mut patterns = HashMap::new();
        for predicate in &predicates {
            collect_patterns(predicate, &mut patterns);
        }

        Filter { predicates, patterns }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.predicates.iter().all(|predicate| self.matches_predicate(entity, predicate))
    }

    fn matches_predicate(&self, entity: &Entity, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Compare {
                column,
                operator,
                value,
            } => self.compare(column_value(entity, column), *operator, value),
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let attribute = column_value(entity, column);
                values.iter().any(|value| loose_eq(attribute, value)) != *negated
            }
            Predicate::Between {
                column,
                low,
                high,
                negated,
            } => {
                let attribute = column_value(entity, column);
                let within = !attribute.is_null()
                    && order(attribute, low).is_some_and(Ordering::is_ge)
                    && order(attribute, high).is_some_and(Ordering::is_le);
                within != *negated
            }
            Predicate::And(predicates) => predicates
                .iter()
                .all(|predicate| self.matches_predicate(entity, predicate)),
            Predicate::Or(predicates) => predicates
                .iter()
                .any(|predicate| self.matches_predicate(entity, predicate)),
            Predicate::Not(predicate) => !self.matches_predicate(entity, predicate),
        }
    }

    fn compare(&self, attribute: &Value, operator: Operator, value: &Value) -> bool {
        match operator {
            Operator::Eq => loose_eq(attribute, value),
            Operator::Neq => !loose_eq(attribute, value),
            Operator::Gt => order(attribute, value).is_some_and(Ordering::is_gt),
            Operator::Gte => order(attribute, value).is_some_and(Ordering::is_ge),
            Operator::Lt => order(attribute, value).is_some_and(Ordering::is_lt),
            Operator::Lte => order(attribute, value).is_some_and(Ordering::is_le),
            Operator::Like => self.like(attribute, value),
            Operator::NotLike => !attribute.is_null() && !self.like(attribute, value),
        }
    }

    fn like(&self, attribute: &Value, pattern: &Value) -> bool {
        if attribute.is_null() {
            return false;
        }

        pattern
            .as_str()
            .and_then(|pattern| self.patterns.get(pattern)?.as_ref())
            .is_some_and(|regex| regex.is_match(&key_to_string(attribute)))
    }
}

fn collect_patterns<'a>(predicate: &'a Predicate, patterns: &mut HashMap<&'a str, Option<Regex>>) {
    match predicate {
        Predicate::Compare {
            operator: Operator::Like | Operator::NotLike,
            value: Value::String(pattern),
            ..
        } => {
            patterns
                .entry(pattern.as_str())
                .or_insert_with(|| like_regex(pattern));
        }
        Predicate::And(predicates) | Predicate::Or(predicates) => {
            for predicate in predicates {
                collect_patterns(predicate, patterns);
            }
        }
        Predicate::Not(predicate) => collect_patterns(predicate, patterns),
        _ => {}
    }
}

fn column_value<'a>(entity: &'a Entity, column: &str) -> &'a Value {
    entity.attribute(column).unwrap_or(&Value::Null)
}

pub(super) fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => a == b,
        (a, b) => key_to_string(a) == key_to_string(b),
    }
}

/// Ordering of two values of the same kind, `None` when they can't be compared.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.parse().ok()?),
        (Value::String(a), Value::Number(b)) => a.parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        _ => None,
    }
}

/// Total order used for sorting: nulls first, then numbers, strings and the rest.
pub(super) fn sort_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => order(a, b).unwrap_or_else(|| a.to_string().cmp(&b.to_string())),
        ordering => ordering,
    }
}

/// SQL `LIKE`, case insensitive: `%` matches any sequence, `_` a single character.
fn like_regex(pattern: &str) -> Option<Regex> {
    let mut expression = String::from("(?is)^");
    for c in pattern.chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            c => expression.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    expression.push('$');

    Regex::new(&expression).ok()
}

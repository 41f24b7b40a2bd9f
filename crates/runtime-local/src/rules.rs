use std::sync::LazyLock;

use regex::Regex;
use runtime::rules::RuleEvaluator;
use schema::Rule;
use serde_json::Value;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Evaluates the common validation rules: `required`, `filled`, `nullable`, `present`,
/// `accepted`, `string`, `integer`, `numeric`, `boolean`, `array`, `email`, `min`, `max`, `size`,
/// `between`, `in`, `not_in`, `regex` and `alpha_num`.
///
/// Sizes are character counts for strings, element counts for lists and the value itself for
/// numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRuleEvaluator;

impl RuleEvaluator for LocalRuleEvaluator {
    async fn evaluate(&self, rule: &Rule, attribute: &str, value: &Value) -> Option<String> {
        let passes = match rule.name.as_str() {
            "required" => !is_empty(value),
            "filled" => !is_empty(value),
            "nullable" | "present" => true,
            "accepted" => {
                matches!(value, Value::Bool(true))
                    || matches!(value.as_str(), Some("yes" | "on" | "1" | "true"))
                    || value.as_i64() == Some(1)
            }
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "numeric" => value.is_number() || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok()),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "email" => value
                .as_str()
                .is_some_and(|s| EMAIL.as_ref().is_some_and(|email| email.is_match(s))),
            "min" => compare(value, rule.parameter(0), |size, bound| size >= bound),
            "max" => compare(value, rule.parameter(0), |size, bound| size <= bound),
            "size" => compare(value, rule.parameter(0), |size, bound| size == bound),
            "between" => {
                compare(value, rule.parameter(0), |size, bound| size >= bound)
                    && compare(value, rule.parameter(1), |size, bound| size <= bound)
            }
            "in" => scalar(value).is_some_and(|value| rule.parameters.contains(&value)),
            "not_in" => scalar(value).is_none_or(|value| !rule.parameters.contains(&value)),
            "regex" => match (value.as_str(), rule.parameter(0).map(Regex::new)) {
                (Some(value), Some(Ok(regex))) => regex.is_match(value),
                (_, Some(Err(err))) => {
                    tracing::warn!("Invalid pattern in rule {rule}: {err}");
                    false
                }
                _ => false,
            },
            "alpha_num" => value
                .as_str()
                .is_some_and(|s| s.chars().all(char::is_alphanumeric)),
            _ => {
                tracing::warn!("Unknown validation rule '{}'", rule.name);
                return Some(format!("The {attribute} field has an unknown validation rule {}.", rule.name));
            }
        };

        (!passes).then(|| message(rule, attribute, value))
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Measure of the value `min`, `max`, `size` and `between` compare against.
fn size(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

fn compare(value: &Value, bound: Option<&str>, op: impl Fn(f64, f64) -> bool) -> bool {
    match (size(value), bound.and_then(|bound| bound.parse::<f64>().ok())) {
        (Some(size), Some(bound)) => op(size, bound),
        _ => false,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn message(rule: &Rule, attribute: &str, value: &Value) -> String {
    let unit = match value {
        Value::String(_) => " characters",
        Value::Array(_) => " items",
        _ => "",
    };
    let p0 = rule.parameter(0).unwrap_or_default();
    let p1 = rule.parameter(1).unwrap_or_default();

    match rule.name.as_str() {
        "required" => format!("The {attribute} field is required."),
        "filled" => format!("The {attribute} field must have a value."),
        "accepted" => format!("The {attribute} field must be accepted."),
        "string" => format!("The {attribute} field must be a string."),
        "integer" => format!("The {attribute} field must be an integer."),
        "numeric" => format!("The {attribute} field must be a number."),
        "boolean" => format!("The {attribute} field must be true or false."),
        "array" => format!("The {attribute} field must be an array."),
        "email" => format!("The {attribute} field must be a valid email address."),
        "min" => format!("The {attribute} field must be at least {p0}{unit}."),
        "max" => format!("The {attribute} field must not be greater than {p0}{unit}."),
        "size" => format!("The {attribute} field must be {p0}{unit}."),
        "between" => format!("The {attribute} field must be between {p0} and {p1}{unit}."),
        "in" | "not_in" => format!("The selected {attribute} is invalid."),
        "regex" => format!("The {attribute} field format is invalid."),
        "alpha_num" => format!("The {attribute} field must only contain letters and numbers."),
        _ => format!("The {attribute} field is invalid."),
    }
}

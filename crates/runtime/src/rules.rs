use std::future::Future;

use schema::Rule;
use serde_json::Value;

/// Evaluates a single validation rule. `value` is `Null` for absent arguments.
///
/// Returns the failure message, `None` when the value passes. `attribute` is the dotted path of
/// the value, only meant for messages.
pub trait RuleEvaluator: Send + Sync + 'static {
    fn evaluate(&self, rule: &Rule, attribute: &str, value: &Value) -> impl Future<Output = Option<String>> + Send;
}

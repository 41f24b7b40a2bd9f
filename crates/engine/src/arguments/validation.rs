use error::FieldError;
use indexmap::IndexMap;
use runtime::{Arguments, Runtime, rules::RuleEvaluator};
use schema::{Directive, InputValueDefinition, Rule, RulesDirective, Validate};
use serde_json::Value;

use crate::context::ResolutionContext;

/// Rules applied even when the value is absent.
const IMPLICIT_RULES: &[&str] = &["required", "present", "accepted"];

struct Check<'a> {
    attribute: String,
    rules: &'a RulesDirective,
    value: Option<&'a Value>,
}

/// Evaluates every validation rule and aggregates all failures into a single error.
pub(super) async fn validate<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    definitions: &[InputValueDefinition],
    arguments: &Arguments,
) -> Result<(), FieldError> {
    let mut checks = Vec::new();
    collect(definitions, Some(arguments), "", &mut checks);

    if checks.is_empty() {
        return Ok(());
    }

    let evaluator = ctx.runtime().rule_evaluator();
    let mut failures: IndexMap<String, Vec<String>> = IndexMap::new();

    for check in checks {
        let value = check.value.unwrap_or(&Value::Null);
        let nullable = check.rules.rules.iter().any(|rule| rule.name == "nullable");

        for rule in &check.rules.rules {
            let skip = match check.value {
                None => !IMPLICIT_RULES.contains(&rule.name.as_str()),
                Some(Value::Null) => nullable,
                Some(_) => false,
            };
            if skip {
                continue;
            }

            if let Some(message) = evaluator.evaluate(rule, &check.attribute, value).await {
                failures
                    .entry(check.attribute.clone())
                    .or_default()
                    .push(message_for(check.rules, rule, &check.attribute, message));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        tracing::debug!("Validation failed for {} attribute(s) of {}", failures.len(), ctx.field.qualified_name());
        Err(FieldError::validation(failures))
    }
}

fn message_for(rules: &RulesDirective, rule: &Rule, attribute: &str, default: String) -> String {
    match rules.messages.get(&rule.name) {
        Some(message) => message.replace(":attribute", attribute),
        None => default,
    }
}

fn collect<'a>(
    definitions: &'a [InputValueDefinition],
    arguments: Option<&'a Arguments>,
    prefix: &str,
    checks: &mut Vec<Check<'a>>,
) {
    for definition in definitions {
        let attribute = if prefix.is_empty() {
            definition.name.clone()
        } else {
            format!("{prefix}.{}", definition.name)
        };
        let value = arguments.and_then(|arguments| arguments.get(&definition.name));

        for directive in &definition.directives {
            match directive {
                Directive::Validate(Validate::Rules(rules)) => match value {
                    Some(Value::Array(items)) => {
                        for (index, item) in items.iter().enumerate() {
                            checks.push(Check {
                                attribute: format!("{attribute}.{index}"),
                                rules,
                                value: Some(item),
                            });
                        }
                    }
                    _ => checks.push(Check {
                        attribute: attribute.clone(),
                        rules,
                        value,
                    }),
                },
                Directive::Validate(Validate::RulesForArray(rules)) => checks.push(Check {
                    attribute: attribute.clone(),
                    rules,
                    value,
                }),
                _ => {}
            }
        }

        if definition.fields.is_empty() {
            continue;
        }

        match value {
            Some(Value::Object(object)) => collect(&definition.fields, Some(object), &attribute, checks),
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::Object(object) = item {
                        collect(&definition.fields, Some(object), &format!("{attribute}.{index}"), checks);
                    }
                }
            }
            _ => {}
        }
    }
}

use crate::*;

pub(super) fn validate_field(config: &Config, field: &Field) -> Result<(), SchemaError> {
    let location = field.qualified_name();
    let invalid = |directive: &Directive, message: &str| SchemaError::InvalidDirective {
        location: location.clone(),
        directive: directive.name(),
        message: message.to_string(),
    };

    let mut cache_count = 0;
    for directive in field.directives() {
        if !directive.is_allowed_on_field() {
            return Err(invalid(directive, "cannot be used on a field"));
        }

        match directive {
            Directive::ArgTransform(ArgTransform::Rename { .. } | ArgTransform::GlobalId { .. })
                if !matches!(field.resolver(), ResolverDefinition::Attribute { .. }) =>
            {
                return Err(invalid(directive, "only applies to fields resolved from a parent attribute"));
            }
            Directive::ArgTransform(ArgTransform::Inject { context, name }) => {
                if context.is_empty() || name.is_empty() {
                    return Err(invalid(directive, "requires both a context path and a target name"));
                }
            }
            Directive::Fetch(FetchDirective {
                kind: FetchKind::Paginate(options),
                ..
            }) => validate_pagination(config, options).map_err(|message| invalid(directive, &message))?,
            Directive::Mutate(mutate) => {
                if mutate.kind == MutationKind::Delete && field.definition().find_argument(&mutate.key).is_none() {
                    return Err(invalid(
                        directive,
                        &format!("the key argument '{}' is not defined", mutate.key),
                    ));
                }
                if let Some(input) = &mutate.input {
                    if field.definition().find_argument(input).is_none() {
                        return Err(invalid(directive, &format!("the input argument '{input}' is not defined")));
                    }
                }
            }
            Directive::Cache(_) => {
                cache_count += 1;
                if cache_count > 1 {
                    return Err(invalid(directive, "may only be declared once per field"));
                }
                match field.resolver() {
                    ResolverDefinition::Mutate(_) => return Err(invalid(directive, "cannot be used on a mutation")),
                    ResolverDefinition::Attribute { .. } | ResolverDefinition::Null => {
                        return Err(invalid(directive, "requires a resolver directive on the field"));
                    }
                    _ => {}
                }
            }
            Directive::Broadcast(broadcast) => {
                if !matches!(field.resolver(), ResolverDefinition::Mutate(_)) {
                    return Err(invalid(directive, "can only be used on a mutation"));
                }
                if broadcast.subscription.is_empty() {
                    return Err(invalid(directive, "requires a subscription name"));
                }
            }
            Directive::EagerLoad(eager_load) => {
                if !matches!(
                    field.resolver(),
                    ResolverDefinition::Fetch(_) | ResolverDefinition::Relation(_)
                ) {
                    return Err(invalid(directive, "requires a fetch or relation resolver on the field"));
                }
                let is_malformed = |relation: &String| relation.is_empty() || relation.split('.').any(str::is_empty);
                if eager_load.relations.is_empty() || eager_load.relations.iter().any(is_malformed) {
                    return Err(invalid(directive, "requires a list of relation paths"));
                }
            }
            Directive::Authorize(Authorize::Can(can)) => {
                if let Some(find) = &can.find {
                    if field.definition().find_argument(find).is_none() {
                        return Err(invalid(directive, &format!("the find argument '{find}' is not defined")));
                    }
                    if can.model.is_none() && field.resolver().model().is_none() {
                        return Err(invalid(directive, "requires a model to look up the entity"));
                    }
                }
            }
            _ => {}
        }
    }

    for argument in field.arguments() {
        validate_input_value(field, &format!("{location}({})", argument.name), argument, true)?;
    }

    Ok(())
}

fn validate_pagination(config: &Config, options: &PaginateOptions) -> Result<(), String> {
    let max_count = options.max_count.or(config.pagination.max_count);
    let default_count = options.default_count.or(config.pagination.default_count);

    if max_count == Some(0) {
        return Err("max_count must be at least 1".to_string());
    }
    if default_count == Some(0) {
        return Err("default_count must be at least 1".to_string());
    }
    if let (Some(default_count), Some(max_count)) = (default_count, max_count) {
        if default_count > max_count {
            return Err(format!(
                "default_count ({default_count}) must not exceed max_count ({max_count})"
            ));
        }
    }

    Ok(())
}

fn validate_input_value(
    field: &Field,
    location: &str,
    value: &InputValueDefinition,
    top_level: bool,
) -> Result<(), SchemaError> {
    let invalid = |directive: &Directive, message: &str| SchemaError::InvalidDirective {
        location: location.to_string(),
        directive: directive.name(),
        message: message.to_string(),
    };

    let mut spread_count = 0;
    for directive in &value.directives {
        if !directive.is_allowed_on_argument() {
            return Err(invalid(directive, "cannot be used on an argument"));
        }

        match directive {
            Directive::ArgTransform(ArgTransform::Spread) => {
                spread_count += 1;
                if spread_count > 1 {
                    return Err(invalid(directive, "may only be declared once per argument"));
                }
            }
            Directive::ArgTransform(ArgTransform::Rename { attribute }) if attribute.is_empty() => {
                return Err(invalid(directive, "requires a non empty attribute name"));
            }
            Directive::QueryConstraint(_) | Directive::Custom(Custom::Builder { .. }) => {
                if !top_level {
                    return Err(invalid(directive, "can only be used on top level arguments"));
                }
                if !matches!(field.resolver(), ResolverDefinition::Fetch(_)) {
                    return Err(invalid(directive, "requires a fetch resolver on the field"));
                }
            }
            Directive::Validate(Validate::Rules(rules) | Validate::RulesForArray(rules)) => {
                if let Some(rule) = rules.rules.iter().find(|rule| !rule.is_valid()) {
                    return Err(SchemaError::InvalidRule {
                        location: location.to_string(),
                        rule: rule.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    for nested in &value.fields {
        validate_input_value(field, &format!("{location}.{}", nested.name), nested, false)?;
    }

    Ok(())
}

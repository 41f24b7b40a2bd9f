mod checks;

use std::collections::HashMap;

use crate::*;

/// Accumulates field definitions and validates them into a [`Schema`].
pub struct SchemaBuilder {
    config: Config,
    root_types: Vec<String>,
    definitions: Vec<FieldDefinition>,
}

impl SchemaBuilder {
    pub fn new(config: Config) -> Self {
        SchemaBuilder {
            config,
            root_types: vec!["Query".to_string(), "Mutation".to_string(), "Subscription".to_string()],
            definitions: Vec::new(),
        }
    }

    #[must_use]
    pub fn root_types(mut self, root_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.root_types = root_types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn field(mut self, definition: FieldDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    #[must_use]
    pub fn fields(mut self, definitions: impl IntoIterator<Item = FieldDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let SchemaBuilder {
            config,
            root_types,
            definitions,
        } = self;

        let mut index: HashMap<String, HashMap<String, FieldId>> = HashMap::new();
        let mut fields = Vec::with_capacity(definitions.len());

        for definition in definitions {
            let id = FieldId::from(fields.len());
            let is_root = root_types.iter().any(|ty| *ty == definition.parent_type);

            let slot = index.entry(definition.parent_type.clone()).or_default();
            if slot.contains_key(&definition.name) {
                return Err(SchemaError::DuplicateField {
                    field: qualified_name(&definition),
                });
            }
            slot.insert(definition.name.clone(), id);

            let resolver = select_resolver(&config, &definition, is_root)?;
            let field = Field {
                id,
                definition,
                resolver,
                is_root,
            };
            checks::validate_field(&config, &field)?;
            fields.push(field);
        }

        tracing::debug!("Built schema with {} fields", fields.len());

        Ok(Schema {
            config,
            root_types,
            fields,
            index,
        })
    }
}

fn qualified_name(definition: &FieldDefinition) -> String {
    format!("{}.{}", definition.parent_type, definition.name)
}

fn select_resolver(
    config: &Config,
    definition: &FieldDefinition,
    is_root: bool,
) -> Result<ResolverDefinition, SchemaError> {
    let terminals = definition
        .directives
        .iter()
        .filter(|directive| directive.is_terminal())
        .collect::<Vec<_>>();

    match terminals.as_slice() {
        [directive] => ResolverDefinition::from_directive(directive).ok_or_else(|| SchemaError::InvalidDirective {
            location: qualified_name(definition),
            directive: directive.name(),
            message: "is not a resolver directive".to_string(),
        }),
        [] => {
            let mut mapping = None;
            for directive in &definition.directives {
                match directive {
                    Directive::ArgTransform(ArgTransform::Rename { attribute }) => {
                        mapping.get_or_insert((definition.name.clone(), false)).0 = attribute.clone();
                    }
                    Directive::ArgTransform(ArgTransform::GlobalId { .. }) => {
                        mapping.get_or_insert((definition.name.clone(), false)).1 = true;
                    }
                    _ => {}
                }
            }

            // In strict mode, nested fields read their parent only through an explicit mapping.
            if config.schema.strict && (is_root || mapping.is_none()) {
                return Err(SchemaError::MissingResolver {
                    field: qualified_name(definition),
                });
            }

            if is_root {
                tracing::warn!(
                    "Root field {} has no resolver directive and will resolve to null",
                    qualified_name(definition)
                );
                return Ok(ResolverDefinition::Null);
            }

            let (key, global_id) = mapping.unwrap_or_else(|| (definition.name.clone(), false));
            Ok(ResolverDefinition::Attribute { key, global_id })
        }
        _ => Err(SchemaError::AmbiguousResolver {
            field: qualified_name(definition),
            directives: terminals.iter().map(|directive| directive.name()).collect(),
        }),
    }
}

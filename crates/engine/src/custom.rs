//! Registry of the functions custom directives refer to by name.

use std::{collections::HashMap, future::Future, sync::Arc};

use error::FieldError;
use futures::{FutureExt, future::BoxFuture};
use runtime::{Arguments, Entity, auth::Principal, plan::Constraint};
use schema::{Custom, Directive, ResolverDefinition, Schema, SchemaError};
use serde_json::Value;

/// What a custom resolver receives. Arguments went through the whole transformer chain.
#[derive(Debug, Clone)]
pub struct CustomContext {
    pub parent: Option<Entity>,
    pub arguments: Arguments,
    pub principal: Option<Principal>,
    pub values: serde_json::Map<String, Value>,
}

pub type CustomResolverFn = Arc<dyn Fn(CustomContext) -> BoxFuture<'static, Result<Value, FieldError>> + Send + Sync>;

/// Receives the argument value and all the arguments, returns constraints appended to the plan.
pub type QueryBuilderFn = Arc<dyn Fn(&Value, &Arguments) -> Result<Vec<Constraint>, FieldError> + Send + Sync>;

#[derive(Default, Clone)]
pub struct CustomResolvers {
    fields: HashMap<String, CustomResolverFn>,
    methods: HashMap<String, HashMap<String, CustomResolverFn>>,
    builders: HashMap<String, QueryBuilderFn>,
}

impl std::fmt::Debug for CustomResolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomResolvers")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field(
                "methods",
                &self
                    .methods
                    .iter()
                    .flat_map(|(ty, methods)| methods.keys().map(move |name| format!("{ty}.{name}")))
                    .collect::<Vec<_>>(),
            )
            .field("builders", &self.builders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl CustomResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field<F, Fut>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(CustomContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FieldError>> + Send + 'static,
    {
        self.fields
            .insert(name.into(), Arc::new(move |ctx| resolver(ctx).boxed()));
        self
    }

    #[must_use]
    pub fn method<F, Fut>(mut self, parent_type: impl Into<String>, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(CustomContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FieldError>> + Send + 'static,
    {
        self.methods
            .entry(parent_type.into())
            .or_default()
            .insert(name.into(), Arc::new(move |ctx| resolver(ctx).boxed()));
        self
    }

    #[must_use]
    pub fn builder<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&Value, &Arguments) -> Result<Vec<Constraint>, FieldError> + Send + Sync + 'static,
    {
        self.builders.insert(name.into(), Arc::new(builder));
        self
    }

    pub(crate) fn get_field(&self, name: &str) -> Option<&CustomResolverFn> {
        self.fields.get(name)
    }

    pub(crate) fn get_method(&self, parent_type: &str, name: &str) -> Option<&CustomResolverFn> {
        self.methods.get(parent_type)?.get(name)
    }

    pub(crate) fn get_builder(&self, name: &str) -> Option<&QueryBuilderFn> {
        self.builders.get(name)
    }

    /// Every custom directive of the schema must refer to a registered function.
    pub(crate) fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        for field in schema.fields() {
            let unknown = |kind: &'static str, name: &str| SchemaError::UnknownCustomResolver {
                field: field.qualified_name(),
                kind,
                name: name.to_string(),
            };

            match field.resolver() {
                ResolverDefinition::CustomField { resolver } if self.get_field(resolver).is_none() => {
                    return Err(unknown("field", resolver));
                }
                ResolverDefinition::CustomMethod { name } if self.get_method(field.parent_type(), name).is_none() => {
                    return Err(unknown("method", name));
                }
                _ => {}
            }

            let builders = field
                .arguments()
                .iter()
                .flat_map(|argument| argument.directives.iter())
                .filter_map(|directive| match directive {
                    Directive::Custom(Custom::Builder { method }) => Some(method),
                    _ => None,
                });

            for method in builders {
                if self.get_builder(method).is_none() {
                    return Err(unknown("builder", method));
                }
            }
        }

        Ok(())
    }
}

#![cfg_attr(test, allow(unused_crate_dependencies))]

mod builder;
mod definition;
mod directive;
mod error;
mod field;

use std::collections::HashMap;

pub use builder::SchemaBuilder;
pub use config::Config;
pub use definition::*;
pub use directive::*;
pub use error::SchemaError;
pub use field::*;

/// The validated, immutable directive schema. Shared read-only by all requests.
#[derive(Debug)]
pub struct Schema {
    config: Config,
    root_types: Vec<String>,
    fields: Vec<Field>,
    index: HashMap<String, HashMap<String, FieldId>>,
}

impl Schema {
    pub fn builder(config: Config) -> SchemaBuilder {
        SchemaBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_root_type(&self, name: &str) -> bool {
        self.root_types.iter().any(|ty| ty == name)
    }

    pub fn field_id(&self, parent_type: &str, name: &str) -> Option<FieldId> {
        self.index.get(parent_type)?.get(name).copied()
    }

    pub fn field(&self, parent_type: &str, name: &str) -> Option<&Field> {
        self.field_id(parent_type, name).map(|id| &self[id])
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Field> + '_ {
        self.fields.iter()
    }
}

impl std::ops::Index<FieldId> for Schema {
    type Output = Field;

    fn index(&self, id: FieldId) -> &Self::Output {
        &self.fields[usize::from(id)]
    }
}

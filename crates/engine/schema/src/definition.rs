use crate::Directive;

/// A schema field as declared: its position, its arguments and its field level directives.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDefinition {
    pub parent_type: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<InputValueDefinition>,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// An argument, or a field of an input object argument. Input objects nest their own
/// definitions so that directives stay scoped to the value they are declared on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputValueDefinition {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub fields: Vec<InputValueDefinition>,
}

impl FieldDefinition {
    pub fn new(parent_type: impl Into<String>, name: impl Into<String>) -> Self {
        FieldDefinition {
            parent_type: parent_type.into(),
            name: name.into(),
            arguments: Vec::new(),
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn find_argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.iter().find(|argument| argument.name == name)
    }
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        InputValueDefinition {
            name: name.into(),
            directives: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    #[must_use]
    pub fn field(mut self, field: InputValueDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn find_field(&self, name: &str) -> Option<&InputValueDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// All directives of this value and of its nested fields, depth first.
    pub fn walk_directives(&self) -> Box<dyn Iterator<Item = &Directive> + '_> {
        Box::new(
            self.directives
                .iter()
                .chain(self.fields.iter().flat_map(|field| field.walk_directives())),
        )
    }
}

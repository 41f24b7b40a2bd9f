use crate::{
    ArgTransform, Authorize, BroadcastDirective, CacheDirective, Custom, Directive, FetchDirective, FieldDefinition,
    InputValueDefinition, MutateDirective, RelationDirective,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct FieldId(u32);

impl From<usize> for FieldId {
    fn from(index: usize) -> Self {
        FieldId(index as u32)
    }
}

impl From<FieldId> for usize {
    fn from(id: FieldId) -> Self {
        id.0 as usize
    }
}

/// The terminal resolution strategy of a field, selected at schema build.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverDefinition {
    Fetch(FetchDirective),
    Mutate(MutateDirective),
    Relation(RelationDirective),
    CustomField { resolver: String },
    CustomMethod { name: String },
    /// Nested fields without resolver directive read an attribute of their parent.
    Attribute { key: String, global_id: bool },
    /// Root field without resolver in a non-strict schema.
    Null,
}

impl ResolverDefinition {
    pub fn model(&self) -> Option<&str> {
        match self {
            ResolverDefinition::Fetch(fetch) => Some(&fetch.model),
            ResolverDefinition::Mutate(mutate) => Some(&mutate.model),
            _ => None,
        }
    }

    pub(crate) fn from_directive(directive: &Directive) -> Option<Self> {
        let resolver = match directive {
            Directive::Fetch(fetch) => ResolverDefinition::Fetch(fetch.clone()),
            Directive::Mutate(mutate) => ResolverDefinition::Mutate(mutate.clone()),
            Directive::Relation(relation) => ResolverDefinition::Relation(relation.clone()),
            Directive::Custom(Custom::Field { resolver }) => ResolverDefinition::CustomField {
                resolver: resolver.clone(),
            },
            Directive::Custom(Custom::Method { name }) => ResolverDefinition::CustomMethod { name: name.clone() },
            _ => return None,
        };
        Some(resolver)
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) id: FieldId,
    pub(crate) definition: FieldDefinition,
    pub(crate) resolver: ResolverDefinition,
    pub(crate) is_root: bool,
}

impl Field {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn parent_type(&self) -> &str {
        &self.definition.parent_type
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// `Type.field`, used in diagnostics and as the field identity of cache keys.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.definition.parent_type, self.definition.name)
    }

    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    pub fn arguments(&self) -> &[InputValueDefinition] {
        &self.definition.arguments
    }

    pub fn directives(&self) -> &[Directive] {
        &self.definition.directives
    }

    pub fn resolver(&self) -> &ResolverDefinition {
        &self.resolver
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn authorizations(&self) -> impl Iterator<Item = &Authorize> + '_ {
        self.directives().iter().filter_map(|directive| match directive {
            Directive::Authorize(authorize) => Some(authorize),
            _ => None,
        })
    }

    pub fn cache(&self) -> Option<&CacheDirective> {
        self.directives().iter().find_map(|directive| match directive {
            Directive::Cache(cache) => Some(cache),
            _ => None,
        })
    }

    pub fn broadcasts(&self) -> impl Iterator<Item = &BroadcastDirective> + '_ {
        self.directives().iter().filter_map(|directive| match directive {
            Directive::Broadcast(broadcast) => Some(broadcast),
            _ => None,
        })
    }

    pub fn eager_loads(&self) -> impl Iterator<Item = &str> + '_ {
        self.directives()
            .iter()
            .filter_map(|directive| match directive {
                Directive::EagerLoad(eager_load) => Some(eager_load.relations.iter().map(String::as_str)),
                _ => None,
            })
            .flatten()
    }

    /// `(context path, argument path)` pairs of the field's `inject` directives.
    pub fn injections(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.directives().iter().filter_map(|directive| match directive {
            Directive::ArgTransform(ArgTransform::Inject { context, name }) => Some((context.as_str(), name.as_str())),
            _ => None,
        })
    }
}

//! Directives attached to fields and arguments.
//!
//! Every directive is a closed variant carrying its configuration record. Records are validated
//! once when the schema is built and shared read-only by every request afterwards.

mod constraint;
mod rule;

pub use constraint::*;
pub use rule::*;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Directive {
    Fetch(FetchDirective),
    Mutate(MutateDirective),
    Relation(RelationDirective),
    ArgTransform(ArgTransform),
    QueryConstraint(QueryConstraint),
    Authorize(Authorize),
    Cache(CacheDirective),
    Broadcast(BroadcastDirective),
    Validate(Validate),
    Custom(Custom),
    EagerLoad(EagerLoadDirective),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FetchDirective {
    pub kind: FetchKind,
    pub model: String,
    /// Named data store scopes always applied to this field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchKind {
    All,
    Find,
    First,
    Paginate(PaginateOptions),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PaginateOptions {
    #[serde(rename = "type")]
    pub ty: PaginationType,
    pub default_count: Option<usize>,
    /// Overrides the configured maximum page size for this field.
    pub max_count: Option<usize>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaginationType {
    /// Offset pagination with the total count and last page.
    #[default]
    Paginator,
    /// Offset pagination without counting the total.
    Simple,
    /// Relay style cursor connection.
    Connection,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MutateDirective {
    pub kind: MutationKind,
    pub model: String,
    /// Argument holding the primary key for update, upsert and delete.
    #[serde(default = "default_key")]
    pub key: String,
    /// Whether the primary key is an encoded global id.
    #[serde(default)]
    pub global_id: bool,
    /// Argument holding the attributes. When it holds a list, one entity is mutated per element.
    /// Defaults to the whole argument mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

fn default_key() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::IntoStaticStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MutationKind {
    Create,
    Update,
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RelationDirective {
    pub kind: RelationKind,
    pub relation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::IntoStaticStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

impl RelationKind {
    pub fn is_list(self) -> bool {
        matches!(self, RelationKind::HasMany | RelationKind::BelongsToMany)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgTransform {
    Trim,
    Bcrypt,
    Rename { attribute: String },
    GlobalId { decode: GlobalIdProjection },
    Spread,
    /// Writes a request context value at `name`, a dotted path into the arguments.
    Inject { context: String, name: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalIdProjection {
    /// `[type, id]`
    #[default]
    Full,
    Type,
    Id,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Authorize {
    Can(CanDirective),
    Auth {
        #[serde(default)]
        guards: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanDirective {
    pub ability: String,
    /// Argument holding the primary key of the entity to check against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find: Option<String>,
    /// Model checked against. Defaults to the model of the field's resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Extra arguments forwarded to the policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheDirective {
    /// Seconds. Cached forever when absent, unless a default TTL is configured.
    pub max_age: Option<u64>,
    /// Scope cached values to the authenticated principal.
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BroadcastDirective {
    pub subscription: String,
    #[serde(default)]
    pub should_queue: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Validate {
    /// Applies to the value, or to each element of a list value.
    Rules(RulesDirective),
    /// Applies to the list value itself.
    RulesForArray(RulesDirective),
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RulesDirective {
    pub rules: Vec<Rule>,
    /// Message overrides keyed by rule name.
    #[serde(default, skip_serializing_if = "indexmap::IndexMap::is_empty")]
    pub messages: indexmap::IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Custom {
    /// Registered resolver function, by name.
    Field { resolver: String },
    /// Registered method of the parent type.
    Method { name: String },
    /// Registered function adding constraints to the query plan.
    Builder { method: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EagerLoadDirective {
    /// Relation names, dotted paths load nested relations.
    pub relations: Vec<String>,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Fetch(fetch) => match fetch.kind {
                FetchKind::All => "all",
                FetchKind::Find => "find",
                FetchKind::First => "first",
                FetchKind::Paginate(_) => "paginate",
            },
            Directive::Mutate(mutate) => mutate.kind.into(),
            Directive::Relation(relation) => relation.kind.into(),
            Directive::ArgTransform(transform) => match transform {
                ArgTransform::Trim => "trim",
                ArgTransform::Bcrypt => "bcrypt",
                ArgTransform::Rename { .. } => "rename",
                ArgTransform::GlobalId { .. } => "globalId",
                ArgTransform::Spread => "spread",
                ArgTransform::Inject { .. } => "inject",
            },
            Directive::QueryConstraint(constraint) => constraint.name(),
            Directive::Authorize(Authorize::Can(_)) => "can",
            Directive::Authorize(Authorize::Auth { .. }) => "auth",
            Directive::Cache(_) => "cache",
            Directive::Broadcast(_) => "broadcast",
            Directive::Validate(Validate::Rules(_)) => "rules",
            Directive::Validate(Validate::RulesForArray(_)) => "rulesForArray",
            Directive::Custom(Custom::Field { .. }) => "field",
            Directive::Custom(Custom::Method { .. }) => "method",
            Directive::Custom(Custom::Builder { .. }) => "builder",
            Directive::EagerLoad(_) => "with",
        }
    }

    /// Terminal directives decide how a field is resolved. A field has at most one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Directive::Fetch(_)
                | Directive::Mutate(_)
                | Directive::Relation(_)
                | Directive::Custom(Custom::Field { .. } | Custom::Method { .. })
        )
    }

    pub fn is_allowed_on_field(&self) -> bool {
        match self {
            Directive::ArgTransform(transform) => matches!(
                transform,
                ArgTransform::Rename { .. } | ArgTransform::GlobalId { .. } | ArgTransform::Inject { .. }
            ),
            Directive::QueryConstraint(_) | Directive::Validate(_) | Directive::Custom(Custom::Builder { .. }) => false,
            _ => true,
        }
    }

    pub fn is_allowed_on_argument(&self) -> bool {
        match self {
            Directive::ArgTransform(transform) => !matches!(transform, ArgTransform::Inject { .. }),
            Directive::QueryConstraint(_) | Directive::Validate(_) | Directive::Custom(Custom::Builder { .. }) => true,
            _ => false,
        }
    }
}

// Shorthands, mostly useful to declare schemas in code.
impl Directive {
    pub fn all(model: impl Into<String>) -> Self {
        Self::fetch(FetchKind::All, model)
    }

    pub fn find(model: impl Into<String>) -> Self {
        Self::fetch(FetchKind::Find, model)
    }

    pub fn first(model: impl Into<String>) -> Self {
        Self::fetch(FetchKind::First, model)
    }

    pub fn paginate(model: impl Into<String>, options: PaginateOptions) -> Self {
        Self::fetch(FetchKind::Paginate(options), model)
    }

    fn fetch(kind: FetchKind, model: impl Into<String>) -> Self {
        Directive::Fetch(FetchDirective {
            kind,
            model: model.into(),
            scopes: Vec::new(),
        })
    }

    pub fn mutate(kind: MutationKind, model: impl Into<String>) -> Self {
        Directive::Mutate(MutateDirective {
            kind,
            model: model.into(),
            key: default_key(),
            global_id: false,
            input: None,
        })
    }

    pub fn relation(kind: RelationKind, relation: impl Into<String>) -> Self {
        Directive::Relation(RelationDirective {
            kind,
            relation: relation.into(),
        })
    }

    pub fn rename(attribute: impl Into<String>) -> Self {
        Directive::ArgTransform(ArgTransform::Rename {
            attribute: attribute.into(),
        })
    }

    pub fn rules<'a>(rules: impl IntoIterator<Item = &'a str>) -> Self {
        Directive::Validate(Validate::Rules(RulesDirective {
            rules: rules.into_iter().map(Rule::new).collect(),
            messages: Default::default(),
        }))
    }

    pub fn can(ability: impl Into<String>) -> Self {
        Directive::Authorize(Authorize::Can(CanDirective {
            ability: ability.into(),
            find: None,
            model: None,
            args: Vec::new(),
        }))
    }

    pub fn with(relations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Directive::EagerLoad(EagerLoadDirective {
            relations: relations.into_iter().map(Into::into).collect(),
        })
    }
}

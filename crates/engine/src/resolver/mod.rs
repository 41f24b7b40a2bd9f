mod delegate;
mod fetch;
mod mutate;
mod paginate;
mod relation;

use error::FieldError;
use runtime::{Arguments, Runtime, ids::IdCodec, key_to_string, plan::QueryPlan};
use schema::ResolverDefinition;
use serde_json::Value;

pub(crate) use relation::resolve_batch as resolve_relation_batch;

use crate::{ResolvedValue, context::ResolutionContext};

/// Executes the terminal strategy of the field. `plan` is only present for read fields.
pub(crate) async fn dispatch<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    arguments: &Arguments,
    plan: Option<QueryPlan>,
) -> Result<ResolvedValue, FieldError> {
    match ctx.field.resolver() {
        ResolverDefinition::Fetch(fetch) => {
            let plan = plan.unwrap_or_else(|| QueryPlan::new(fetch.model.clone()));
            fetch::resolve(ctx, fetch, arguments, plan).await
        }
        ResolverDefinition::Mutate(mutate) => mutate::resolve(ctx, mutate, arguments).await,
        ResolverDefinition::Relation(relation) => relation::resolve(ctx, relation).await,
        ResolverDefinition::CustomField { resolver } => delegate::resolve_field(ctx, resolver, arguments).await,
        ResolverDefinition::CustomMethod { name } => delegate::resolve_method(ctx, name, arguments).await,
        ResolverDefinition::Attribute { key, global_id } => Ok(attribute(ctx, key, *global_id)),
        ResolverDefinition::Null => Ok(ResolvedValue::Null),
    }
}

/// Nested fields without resolver directive read their parent.
fn attribute<R: Runtime>(ctx: ResolutionContext<'_, R>, key: &str, global_id: bool) -> ResolvedValue {
    let Some(parent) = ctx.parent else {
        return ResolvedValue::Null;
    };

    if let Some(value) = parent.attribute(key) {
        return match value {
            Value::Null => ResolvedValue::Null,
            value if global_id => {
                let id = ctx.runtime().id_codec().encode(&parent.model, &key_to_string(value));
                ResolvedValue::Json(Value::String(id))
            }
            value => ResolvedValue::Json(value.clone()),
        };
    }

    match parent.relation(key) {
        Some(entities) => ResolvedValue::Entities(entities.to_vec()),
        None => ResolvedValue::Null,
    }
}

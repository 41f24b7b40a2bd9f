use error::FieldError;
use indexmap::IndexMap;
use runtime::{Arguments, Entity, Runtime, store::DataStore};
use schema::{RelationDirective, RelationKind};

use crate::{
    ResolvedValue,
    cache::{self, Lookup},
    context::ResolutionContext,
    eager_load::{self, RelationTree},
};

/// Relation of the single parent in context, served from eager-loaded data when present.
pub(super) async fn resolve<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    relation: &RelationDirective,
) -> Result<ResolvedValue, FieldError> {
    let Some(parent) = ctx.parent else {
        return Ok(ResolvedValue::Null);
    };

    let mut entities = match parent.relation(&relation.relation) {
        Some(entities) => entities.to_vec(),
        None => {
            let mut groups = fetch(ctx, &parent.model, relation, &[parent]).await?;
            groups.pop().unwrap_or_default()
        }
    };

    load_nested(ctx, &mut entities).await?;

    Ok(shape(relation.kind, entities))
}

/// Relation of every parent of a sibling set. Cached values are served first, the remaining
/// parents share one data store call per parent model.
pub(crate) async fn resolve_batch<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    relation: &RelationDirective,
    parents: &[Entity],
    arguments: &Arguments,
) -> Vec<Result<ResolvedValue, FieldError>> {
    let mut results: Vec<Option<Result<ResolvedValue, FieldError>>> = Vec::with_capacity(parents.len());
    let mut misses = Vec::new();

    for (index, parent) in parents.iter().enumerate() {
        match cache::lookup(ctx.with_parent(Some(parent)), arguments).await {
            Lookup::Hit(value) => results.push(Some(Ok(value))),
            Lookup::Bypass => {
                results.push(None);
                misses.push((index, None));
            }
            Lookup::Miss { key, ttl } => {
                results.push(None);
                misses.push((index, Some((key, ttl))));
            }
        }
    }

    // Eager-loaded parents don't need a fetch.
    let mut loaded = vec![None; parents.len()];
    let mut by_model: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (index, _) in &misses {
        let parent = &parents[*index];
        match parent.relation(&relation.relation) {
            Some(entities) => loaded[*index] = Some(entities.to_vec()),
            None => by_model.entry(parent.model.as_str()).or_default().push(*index),
        }
    }

    let mut failures = vec![None; parents.len()];
    for (model, indices) in by_model {
        let batch = indices.iter().map(|&index| &parents[index]).collect::<Vec<_>>();
        match fetch(ctx, model, relation, &batch).await {
            Ok(groups) => {
                for (index, group) in indices.into_iter().zip(groups) {
                    loaded[index] = Some(group);
                }
            }
            Err(err) => {
                for index in indices {
                    failures[index] = Some(err.clone());
                }
            }
        }
    }

    // Nested eager loads run once for the children of every parent.
    let nested = {
        let children = loaded.iter_mut().flatten().flat_map(|group| group.iter_mut()).collect();
        load_children(ctx, children).await
    };

    for (index, cache_entry) in misses {
        let result = match (failures[index].take(), &nested, loaded[index].take()) {
            (Some(err), _, _) => Err(err),
            (None, Err(err), _) => Err(err.clone()),
            (None, Ok(()), Some(entities)) => Ok(shape(relation.kind, entities)),
            (None, Ok(()), None) => Err(FieldError::internal_server_error()),
        };

        if let (Ok(value), Some((key, ttl))) = (&result, cache_entry) {
            cache::store(ctx.with_parent(Some(&parents[index])), &key, ttl, value).await;
        }

        results[index] = Some(result);
    }

    results
        .into_iter()
        .map(|result| result.unwrap_or_else(|| Err(FieldError::internal_server_error())))
        .collect()
}

async fn fetch<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    model: &str,
    relation: &RelationDirective,
    parents: &[&Entity],
) -> Result<Vec<Vec<Entity>>, FieldError> {
    tracing::debug!("Fetching {model}.{} for {} parents", relation.relation, parents.len());

    let groups = ctx
        .runtime()
        .data_store()
        .fetch_relation(model, &relation.relation, parents)
        .await
        .map_err(FieldError::data_store)?;

    if groups.len() != parents.len() {
        tracing::error!(
            "Data store returned {} groups for {} parents of {model}.{}",
            groups.len(),
            parents.len(),
            relation.relation
        );
        return Err(FieldError::internal_server_error());
    }

    Ok(groups)
}

async fn load_nested<R: Runtime>(ctx: ResolutionContext<'_, R>, entities: &mut [Entity]) -> Result<(), FieldError> {
    load_children(ctx, entities.iter_mut().collect()).await
}

async fn load_children<R: Runtime>(ctx: ResolutionContext<'_, R>, children: Vec<&mut Entity>) -> Result<(), FieldError> {
    let tree = RelationTree::from_paths(ctx.field.eager_loads());
    eager_load::load(ctx.runtime().data_store(), children, &tree).await
}

fn shape(kind: RelationKind, entities: Vec<Entity>) -> ResolvedValue {
    if kind.is_list() {
        ResolvedValue::Entities(entities)
    } else {
        entities
            .into_iter()
            .next()
            .map(ResolvedValue::Entity)
            .unwrap_or(ResolvedValue::Null)
    }
}

use error::FieldError;
use runtime::{
    Arguments, Entity, Runtime,
    plan::{Constraint, QueryPlan, Window},
    store::DataStore,
};
use schema::{FetchDirective, FetchKind};

use super::paginate;
use crate::{
    ResolvedValue,
    context::ResolutionContext,
    eager_load::{self, RelationTree},
};

pub(super) async fn resolve<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    fetch: &FetchDirective,
    arguments: &Arguments,
    mut plan: QueryPlan,
) -> Result<ResolvedValue, FieldError> {
    let store = ctx.runtime().data_store();
    let relations = RelationTree::from_paths(plan.eager_loads());

    let mut value = match &fetch.kind {
        FetchKind::All => ResolvedValue::Entities(query(store, &plan).await?),
        FetchKind::Find => {
            let mut entities = query(store, &plan).await?;
            match entities.len() {
                0 => return Err(FieldError::not_found(&fetch.model)),
                1 => ResolvedValue::Entity(entities.remove(0)),
                count => return Err(FieldError::ambiguous_result(&fetch.model, count)),
            }
        }
        FetchKind::First => {
            plan.push(Constraint::Window(Window { offset: 0, limit: 1 }));
            query(store, &plan)
                .await?
                .into_iter()
                .next()
                .map(ResolvedValue::Entity)
                .unwrap_or(ResolvedValue::Null)
        }
        FetchKind::Paginate(options) => paginate::resolve(ctx, options, arguments, plan).await?,
    };

    eager_load::load(store, value.entities_mut(), &relations).await?;

    Ok(value)
}

pub(super) async fn query(store: &impl DataStore, plan: &QueryPlan) -> Result<Vec<Entity>, FieldError> {
    store.query(plan).await.map_err(FieldError::data_store)
}

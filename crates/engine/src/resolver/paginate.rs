use base64::{Engine as _, engine::general_purpose::STANDARD};
use error::FieldError;
use runtime::{
    Arguments, Runtime,
    plan::{Constraint, QueryPlan, Window},
    store::DataStore,
};
use schema::{PaginateOptions, PaginationType};
use serde_json::Value;

use super::fetch::query;
use crate::{
    ConnectionPageInfo, Edge, Page, PaginatorInfo, ResolvedValue, SimplePaginatorInfo, context::ResolutionContext,
};

pub(super) async fn resolve<R: Runtime>(
    ctx: ResolutionContext<'_, R>,
    options: &PaginateOptions,
    arguments: &Arguments,
    mut plan: QueryPlan,
) -> Result<ResolvedValue, FieldError> {
    let config = &ctx.config().pagination;
    let store = ctx.runtime().data_store();

    let per_page = match argument(arguments, "first").or_else(|| argument(arguments, "count")) {
        Some(value) => positive(value, "first")?,
        None => options
            .default_count
            .or(config.default_count)
            .ok_or_else(|| FieldError::invalid_argument("The `first` argument is required."))?,
    };

    if let Some(max_count) = options.max_count.or(config.max_count) {
        if per_page > max_count {
            return Err(FieldError::page_size_exceeded(per_page, max_count));
        }
    }

    let page = match options.ty {
        PaginationType::Paginator => {
            let current_page = current_page(arguments)?;
            let offset = (current_page - 1).saturating_mul(per_page);
            let total = count(store, &plan).await?;

            plan.push(Constraint::Window(Window {
                offset,
                limit: per_page,
            }));
            let data = query(store, &plan).await?;
            let last_page = last_page(total, per_page);

            Page::Paginator {
                paginator_info: PaginatorInfo {
                    count: data.len(),
                    current_page,
                    first_item: first_item(offset, data.len()),
                    last_item: last_item(offset, data.len()),
                    has_more_pages: current_page < last_page,
                    last_page,
                    per_page,
                    total,
                },
                data,
            }
        }
        PaginationType::Simple => {
            let current_page = current_page(arguments)?;
            let offset = (current_page - 1).saturating_mul(per_page);

            // One extra item tells whether there is a next page without counting.
            plan.push(Constraint::Window(Window {
                offset,
                limit: per_page.saturating_add(1),
            }));
            let mut data = query(store, &plan).await?;
            let has_more_pages = data.len() > per_page;
            data.truncate(per_page);

            Page::Simple {
                paginator_info: SimplePaginatorInfo {
                    count: data.len(),
                    current_page,
                    first_item: first_item(offset, data.len()),
                    last_item: last_item(offset, data.len()),
                    has_more_pages,
                    per_page,
                },
                data,
            }
        }
        PaginationType::Connection => {
            let offset = match argument(arguments, "after") {
                Some(Value::String(cursor)) => decode_cursor(cursor)?
                    .checked_add(1)
                    .ok_or_else(|| invalid_cursor(cursor))?,
                Some(_) => return Err(FieldError::invalid_argument("The `after` argument must be a cursor.")),
                None => 0,
            };
            let total = count(store, &plan).await?;

            plan.push(Constraint::Window(Window {
                offset,
                limit: per_page,
            }));
            let edges = query(store, &plan)
                .await?
                .into_iter()
                .enumerate()
                .map(|(index, node)| Edge {
                    cursor: encode_cursor(offset.saturating_add(index)),
                    node,
                })
                .collect::<Vec<_>>();

            Page::Connection {
                page_info: ConnectionPageInfo {
                    has_next_page: offset.saturating_add(edges.len()) < total,
                    has_previous_page: offset > 0,
                    start_cursor: edges.first().map(|edge| edge.cursor.clone()),
                    end_cursor: edges.last().map(|edge| edge.cursor.clone()),
                    total,
                    count: edges.len(),
                    current_page: (offset / per_page).saturating_add(1),
                    last_page: last_page(total, per_page),
                },
                edges,
            }
        }
    };

    Ok(ResolvedValue::Page(page))
}

fn argument<'a>(arguments: &'a Arguments, name: &str) -> Option<&'a Value> {
    arguments.get(name).filter(|value| !value.is_null())
}

fn positive(value: &Value, name: &str) -> Result<usize, FieldError> {
    value
        .as_u64()
        .and_then(|value| usize::try_from(value).ok())
        .filter(|value| *value >= 1)
        .ok_or_else(|| FieldError::invalid_argument(format!("The `{name}` argument must be at least 1.")))
}

fn current_page(arguments: &Arguments) -> Result<usize, FieldError> {
    argument(arguments, "page").map_or(Ok(1), |value| positive(value, "page"))
}

async fn count(store: &impl DataStore, plan: &QueryPlan) -> Result<usize, FieldError> {
    store.count(plan).await.map_err(FieldError::data_store)
}

fn first_item(offset: usize, count: usize) -> Option<usize> {
    (count > 0).then_some(offset.saturating_add(1))
}

fn last_item(offset: usize, count: usize) -> Option<usize> {
    (count > 0).then_some(offset.saturating_add(count))
}

fn last_page(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page).max(1)
}

pub(crate) fn encode_cursor(offset: usize) -> String {
    STANDARD.encode(offset.to_string())
}

pub(crate) fn decode_cursor(cursor: &str) -> Result<usize, FieldError> {
    STANDARD
        .decode(cursor)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|offset| offset.parse().ok())
        .ok_or_else(|| invalid_cursor(cursor))
}

fn invalid_cursor(cursor: &str) -> FieldError {
    FieldError::invalid_argument(format!("The cursor `{cursor}` is invalid."))
}

//! Relation batching. Each distinct `(parent collection, relation)` pair costs a single data
//! store call, whatever the number of parents.

use error::FieldError;
use futures::{FutureExt, future::BoxFuture};
use indexmap::IndexMap;
use runtime::{Entity, store::DataStore};
use tracing::Instrument;

/// Relation paths such as `author.posts` folded into a tree.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct RelationTree(IndexMap<String, RelationTree>);

impl RelationTree {
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = RelationTree::default();
        for path in paths {
            let mut node = &mut tree;
            for segment in path.split('.') {
                node = node.0.entry(segment.to_string()).or_default();
            }
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fetches every relation of `tree` for all `parents` and attaches it to them before returning.
/// Relations already present on a parent are not fetched again.
pub(crate) async fn load(
    store: &impl DataStore,
    parents: Vec<&mut Entity>,
    tree: &RelationTree,
) -> Result<(), FieldError> {
    if tree.is_empty() || parents.is_empty() {
        return Ok(());
    }

    let span = tracing::info_span!("eager_load", parents = parents.len());
    load_level(store, parents, tree).instrument(span).await
}

fn load_level<'a, S: DataStore>(
    store: &'a S,
    mut parents: Vec<&'a mut Entity>,
    tree: &'a RelationTree,
) -> BoxFuture<'a, Result<(), FieldError>> {
    async move {
        for (relation, subtree) in &tree.0 {
            let mut by_model: IndexMap<String, Vec<usize>> = IndexMap::new();
            for (index, parent) in parents.iter().enumerate() {
                if !parent.relations.contains_key(relation) {
                    by_model.entry(parent.model.clone()).or_default().push(index);
                }
            }

            for (model, indices) in by_model {
                let groups = {
                    let batch = indices.iter().map(|&index| &*parents[index]).collect::<Vec<_>>();
                    tracing::debug!("Loading {model}.{relation} for {} parents", batch.len());
                    store
                        .fetch_relation(&model, relation, &batch)
                        .await
                        .map_err(FieldError::data_store)?
                };

                if groups.len() != indices.len() {
                    tracing::error!(
                        "Data store returned {} groups for {} parents of {model}.{relation}",
                        groups.len(),
                        indices.len()
                    );
                    return Err(FieldError::internal_server_error());
                }

                for (index, group) in indices.into_iter().zip(groups) {
                    parents[index].set_relation(relation.clone(), group);
                }
            }

            if !subtree.is_empty() {
                let children = parents
                    .iter_mut()
                    .filter_map(|parent| parent.relations.get_mut(relation))
                    .flat_map(|children| children.iter_mut())
                    .collect::<Vec<_>>();
                load_level(store, children, subtree).await?;
            }
        }

        Ok(())
    }
    .boxed()
}

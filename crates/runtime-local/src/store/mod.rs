mod predicate;

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use futures_util::lock::Mutex;
use itertools::Itertools;
use runtime::{
    Arguments, Entity, key_to_string,
    plan::{Predicate, QueryPlan, Search, SortDirection},
    store::{DataStore, StoreError},
};
use serde_json::Value;

/// How the entities of a relation are found from their parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// The parent holds `foreign_key`, pointing at the related entity's key.
    BelongsTo { related: String, foreign_key: String },
    /// The related entity holds `foreign_key`, pointing at the parent's key.
    HasOne { related: String, foreign_key: String },
    /// The related entities hold `foreign_key`, pointing at the parent's key.
    HasMany { related: String, foreign_key: String },
    /// Entities of the `pivot` model link parents (`parent_key`) to related entities
    /// (`related_key`).
    BelongsToMany {
        related: String,
        pivot: String,
        parent_key: String,
        related_key: String,
    },
}

impl Relation {
    pub fn belongs_to(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::BelongsTo {
            related: related.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn has_one(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::HasOne {
            related: related.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn has_many(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::HasMany {
            related: related.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn belongs_to_many(
        related: impl Into<String>,
        pivot: impl Into<String>,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Relation::BelongsToMany {
            related: related.into(),
            pivot: pivot.into(),
            parent_key: parent_key.into(),
            related_key: related_key.into(),
        }
    }
}

/// Number of calls per data store operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreCalls {
    pub query: usize,
    pub count: usize,
    pub find_by_key: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub fetch_relation: usize,
}

#[derive(Default)]
struct Counters {
    query: AtomicUsize,
    count: AtomicUsize,
    find_by_key: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
    fetch_relation: AtomicUsize,
}

impl Counters {
    fn hit(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StoreCalls {
        StoreCalls {
            query: self.query.load(Ordering::Relaxed),
            count: self.count.load(Ordering::Relaxed),
            find_by_key: self.find_by_key.load(Ordering::Relaxed),
            create: self.create.load(Ordering::Relaxed),
            update: self.update.load(Ordering::Relaxed),
            delete: self.delete.load(Ordering::Relaxed),
            fetch_relation: self.fetch_relation.load(Ordering::Relaxed),
        }
    }
}

struct Model {
    primary_key: String,
    entities: Vec<Entity>,
    next_id: u64,
    relations: HashMap<String, Relation>,
    scopes: HashMap<String, Predicate>,
    search_indexes: HashMap<String, Vec<String>>,
}

impl Model {
    fn new(primary_key: impl Into<String>) -> Self {
        Model {
            primary_key: primary_key.into(),
            entities: Vec::new(),
            next_id: 1,
            relations: HashMap::new(),
            scopes: HashMap::new(),
            search_indexes: HashMap::new(),
        }
    }

    fn position(&self, key: &Value) -> Option<usize> {
        let key = key_to_string(key);
        self.entities.iter().position(|entity| entity.key_string() == key)
    }
}

/// A data store keeping every model in memory, evaluating query plans itself.
///
/// Models are created on first use with `id` as primary key, unless declared with
/// [`InMemoryDataStore::model`]. Keys compare by their string form.
#[derive(Default)]
pub struct InMemoryDataStore {
    models: Mutex<HashMap<String, Model>>,
    counters: Counters,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, name: &str, primary_key: impl Into<String>) -> Self {
        self.model_mut(name).primary_key = primary_key.into();
        self
    }

    #[must_use]
    pub fn relation(mut self, model: &str, name: impl Into<String>, relation: Relation) -> Self {
        self.model_mut(model).relations.insert(name.into(), relation);
        self
    }

    #[must_use]
    pub fn scope(mut self, model: &str, name: impl Into<String>, predicate: Predicate) -> Self {
        self.model_mut(model).scopes.insert(name.into(), predicate);
        self
    }

    /// Columns searched when a search names `index`. The index named `default` applies to
    /// searches without an index.
    #[must_use]
    pub fn search_index<S: Into<String>>(
        mut self,
        model: &str,
        index: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        let columns = columns.into_iter().map(Into::into).collect();
        self.model_mut(model).search_indexes.insert(index.into(), columns);
        self
    }

    /// Seeds an entity. Keys missing from `attributes` are generated.
    #[must_use]
    pub fn insert(mut self, model: &str, attributes: Value) -> Self {
        let attributes = match attributes {
            Value::Object(attributes) => attributes,
            other => {
                tracing::warn!("Ignoring non object {model} seed: {other}");
                return self;
            }
        };

        let model_name = model.to_string();
        if let Err(err) = create_entity(self.model_mut(model), model_name, attributes) {
            tracing::warn!("Could not seed {model}: {err}");
        }
        self
    }

    pub fn calls(&self) -> StoreCalls {
        self.counters.snapshot()
    }

    /// Every entity of `model`, in insertion order.
    pub async fn all(&self, model: &str) -> Vec<Entity> {
        self.models
            .lock()
            .await
            .get(model)
            .map(|model| model.entities.clone())
            .unwrap_or_default()
    }

    fn model_mut(&mut self, name: &str) -> &mut Model {
        self.models
            .get_mut()
            .entry(name.to_string())
            .or_insert_with(|| Model::new("id"))
    }
}

fn create_entity(model: &mut Model, name: String, mut attributes: Arguments) -> Result<Entity, StoreError> {
    let key = match attributes.get(&model.primary_key) {
        Some(key) if !key.is_null() => key.clone(),
        _ => {
            let key = Value::from(model.next_id);
            attributes.insert(model.primary_key.clone(), key.clone());
            key
        }
    };

    if model.position(&key).is_some() {
        return Err(StoreError::Other(format!("Duplicate {name} key {}", key_to_string(&key))));
    }

    if let Some(id) = key.as_u64().or_else(|| key.as_str().and_then(|key| key.parse().ok())) {
        model.next_id = model.next_id.max(id.saturating_add(1));
    }

    let entity = Entity::new(name, key, attributes);
    model.entities.push(entity.clone());
    Ok(entity)
}

fn evaluate(model: &Model, plan: &QueryPlan, windowed: bool) -> Result<Vec<Entity>, StoreError> {
    let mut predicates = plan.filters().collect::<Vec<_>>();
    for scope in plan.scopes() {
        let predicate = model.scopes.get(scope).ok_or_else(|| StoreError::UnknownScope {
            model: plan.model().to_string(),
            scope: scope.to_string(),
        })?;
        predicates.push(predicate);
    }

    let search = plan.search().map(|search| (search.query.to_lowercase(), search_columns(model, search)));
    let filter = predicate::Filter::new(predicates);

    let mut entities = model
        .entities
        .iter()
        .filter(|entity| filter.matches(entity))
        .filter(|entity| match &search {
            Some((query, columns)) => searched(entity, query, columns.as_deref()),
            None => true,
        })
        .cloned()
        .collect::<Vec<_>>();

    let sorts = plan.sorts().collect::<Vec<_>>();
    if !sorts.is_empty() {
        entities.sort_by(|a, b| {
            sorts.iter().fold(std::cmp::Ordering::Equal, |ordering, sort| {
                ordering.then_with(|| {
                    let ordering = predicate::sort_order(
                        a.attribute(&sort.column).unwrap_or(&Value::Null),
                        b.attribute(&sort.column).unwrap_or(&Value::Null),
                    );
                    match sort.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
            })
        });
    }

    match plan.window() {
        Some(window) if windowed => Ok(entities.into_iter().skip(window.offset).take(window.limit).collect()),
        _ => Ok(entities),
    }
}

/// Explicit columns, then the columns of the named index, then every string attribute.
fn search_columns(model: &Model, search: &Search) -> Option<Vec<String>> {
    if !search.columns.is_empty() {
        return Some(search.columns.clone());
    }

    model
        .search_indexes
        .get(search.index.as_deref().unwrap_or("default"))
        .cloned()
}

fn searched(entity: &Entity, query: &str, columns: Option<&[String]>) -> bool {
    let contains = |value: &Value| {
        value
            .as_str()
            .is_some_and(|value| value.to_lowercase().contains(query))
    };

    match columns {
        Some(columns) => columns
            .iter()
            .filter_map(|column| entity.attribute(column))
            .any(contains),
        None => entity.attributes.values().any(contains),
    }
}

impl DataStore for InMemoryDataStore {
    async fn query(&self, plan: &QueryPlan) -> Result<Vec<Entity>, StoreError> {
        Counters::hit(&self.counters.query);

        let models = self.models.lock().await;
        let model = models
            .get(plan.model())
            .ok_or_else(|| StoreError::UnknownModel(plan.model().to_string()))?;

        evaluate(model, plan, true)
    }

    async fn count(&self, plan: &QueryPlan) -> Result<usize, StoreError> {
        Counters::hit(&self.counters.count);

        let models = self.models.lock().await;
        let model = models
            .get(plan.model())
            .ok_or_else(|| StoreError::UnknownModel(plan.model().to_string()))?;

        evaluate(model, plan, false).map(|entities| entities.len())
    }

    async fn find_by_key(&self, model: &str, key: &Value) -> Result<Option<Entity>, StoreError> {
        Counters::hit(&self.counters.find_by_key);

        let models = self.models.lock().await;
        let entities = models.get(model).ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;

        Ok(entities
            .position(key)
            .map(|position| entities.entities[position].clone()))
    }

    async fn create(&self, model: &str, attributes: Arguments) -> Result<Entity, StoreError> {
        Counters::hit(&self.counters.create);

        let mut models = self.models.lock().await;
        let entities = models.get_mut(model).ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;

        create_entity(entities, model.to_string(), attributes)
    }

    async fn update(&self, model: &str, key: &Value, attributes: Arguments) -> Result<Entity, StoreError> {
        Counters::hit(&self.counters.update);

        let mut models = self.models.lock().await;
        let entities = models.get_mut(model).ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;

        let position = entities.position(key).ok_or_else(|| StoreError::NotFound {
            model: model.to_string(),
            key: key_to_string(key),
        })?;

        let primary_key = entities.primary_key.clone();
        let entity = &mut entities.entities[position];
        for (name, value) in attributes {
            // Primary keys are immutable.
            if name != primary_key {
                entity.attributes.insert(name, value);
            }
        }

        Ok(entity.clone())
    }

    async fn delete(&self, model: &str, key: &Value) -> Result<Entity, StoreError> {
        Counters::hit(&self.counters.delete);

        let mut models = self.models.lock().await;
        let entities = models.get_mut(model).ok_or_else(|| StoreError::UnknownModel(model.to_string()))?;

        let position = entities.position(key).ok_or_else(|| StoreError::NotFound {
            model: model.to_string(),
            key: key_to_string(key),
        })?;

        Ok(entities.entities.remove(position))
    }

    async fn fetch_relation(
        &self,
        model: &str,
        relation: &str,
        parents: &[&Entity],
    ) -> Result<Vec<Vec<Entity>>, StoreError> {
        Counters::hit(&self.counters.fetch_relation);

        let models = self.models.lock().await;
        let definition = models
            .get(model)
            .ok_or_else(|| StoreError::UnknownModel(model.to_string()))?
            .relations
            .get(relation)
            .ok_or_else(|| StoreError::UnknownRelation {
                model: model.to_string(),
                relation: relation.to_string(),
            })?;

        let related_model = |name: &str| models.get(name).ok_or_else(|| StoreError::UnknownModel(name.to_string()));

        let groups: Vec<Vec<Entity>> = match definition {
            Relation::BelongsTo { related, foreign_key } => {
                let by_key = related_model(related)?
                    .entities
                    .iter()
                    .map(|entity| (entity.key_string(), entity))
                    .collect::<HashMap<_, _>>();

                parents
                    .iter()
                    .map(|parent| {
                        parent
                            .attribute(foreign_key)
                            .filter(|key| !key.is_null())
                            .and_then(|key| by_key.get(&key_to_string(key)))
                            .map(|entity| vec![(*entity).clone()])
                            .unwrap_or_default()
                    })
                    .collect()
            }
            Relation::HasOne { related, foreign_key } | Relation::HasMany { related, foreign_key } => {
                let mut by_parent = related_model(related)?
                    .entities
                    .iter()
                    .filter_map(|entity| {
                        let key = entity.attribute(foreign_key).filter(|key| !key.is_null())?;
                        Some((key_to_string(key), entity.clone()))
                    })
                    .into_group_map();

                parents
                    .iter()
                    .map(|parent| by_parent.remove(&parent.key_string()).unwrap_or_default())
                    .collect()
            }
            Relation::BelongsToMany {
                related,
                pivot,
                parent_key,
                related_key,
            } => {
                let by_key = related_model(related)?
                    .entities
                    .iter()
                    .map(|entity| (entity.key_string(), entity))
                    .collect::<HashMap<_, _>>();

                let links = related_model(pivot)?
                    .entities
                    .iter()
                    .filter_map(|link| {
                        let parent = link.attribute(parent_key)?;
                        let related = link.attribute(related_key)?;
                        Some((key_to_string(parent), key_to_string(related)))
                    })
                    .into_group_map();

                parents
                    .iter()
                    .map(|parent| {
                        links
                            .get(&parent.key_string())
                            .into_iter()
                            .flatten()
                            .filter_map(|key| by_key.get(key).map(|entity| (*entity).clone()))
                            .collect()
                    })
                    .collect()
            }
        };

        Ok(groups)
    }
}

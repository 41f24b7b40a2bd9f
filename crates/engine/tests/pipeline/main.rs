#![allow(unused_crate_dependencies)]

mod arguments;
mod authorization;
mod cache;
mod custom;
mod mutations;
mod relations;

use std::sync::Arc;

use quarry_engine::{Arguments, CustomResolvers, Engine, FieldError, FieldId, RequestContext, ResolvedValue, Schema};
use runtime_local::{InMemoryBroadcaster, InMemoryDataStore, InMemoryFieldCache, LocalRuntime, PolicyRegistry};
use schema::{Config, FieldDefinition};
use serde_json::Value;

pub struct TestEngine {
    inner: Engine<LocalRuntime>,
}

pub struct TestEngineBuilder {
    config: Config,
    fields: Vec<FieldDefinition>,
    store: InMemoryDataStore,
    authorizer: PolicyRegistry,
    broadcaster: InMemoryBroadcaster,
    field_cache: Option<InMemoryFieldCache>,
    custom: CustomResolvers,
}

impl TestEngine {
    pub fn builder() -> TestEngineBuilder {
        let mut config = Config::default();
        // Keeps bcrypt fast.
        config.hashing.cost = 4;

        TestEngineBuilder {
            config,
            fields: Vec::new(),
            store: InMemoryDataStore::new(),
            authorizer: PolicyRegistry::new(),
            broadcaster: InMemoryBroadcaster::new(),
            field_cache: None,
            custom: CustomResolvers::new(),
        }
    }

    pub fn runtime(&self) -> &LocalRuntime {
        &self.inner.runtime
    }

    pub fn engine(&self) -> &Engine<LocalRuntime> {
        &self.inner
    }

    /// `Type.field` to its id.
    pub fn field(&self, name: &str) -> FieldId {
        let (parent_type, field) = name.split_once('.').unwrap();
        self.inner.schema().field_id(parent_type, field).unwrap()
    }

    pub async fn resolve(&self, name: &str, arguments: Value) -> Result<ResolvedValue, FieldError> {
        self.resolve_with(name, arguments, &RequestContext::new()).await
    }

    pub async fn resolve_with(
        &self,
        name: &str,
        arguments: Value,
        request: &RequestContext,
    ) -> Result<ResolvedValue, FieldError> {
        self.inner
            .resolve(self.field(name), None, to_arguments(arguments), request)
            .await
    }
}

impl TestEngineBuilder {
    #[must_use]
    pub fn with_config(mut self, configure: impl FnOnce(&mut Config)) -> Self {
        configure(&mut self.config);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: InMemoryDataStore) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_authorizer(mut self, authorizer: PolicyRegistry) -> Self {
        self.authorizer = authorizer;
        self
    }

    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: InMemoryBroadcaster) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    #[must_use]
    pub fn with_field_cache(mut self, field_cache: InMemoryFieldCache) -> Self {
        self.field_cache = Some(field_cache);
        self
    }

    #[must_use]
    pub fn with_custom_resolvers(mut self, custom: CustomResolvers) -> Self {
        self.custom = custom;
        self
    }

    pub fn build(self) -> TestEngine {
        init_logs();

        let schema = Schema::builder(self.config.clone())
            .fields(self.fields)
            .build()
            .unwrap();

        let mut runtime = LocalRuntime::new(&self.config)
            .with_data_store(self.store)
            .with_authorizer(self.authorizer)
            .with_broadcaster(self.broadcaster);
        if let Some(field_cache) = self.field_cache {
            runtime = runtime.with_field_cache(field_cache);
        }

        TestEngine {
            inner: Engine::new(Arc::new(schema), runtime, self.custom).unwrap(),
        }
    }
}

pub fn to_arguments(value: Value) -> Arguments {
    value.as_object().cloned().unwrap_or_default()
}

/// Primary keys of the entities of a value, in order.
pub fn keys(value: &ResolvedValue) -> Vec<Value> {
    value.entities().into_iter().map(|entity| entity.key.clone()).collect()
}

/// `count` posts with ids starting at 1, every post written by user 1 or 2.
pub fn posts(count: u64) -> InMemoryDataStore {
    (1..=count).fold(
        InMemoryDataStore::new()
            .insert("User", serde_json::json!({ "id": 1, "name": "Alice" }))
            .insert("User", serde_json::json!({ "id": 2, "name": "Bob" })),
        |store, id| {
            store.insert(
                "Post",
                serde_json::json!({
                    "id": id,
                    "title": format!("Post {id}"),
                    "user_id": 2 - id % 2,
                    "views": id * 10,
                }),
            )
        },
    )
}

fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

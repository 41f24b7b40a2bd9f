use std::time::Duration;

use config::Config;
use runtime::Runtime;

use crate::{
    Base64IdCodec, BcryptHasher, InMemoryBroadcaster, InMemoryDataStore, InMemoryFieldCache, LocalRuleEvaluator,
    PolicyRegistry,
};

/// Every collaborator in memory, timers on tokio.
pub struct LocalRuntime {
    pub data_store: InMemoryDataStore,
    pub authorizer: PolicyRegistry,
    pub hasher: BcryptHasher,
    pub id_codec: Base64IdCodec,
    pub rule_evaluator: LocalRuleEvaluator,
    pub field_cache: InMemoryFieldCache,
    pub broadcaster: InMemoryBroadcaster,
}

impl LocalRuntime {
    pub fn new(config: &Config) -> Self {
        LocalRuntime {
            data_store: InMemoryDataStore::new(),
            authorizer: PolicyRegistry::new(),
            hasher: BcryptHasher::new(config.hashing.cost),
            id_codec: Base64IdCodec,
            rule_evaluator: LocalRuleEvaluator,
            field_cache: InMemoryFieldCache::new(config.cache.capacity),
            broadcaster: InMemoryBroadcaster::new(),
        }
    }

    #[must_use]
    pub fn with_data_store(mut self, data_store: InMemoryDataStore) -> Self {
        self.data_store = data_store;
        self
    }

    #[must_use]
    pub fn with_authorizer(mut self, authorizer: PolicyRegistry) -> Self {
        self.authorizer = authorizer;
        self
    }

    #[must_use]
    pub fn with_field_cache(mut self, field_cache: InMemoryFieldCache) -> Self {
        self.field_cache = field_cache;
        self
    }

    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: InMemoryBroadcaster) -> Self {
        self.broadcaster = broadcaster;
        self
    }
}

impl Runtime for LocalRuntime {
    type DataStore = InMemoryDataStore;
    type Authorizer = PolicyRegistry;
    type Hasher = BcryptHasher;
    type IdCodec = Base64IdCodec;
    type RuleEvaluator = LocalRuleEvaluator;
    type FieldCache = InMemoryFieldCache;
    type Broadcaster = InMemoryBroadcaster;

    fn data_store(&self) -> &Self::DataStore {
        &self.data_store
    }

    fn authorizer(&self) -> &Self::Authorizer {
        &self.authorizer
    }

    fn hasher(&self) -> &Self::Hasher {
        &self.hasher
    }

    fn id_codec(&self) -> &Self::IdCodec {
        &self.id_codec
    }

    fn rule_evaluator(&self) -> &Self::RuleEvaluator {
        &self.rule_evaluator
    }

    fn field_cache(&self) -> &Self::FieldCache {
        &self.field_cache
    }

    fn broadcaster(&self) -> &Self::Broadcaster {
        &self.broadcaster
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

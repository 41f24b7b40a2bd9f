use runtime::{Entity, auth::Principal};
use schema::{Config, Field, Schema};

use crate::{CustomResolvers, Engine, RequestContext, Runtime};

/// Everything a single field resolution has access to.
pub(crate) struct ResolutionContext<'a, R: Runtime> {
    pub engine: &'a Engine<R>,
    pub field: &'a Field,
    pub request: &'a RequestContext,
    pub parent: Option<&'a Entity>,
}

impl<R: Runtime> Clone for ResolutionContext<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Runtime> Copy for ResolutionContext<'_, R> {}

impl<'a, R: Runtime> ResolutionContext<'a, R> {
    pub fn runtime(&self) -> &'a R {
        &self.engine.runtime
    }

    pub fn schema(&self) -> &'a Schema {
        &self.engine.schema
    }

    pub fn config(&self) -> &'a Config {
        self.engine.schema.config()
    }

    pub fn custom(&self) -> &'a CustomResolvers {
        &self.engine.custom
    }

    pub fn principal(&self) -> Option<&'a Principal> {
        self.request.principal()
    }

    pub fn with_parent(self, parent: Option<&'a Entity>) -> Self {
        ResolutionContext { parent, ..self }
    }
}

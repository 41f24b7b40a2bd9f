//! Resolves schema fields by running their directives as a pipeline: authorization, argument
//! transforms and validation, query constraints, cache, resolution strategy, eager loading and
//! broadcasting.
//!
//! Collaborators (data store, authorizer, hasher...) are reached through the [`Runtime`] bundle.
#![cfg_attr(test, allow(unused_crate_dependencies))]

mod arguments;
mod authorization;
mod broadcast;
mod cache;
mod constraints;
mod context;
mod custom;
mod eager_load;
mod engine;
mod request;
mod resolver;
mod value;

pub use custom::{CustomContext, CustomResolverFn, CustomResolvers, QueryBuilderFn};
pub use engine::{Engine, Runtime};
pub use error::{ErrorCode, ErrorPath, FieldError, FieldResult};
pub use request::RequestContext;
pub use runtime::{Arguments, Entity};
pub use schema::{FieldId, Schema, SchemaError};
pub use value::{ConnectionPageInfo, Edge, Page, PaginatorInfo, ResolvedValue, SimplePaginatorInfo};

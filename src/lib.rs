//! Repokit Library
//!
//! Generic repository layer for JSON-document entities. A [`Repository`]
//! is bound to a store [`Engine`] once through
//! [`MigrationBehavior::inject_engine`] and then serves create, query,
//! update, upsert and delete calls, each on its own [`Session`] decorated
//! by a [`SessionOption`] built from the caller's modifiers.

// Lets `#[derive(Entity)]` expand to `::repokit::...` inside this crate too.
extern crate self as repokit;

pub mod config;
pub mod context;
pub mod convert;
pub mod entity;
pub mod error;
pub mod logger;
pub mod option;
pub mod repository;
pub mod session;
pub mod store;

pub use context::Context;
pub use convert::{FromEntity, IntoEntity, for_each, from_fn, value};
pub use entity::{Entity, TableSchema};
pub use error::{ConvertError, RepoError, RepoResult, StoreError, StoreResult};
pub use option::{BoxModifier, Modifier, Plain, Scope, SessionOption, compose, modifier, scope};
pub use repokit_macros::Entity;
pub use repository::{
    CreateBehavior, DeleteBehavior, MigrationBehavior, QueryBehavior, Repository, UpdateBehavior,
    UpsertBehavior,
};
pub use session::Session;
pub use store::{Connection, Engine, MemoryEngine, PostgresEngine};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to declare an entity and drive a repository.
pub mod prelude {
    pub use crate::{
        Context, CreateBehavior, DeleteBehavior, Entity, FromEntity, IntoEntity,
        MigrationBehavior, QueryBehavior, RepoError, RepoResult, Repository, Scope,
        SessionOption, UpdateBehavior, UpsertBehavior, for_each, from_fn, scope, value,
    };
}

//! Behavior traits implemented by [`Repository`](super::Repository).
//!
//! `T` is the entity and `M` the modifier type; each call takes the
//! modifiers that configure its session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::convert::{FromEntity, IntoEntity};
use crate::error::RepoResult;
use crate::store::Engine;

#[async_trait]
pub trait CreateBehavior<T, M>: Send + Sync {
    /// Insert every entity the source yields in one store call.
    ///
    /// An empty batch succeeds without touching the store.
    async fn create<S>(&self, ctx: &Context, source: S, modifiers: &[M]) -> RepoResult<()>
    where
        S: IntoEntity<Vec<T>> + Send;
}

#[async_trait]
pub trait QueryBehavior<T, M>: Send + Sync {
    /// Forward every matching entity to `sink` in store order.
    ///
    /// The first sink error stops forwarding and is returned.
    async fn query<K>(&self, ctx: &Context, sink: &mut K, modifiers: &[M]) -> RepoResult<()>
    where
        K: FromEntity<T> + Send;
}

#[async_trait]
pub trait UpdateBehavior<T, M>: Send + Sync {
    /// Write the source's non-zero fields over every row the session
    /// matches; returns the number of rows updated.
    async fn update<S>(&self, ctx: &Context, source: S, modifiers: &[M]) -> RepoResult<u64>
    where
        S: IntoEntity<T> + Send;
}

#[async_trait]
pub trait UpsertBehavior<T, M>: Send + Sync {
    /// Insert the source when the session matches no row, update otherwise.
    async fn upsert<S>(&self, ctx: &Context, source: S, modifiers: &[M]) -> RepoResult<()>
    where
        S: IntoEntity<T> + Send;
}

#[async_trait]
pub trait DeleteBehavior<T, M>: Send + Sync {
    /// Delete every row the session matches; returns the number deleted.
    async fn delete(&self, ctx: &Context, modifiers: &[M]) -> RepoResult<u64>;
}

#[async_trait]
pub trait MigrationBehavior<T, M>: Send + Sync {
    /// Sync the entity's schema on `engine` and bind the repository to it.
    async fn inject_engine(
        &self,
        ctx: &Context,
        engine: Arc<dyn Engine>,
        modifiers: &[M],
    ) -> RepoResult<()>;
}

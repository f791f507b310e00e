//! Generic repository over an entity, a session option and its modifiers.
//!
//! A repository starts unbound. [`MigrationBehavior::inject_engine`] syncs
//! the entity's table and binds the engine; every other behavior fails with
//! [`RepoError::EngineNotBound`] until then.
//!
//! Every behavior call opens its own session: the modifiers are applied to a
//! fresh `O::default()`, the engine hands out a connection bound to the
//! call's [`Context`], and the option decorates it. The session is dropped
//! (and its connection released) when the call returns, whatever the outcome.

mod behaviors;
mod crud;
mod migration;
mod upsert;


use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

pub use behaviors::{
    CreateBehavior, DeleteBehavior, MigrationBehavior, QueryBehavior, UpdateBehavior,
    UpsertBehavior,
};

use crate::context::Context;
use crate::error::{RepoError, RepoResult};
use crate::option::{BoxModifier, Modifier, SessionOption, compose};
use crate::session::Session;
use crate::store::Engine;

/// Repository for entity `T`, sessions decorated by option `O` configured
/// through modifiers `M`.
pub struct Repository<T, O, M = BoxModifier<O>> {
    engine: OnceLock<Arc<dyn Engine>>,
    _marker: PhantomData<fn() -> (T, O, M)>,
}

impl<T, O, M> Repository<T, O, M> {
    /// An unbound repository.
    pub fn new() -> Self {
        Self {
            engine: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.engine.get().is_some()
    }

    /// The bound engine.
    pub fn engine(&self) -> RepoResult<&Arc<dyn Engine>> {
        self.engine.get().ok_or(RepoError::EngineNotBound)
    }
}

impl<T, O, M> Repository<T, O, M>
where
    O: SessionOption,
    M: Modifier<O>,
{
    /// Open one decorated session for a behavior call.
    async fn setup_session(&self, ctx: &Context, modifiers: &[M]) -> RepoResult<Session> {
        let engine = self.engine()?;
        let option: O = compose(modifiers);
        let session = Session::open(engine.as_ref(), ctx).await?;
        option.decorate(session).await
    }
}

impl<T, O, M> Default for Repository<T, O, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O, M> std::fmt::Debug for Repository<T, O, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<T>())
            .field("engine", &self.engine.get().map(|e| e.name()))
            .finish()
    }
}

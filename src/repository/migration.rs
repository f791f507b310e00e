use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::entity::Entity;
use crate::error::{RepoError, RepoResult};
use crate::option::{Modifier, SessionOption, compose};
use crate::repository::{MigrationBehavior, Repository};
use crate::session::Session;
use crate::store::Engine;

#[async_trait]
impl<T, O, M> MigrationBehavior<T, M> for Repository<T, O, M>
where
    T: Entity,
    O: SessionOption,
    M: Modifier<O>,
{
    /// The engine is bound only once sync and close succeed, so a failed
    /// call can be retried. Binding twice is an error, including when two
    /// calls race: both sync, one binds, the other gets
    /// `RepoError::EngineAlreadyBound`.
    async fn inject_engine(
        &self,
        ctx: &Context,
        engine: Arc<dyn Engine>,
        modifiers: &[M],
    ) -> RepoResult<()> {
        if self.is_bound() {
            return Err(RepoError::EngineAlreadyBound);
        }

        let option: O = compose(modifiers);
        let session = Session::open(engine.as_ref(), ctx).await?;
        let mut session = option.decorate(session).await?;
        let table = session.table_name().unwrap_or(T::TABLE).to_string();
        session.sync::<T>().await?;
        session.close().await?;

        let backend = engine.name();
        self.engine
            .set(engine)
            .map_err(|_| RepoError::EngineAlreadyBound)?;

        tracing::info!(table = %table, engine = backend, "Repository bound to engine");
        Ok(())
    }
}

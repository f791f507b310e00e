use async_trait::async_trait;

use crate::context::Context;
use crate::convert::{FromEntity, IntoEntity};
use crate::entity::Entity;
use crate::error::RepoResult;
use crate::option::{Modifier, SessionOption};
use crate::repository::{
    CreateBehavior, DeleteBehavior, QueryBehavior, Repository, UpdateBehavior,
};

#[async_trait]
impl<T, O, M> CreateBehavior<T, M> for Repository<T, O, M>
where
    T: Entity,
    O: SessionOption,
    M: Modifier<O>,
{
    async fn create<S>(&self, ctx: &Context, source: S, modifiers: &[M]) -> RepoResult<()>
    where
        S: IntoEntity<Vec<T>> + Send,
    {
        let mut session = self.setup_session(ctx, modifiers).await?;
        let rows = source.into_entity()?;
        if rows.is_empty() {
            return Ok(());
        }

        session.insert_batch(&rows).await?;
        Ok(())
    }
}

#[async_trait]
impl<T, O, M> QueryBehavior<T, M> for Repository<T, O, M>
where
    T: Entity,
    O: SessionOption,
    M: Modifier<O>,
{
    async fn query<K>(&self, ctx: &Context, sink: &mut K, modifiers: &[M]) -> RepoResult<()>
    where
        K: FromEntity<T> + Send,
    {
        let mut session = self.setup_session(ctx, modifiers).await?;
        let rows: Vec<T> = session.find().await?;
        drop(session);

        for row in rows {
            sink.from_entity(row)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T, O, M> UpdateBehavior<T, M> for Repository<T, O, M>
where
    T: Entity,
    O: SessionOption,
    M: Modifier<O>,
{
    async fn update<S>(&self, ctx: &Context, source: S, modifiers: &[M]) -> RepoResult<u64>
    where
        S: IntoEntity<T> + Send,
    {
        let mut session = self.setup_session(ctx, modifiers).await?;
        let value = source.into_entity()?;
        Ok(session.update(&value).await?)
    }
}

#[async_trait]
impl<T, O, M> DeleteBehavior<T, M> for Repository<T, O, M>
where
    T: Entity,
    O: SessionOption,
    M: Modifier<O>,
{
    async fn delete(&self, ctx: &Context, modifiers: &[M]) -> RepoResult<u64> {
        let mut session = self.setup_session(ctx, modifiers).await?;
        Ok(session.delete(&T::default()).await?)
    }
}

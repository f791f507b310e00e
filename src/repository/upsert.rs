use async_trait::async_trait;

use crate::context::Context;
use crate::convert::IntoEntity;
use crate::entity::Entity;
use crate::error::RepoResult;
use crate::option::{Modifier, SessionOption};
use crate::repository::{Repository, UpsertBehavior};

/// Count-then-branch upsert.
///
/// The existence probe is `T::default()` under the call's decoration, so
/// "exists" means "the decorated session matches at least one row". Both
/// branches run on a freshly decorated session; the insert branch therefore
/// honours table routing the same way the probe did.
///
/// A value whose fields are all zero fails the update branch with
/// `StoreError::NothingToUpdate`.
///
/// This is not atomic. Two concurrent upserts for the same logical key can
/// both see a count of zero and both insert; back the key with a unique
/// field (`#[entity(unique = "..")]`) to turn the loser into
/// `StoreError::Duplicate`.
#[async_trait]
impl<T, O, M> UpsertBehavior<T, M> for Repository<T, O, M>
where
    T: Entity,
    O: SessionOption,
    M: Modifier<O>,
{
    async fn upsert<S>(&self, ctx: &Context, source: S, modifiers: &[M]) -> RepoResult<()>
    where
        S: IntoEntity<T> + Send,
    {
        let existing = {
            let mut probe = self.setup_session(ctx, modifiers).await?;
            probe.count(&T::default()).await?
        };

        if existing == 0 {
            let value = source.into_entity()?;
            let mut session = self.setup_session(ctx, modifiers).await?;
            session.insert(&value).await?;
            tracing::debug!(table = T::TABLE, "upsert inserted");
        } else {
            let mut session = self.setup_session(ctx, modifiers).await?;
            let value = source.into_entity()?;
            let updated = session.update(&value).await?;
            tracing::debug!(
                table = T::TABLE,
                matched = existing,
                rows = updated,
                "upsert updated"
            );
        }
        Ok(())
    }
}

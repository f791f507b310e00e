//! Session options and the modifiers that configure them.
//!
//! A call's option starts as `O::default()`, every modifier the caller
//! passed is applied to it in order, and the result decorates the call's
//! base session:
//!
//! ```ignore
//! let users: Repository<User, Scope> = Repository::new();
//! users
//!     .query(&ctx, &mut rows, &[scope::eq("team", "red"), scope::limit(10)])
//!     .await?;
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{RepoError, RepoResult};
use crate::session::Session;

/// Per-call customisation of a session.
#[async_trait]
pub trait SessionOption: Default + Send + Sized + 'static {
    /// Turn the base session into the session the call runs against.
    async fn decorate(self, session: Session) -> RepoResult<Session>;
}

/// One configuration step applied to an option before decoration.
pub trait Modifier<O>: Send + Sync {
    fn apply(&self, option: &mut O);
}

impl<O, F> Modifier<O> for F
where
    F: Fn(&mut O) + Send + Sync,
{
    fn apply(&self, option: &mut O) {
        self(option)
    }
}

/// Type-erased modifier, the default modifier type of a repository.
pub type BoxModifier<O> = Box<dyn Fn(&mut O) + Send + Sync>;

/// Box a closure as a [`BoxModifier`].
pub fn modifier<O, F>(f: F) -> BoxModifier<O>
where
    F: Fn(&mut O) + Send + Sync + 'static,
{
    Box::new(f)
}

/// Apply `modifiers` in order to a fresh `O::default()`.
///
/// No reordering or deduplication happens; a later modifier may overwrite
/// what an earlier one set.
pub fn compose<O: Default, M: Modifier<O>>(modifiers: &[M]) -> O {
    let mut option = O::default();
    for modifier in modifiers {
        modifier.apply(&mut option);
    }
    option
}

/// Option that leaves the session untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plain;

#[async_trait]
impl SessionOption for Plain {
    async fn decorate(self, session: Session) -> RepoResult<Session> {
        Ok(session)
    }
}

/// Table routing, equality filters and paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub table: Option<String>,
    pub filters: Vec<(String, Value)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub descending: bool,
}

#[async_trait]
impl SessionOption for Scope {
    async fn decorate(self, session: Session) -> RepoResult<Session> {
        let mut session = match self.table {
            Some(table) if table.trim().is_empty() => {
                return Err(RepoError::decorate("scope table name must not be empty"));
            }
            Some(table) => session.table(table),
            None => session,
        };

        for (field, value) in self.filters {
            session = session.filter(field, value);
        }
        if let Some(limit) = self.limit {
            session = session.limit(limit);
        }
        if let Some(offset) = self.offset {
            session = session.offset(offset);
        }
        if self.descending {
            session = session.descending();
        }
        Ok(session)
    }
}

/// Modifier constructors for [`Scope`].
pub mod scope {
    use serde_json::Value;

    use super::{BoxModifier, Scope, modifier};

    /// Route the call to `name`.
    pub fn table(name: impl Into<String>) -> BoxModifier<Scope> {
        let name = name.into();
        modifier(move |scope: &mut Scope| scope.table = Some(name.clone()))
    }

    /// Require `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> BoxModifier<Scope> {
        let field = field.into();
        let value = value.into();
        modifier(move |scope: &mut Scope| scope.filters.push((field.clone(), value.clone())))
    }

    pub fn limit(limit: u64) -> BoxModifier<Scope> {
        modifier(move |scope: &mut Scope| scope.limit = Some(limit))
    }

    pub fn offset(offset: u64) -> BoxModifier<Scope> {
        modifier(move |scope: &mut Scope| scope.offset = Some(offset))
    }

    pub fn descending() -> BoxModifier<Scope> {
        modifier(|scope: &mut Scope| scope.descending = true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::store::MemoryEngine;
    use serde_json::json;

    #[test]
    fn test_compose_without_modifiers_is_default() {
        let none: &[BoxModifier<Scope>] = &[];
        let option: Scope = compose(none);
        assert_eq!(option, Scope::default());
    }

    #[test]
    fn test_compose_applies_in_order() {
        let modifiers = vec![scope::limit(5), scope::eq("a", 1), scope::limit(7), scope::eq("a", 2)];
        let option: Scope = compose(&modifiers);

        assert_eq!(option.limit, Some(7));
        assert_eq!(
            option.filters,
            vec![("a".to_string(), json!(1)), ("a".to_string(), json!(2))]
        );
    }

    #[test]
    fn test_plain_closures_are_modifiers() {
        let set_offset = |s: &mut Scope| s.offset = Some(3);
        let option: Scope = compose(&[set_offset]);
        assert_eq!(option.offset, Some(3));
        assert!(!option.descending);

        fn newest_first(s: &mut Scope) {
            s.descending = true;
        }
        let option: Scope = compose(&[newest_first as fn(&mut Scope)]);
        assert!(option.descending);
    }

    #[tokio::test]
    async fn test_scope_decorates_session() {
        let engine = MemoryEngine::new();
        let session = Session::open(&engine, &Context::background()).await.unwrap();

        let option: Scope = compose(&[scope::table("archive"), scope::eq("a", 1), scope::eq("a", 2)]);
        let session = option.decorate(session).await.unwrap();

        assert_eq!(session.table_name(), Some("archive"));
        // Later filters on the same field win
        assert_eq!(session.conditions().get("a"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_scope_rejects_empty_table() {
        let engine = MemoryEngine::new();
        let session = Session::open(&engine, &Context::background()).await.unwrap();

        let result = compose::<Scope, _>(&[scope::table("  ")]).decorate(session).await;
        assert!(matches!(result, Err(RepoError::Decorate { .. })));
    }

    #[tokio::test]
    async fn test_plain_leaves_session_untouched() {
        let engine = MemoryEngine::new();
        let session = Session::open(&engine, &Context::background()).await.unwrap();

        let session = Plain.decorate(session).await.unwrap();
        assert_eq!(session.table_name(), None);
        assert!(session.conditions().is_empty());
    }
}

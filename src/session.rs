//! Sessions: one acquired connection plus the decoration an option applied.
//!
//! A session is opened for exactly one repository call and owns its
//! connection; dropping it releases the connection on every exit path.

use serde_json::Value;

use crate::context::Context;
use crate::entity::{Entity, to_document};
use crate::error::{StoreError, StoreResult};
use crate::store::{Connection, Document, Engine, Statement, non_zero_fields};

/// A context-bound connection with per-call decoration.
///
/// Options decorate a session through the consuming builder methods
/// ([`table`](Self::table), [`filter`](Self::filter), ...). The typed
/// primitives then run against the decorated statement, each raced against
/// the session's [`Context`].
pub struct Session {
    conn: Box<dyn Connection>,
    ctx: Context,
    table: Option<String>,
    conditions: Document,
    limit: Option<u64>,
    offset: Option<u64>,
    descending: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("table", &self.table)
            .field("conditions", &self.conditions)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("descending", &self.descending)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Acquire a connection from `engine` under `ctx`.
    pub async fn open(engine: &dyn Engine, ctx: &Context) -> StoreResult<Self> {
        let conn = ctx.run(engine.connect()).await?;
        Ok(Self::new(conn, ctx.clone()))
    }

    /// Undecorated session over an already acquired connection.
    pub fn new(conn: Box<dyn Connection>, ctx: Context) -> Self {
        Self {
            conn,
            ctx,
            table: None,
            conditions: Document::new(),
            limit: None,
            offset: None,
            descending: false,
        }
    }

    /// Route every operation to `name` instead of the entity's table.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Add an equality condition; a later filter on the same field replaces
    /// the earlier one.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Return rows newest first.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Table override, if any.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn conditions(&self) -> &Document {
        &self.conditions
    }

    fn table_for<T: Entity>(&self) -> &str {
        self.table.as_deref().unwrap_or(T::TABLE)
    }

    /// Template fields that are non-zero, then the session's own conditions
    /// on top (the session wins on a shared field).
    fn statement<T: Entity>(&self, template: Option<&T>) -> StoreResult<Statement> {
        let table = self.table_for::<T>().to_string();
        let mut conditions = match template {
            Some(template) => non_zero_fields(to_document(&table, template)?),
            None => Document::new(),
        };
        for (field, value) in &self.conditions {
            conditions.insert(field.clone(), value.clone());
        }

        Ok(Statement {
            table,
            conditions,
            limit: self.limit,
            offset: self.offset,
            descending: self.descending,
        })
    }

    /// Every row matching the session's conditions, in row order.
    pub async fn find<T: Entity>(&mut self) -> StoreResult<Vec<T>> {
        let stmt = self.statement::<T>(None)?;
        let docs = self.ctx.run(self.conn.find(&stmt)).await?;
        tracing::debug!(table = %stmt.table, rows = docs.len(), "find");

        docs.into_iter()
            .map(|doc| serde_json::from_value(Value::Object(doc)).map_err(StoreError::from))
            .collect()
    }

    /// Insert all rows in one store call. An empty slice is a no-op.
    pub async fn insert_batch<T: Entity>(&mut self, rows: &[T]) -> StoreResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let table = self.table_for::<T>().to_string();
        let docs = rows
            .iter()
            .map(|row| to_document(&table, row))
            .collect::<StoreResult<Vec<_>>>()?;

        let inserted = self.ctx.run(self.conn.insert(&table, docs)).await?;
        tracing::debug!(table = %table, rows = inserted, "insert");
        Ok(inserted)
    }

    pub async fn insert<T: Entity>(&mut self, row: &T) -> StoreResult<u64> {
        self.insert_batch(std::slice::from_ref(row)).await
    }

    /// Write the non-zero fields of `value` over every row matching the
    /// session's conditions.
    ///
    /// The patch always reaches the connection; engines reject an empty one
    /// with `StoreError::NothingToUpdate`.
    pub async fn update<T: Entity>(&mut self, value: &T) -> StoreResult<u64> {
        let stmt = self.statement::<T>(None)?;
        let patch = non_zero_fields(to_document(&stmt.table, value)?);
        let updated = self.ctx.run(self.conn.update(&stmt, patch)).await?;
        tracing::debug!(table = %stmt.table, rows = updated, "update");
        Ok(updated)
    }

    /// Delete every row matching `template` and the session's conditions.
    pub async fn delete<T: Entity>(&mut self, template: &T) -> StoreResult<u64> {
        let stmt = self.statement(Some(template))?;
        let deleted = self.ctx.run(self.conn.delete(&stmt)).await?;
        tracing::debug!(table = %stmt.table, rows = deleted, "delete");
        Ok(deleted)
    }

    pub async fn count<T: Entity>(&mut self, template: &T) -> StoreResult<u64> {
        let stmt = self.statement(Some(template))?;
        self.ctx.run(self.conn.count(&stmt)).await
    }

    /// Create the entity's table (under the session's routing) and its
    /// unique indexes when missing.
    pub async fn sync<T: Entity>(&mut self) -> StoreResult<()> {
        let schema = match &self.table {
            Some(table) => T::schema().routed(table),
            None => T::schema(),
        };
        self.ctx.run(self.conn.sync(&schema)).await?;
        tracing::debug!(table = %schema.name, unique = ?schema.unique, "sync");
        Ok(())
    }

    /// Release the connection and report failures.
    pub async fn close(self) -> StoreResult<()> {
        let Session { conn, ctx, .. } = self;
        ctx.run(conn.close()).await
    }
}

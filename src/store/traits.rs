//! Engine and Connection trait definitions.

use async_trait::async_trait;

use crate::entity::TableSchema;
use crate::error::StoreResult;
use crate::store::{Document, Statement};

/// A backing store a repository can be bound to.
///
/// All engines must implement this trait; repositories hold it as
/// `Arc<dyn Engine>`.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Acquire a connection for one session.
    async fn connect(&self) -> StoreResult<Box<dyn Connection>>;
}

/// One acquired store connection.
///
/// Dropping the connection releases it; `close` does the same and reports
/// failures.
#[async_trait]
pub trait Connection: Send {
    /// Documents matching the statement, ordered by row id.
    async fn find(&mut self, stmt: &Statement) -> StoreResult<Vec<Document>>;

    /// Insert all documents in one operation; returns the number inserted.
    async fn insert(&mut self, table: &str, rows: Vec<Document>) -> StoreResult<u64>;

    /// Merge `patch` into every matching document; returns the number updated.
    async fn update(&mut self, stmt: &Statement, patch: Document) -> StoreResult<u64>;

    /// Delete every matching document; returns the number deleted.
    async fn delete(&mut self, stmt: &Statement) -> StoreResult<u64>;

    /// Count matching documents.
    async fn count(&mut self, stmt: &Statement) -> StoreResult<u64>;

    /// Create the table and its unique indexes when missing.
    async fn sync(&mut self, schema: &TableSchema) -> StoreResult<()>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> StoreResult<()>;
}

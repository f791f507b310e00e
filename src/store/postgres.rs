//! PostgreSQL engine.
//!
//! Every entity table has the same layout: a `BIGSERIAL` row id that fixes
//! insertion order and one `JSONB` column holding the document. Conditions
//! are bound as a single JSON object and matched with `data @> $1`.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use diesel::sql_types::{BigInt, Jsonb};
use diesel::QueryableByName;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use regex::Regex;
use serde_json::Value;

use crate::config::settings::DatabaseConfig;
use crate::entity::TableSchema;
use crate::error::{ConstraintParser, DatabaseErrorConverter, StoreError, StoreResult};
use crate::store::{Connection, Document, Engine, Statement};

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap.
pub type PgPool = Pool<AsyncPgConnection>;

/// PostgreSQL identifiers are limited to 63 bytes
const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Renders the SQL the engine runs.
///
/// Table and field names are validated and double-quoted; values are always
/// bound as parameters.
pub struct SqlBuilder;

impl SqlBuilder {
    /// Validate `name` and return it double-quoted.
    pub fn quote_ident(name: &str) -> StoreResult<String> {
        if name.len() > MAX_IDENTIFIER_LEN || !identifier_pattern().is_match(name) {
            return Err(StoreError::invalid_identifier(name));
        }
        Ok(format!("\"{}\"", name))
    }

    /// `$1` is the conditions object.
    pub fn select(stmt: &Statement) -> StoreResult<String> {
        let mut sql = format!(
            "SELECT data FROM {} WHERE data @> $1 ORDER BY id {}",
            Self::quote_ident(&stmt.table)?,
            if stmt.descending { "DESC" } else { "ASC" }
        );
        // LIMIT and OFFSET take a bigint
        if let Some(limit) = stmt.limit {
            sql.push_str(&format!(" LIMIT {}", limit.min(i64::MAX as u64)));
        }
        if let Some(offset) = stmt.offset {
            sql.push_str(&format!(" OFFSET {}", offset.min(i64::MAX as u64)));
        }
        Ok(sql)
    }

    /// `$1` is a JSON array of documents, inserted in array order.
    pub fn insert(table: &str) -> StoreResult<String> {
        Ok(format!(
            "INSERT INTO {} (data) SELECT elem FROM jsonb_array_elements($1) \
             WITH ORDINALITY AS batch(elem, pos) ORDER BY pos",
            Self::quote_ident(table)?
        ))
    }

    /// `$1` is the conditions object, `$2` the patch merged into matches.
    pub fn update(table: &str) -> StoreResult<String> {
        Ok(format!(
            "UPDATE {} SET data = data || $2 WHERE data @> $1",
            Self::quote_ident(table)?
        ))
    }

    pub fn delete(table: &str) -> StoreResult<String> {
        Ok(format!(
            "DELETE FROM {} WHERE data @> $1",
            Self::quote_ident(table)?
        ))
    }

    pub fn count(table: &str) -> StoreResult<String> {
        Ok(format!(
            "SELECT COUNT(*) AS count FROM {} WHERE data @> $1",
            Self::quote_ident(table)?
        ))
    }

    pub fn create_table(table: &str) -> StoreResult<String> {
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, data JSONB NOT NULL)",
            Self::quote_ident(table)?
        ))
    }

    pub fn create_unique_index(table: &str, field: &str) -> StoreResult<String> {
        // The field doubles as a string literal, so it must pass the same check
        Self::quote_ident(field)?;
        Ok(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ((data ->> '{}'))",
            Self::quote_ident(&ConstraintParser::unique_index_name(table, field))?,
            Self::quote_ident(table)?,
            field
        ))
    }
}

#[derive(QueryableByName)]
struct DocumentRow {
    #[diesel(sql_type = Jsonb)]
    data: Value,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Engine backed by a bb8 pool of diesel-async PostgreSQL connections.
#[derive(Clone)]
pub struct PostgresEngine {
    pool: PgPool,
}

impl PostgresEngine {
    /// Build a connection pool from the database settings.
    ///
    /// # Errors
    ///
    /// - `StoreError::Pool` - If `url` is missing or the pool cannot be built
    pub async fn new(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| StoreError::pool("database.url is required for the postgres backend"))?;

        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_connections))
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(manager)
            .await
            .map_err(|e| StoreError::pool(e.to_string()))?;

        tracing::debug!(
            max_connections = config.max_connections,
            "PostgreSQL connection pool ready"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Engine for PostgresEngine {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn connect(&self) -> StoreResult<Box<dyn Connection>> {
        let conn = self
            .pool
            .get_owned()
            .await
            .map_err(|e| StoreError::pool(e.to_string()))?;
        Ok(Box::new(PostgresConnection { conn }))
    }
}

/// A pooled connection; dropping it returns the connection to the pool.
pub struct PostgresConnection {
    conn: PooledConnection<'static, AsyncPgConnection>,
}

impl PostgresConnection {
    async fn execute(&mut self, sql: String, operation: &str, table: &str) -> StoreResult<()> {
        diesel::sql_query(sql)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, operation, table))?;
        Ok(())
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn find(&mut self, stmt: &Statement) -> StoreResult<Vec<Document>> {
        let rows = diesel::sql_query(SqlBuilder::select(stmt)?)
            .bind::<Jsonb, _>(stmt.filter_value())
            .load::<DocumentRow>(&mut *self.conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find", &stmt.table))?;

        rows.into_iter()
            .map(|row| match row.data {
                Value::Object(map) => Ok(map),
                _ => Err(StoreError::InvalidDocument {
                    table: stmt.table.clone(),
                }),
            })
            .collect()
    }

    async fn insert(&mut self, table: &str, rows: Vec<Document>) -> StoreResult<u64> {
        let batch = Value::Array(rows.into_iter().map(Value::Object).collect());
        let inserted = diesel::sql_query(SqlBuilder::insert(table)?)
            .bind::<Jsonb, _>(batch)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert", table))?;
        Ok(inserted as u64)
    }

    async fn update(&mut self, stmt: &Statement, patch: Document) -> StoreResult<u64> {
        if patch.is_empty() {
            return Err(StoreError::nothing_to_update(&stmt.table));
        }
        let updated = diesel::sql_query(SqlBuilder::update(&stmt.table)?)
            .bind::<Jsonb, _>(stmt.filter_value())
            .bind::<Jsonb, _>(Value::Object(patch))
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update", &stmt.table))?;
        Ok(updated as u64)
    }

    async fn delete(&mut self, stmt: &Statement) -> StoreResult<u64> {
        let deleted = diesel::sql_query(SqlBuilder::delete(&stmt.table)?)
            .bind::<Jsonb, _>(stmt.filter_value())
            .execute(&mut *self.conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "delete", &stmt.table))?;
        Ok(deleted as u64)
    }

    async fn count(&mut self, stmt: &Statement) -> StoreResult<u64> {
        let row = diesel::sql_query(SqlBuilder::count(&stmt.table)?)
            .bind::<Jsonb, _>(stmt.filter_value())
            .get_result::<CountRow>(&mut *self.conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "count", &stmt.table))?;
        Ok(row.count.max(0) as u64)
    }

    async fn sync(&mut self, schema: &TableSchema) -> StoreResult<()> {
        self.execute(SqlBuilder::create_table(&schema.name)?, "sync", &schema.name)
            .await?;
        for field in &schema.unique {
            let sql = SqlBuilder::create_unique_index(&schema.name, field)?;
            self.execute(sql, "sync", &schema.name).await?;
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<()> {
        drop(self.conn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_ident_accepts_plain_names() {
        assert_eq!(SqlBuilder::quote_ident("users").unwrap(), "\"users\"");
        assert_eq!(SqlBuilder::quote_ident("_audit_2024").unwrap(), "\"_audit_2024\"");
    }

    #[test]
    fn test_quote_ident_rejects_injection() {
        for name in ["", "1users", "users; DROP TABLE x", "a\"b", "na'me", "a-b"] {
            assert!(
                matches!(SqlBuilder::quote_ident(name), Err(StoreError::InvalidIdentifier { .. })),
                "{:?} should be rejected",
                name
            );
        }
        let long = "a".repeat(64);
        assert!(SqlBuilder::quote_ident(&long).is_err());
        assert!(SqlBuilder::quote_ident(&long[..63]).is_ok());
    }

    #[test]
    fn test_select_with_paging() {
        let mut stmt = Statement::new("users");
        stmt.conditions.insert("name".into(), json!("a"));
        assert_eq!(
            SqlBuilder::select(&stmt).unwrap(),
            "SELECT data FROM \"users\" WHERE data @> $1 ORDER BY id ASC"
        );

        stmt.descending = true;
        stmt.limit = Some(10);
        stmt.offset = Some(20);
        assert_eq!(
            SqlBuilder::select(&stmt).unwrap(),
            "SELECT data FROM \"users\" WHERE data @> $1 ORDER BY id DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_select_clamps_paging_to_bigint() {
        let mut stmt = Statement::new("users");
        stmt.limit = Some(u64::MAX);
        stmt.offset = Some(i64::MAX as u64 + 1);
        assert_eq!(
            SqlBuilder::select(&stmt).unwrap(),
            format!(
                "SELECT data FROM \"users\" WHERE data @> $1 ORDER BY id ASC LIMIT {} OFFSET {}",
                i64::MAX,
                i64::MAX
            )
        );
    }

    #[test]
    fn test_write_statements() {
        assert_eq!(
            SqlBuilder::update("users").unwrap(),
            "UPDATE \"users\" SET data = data || $2 WHERE data @> $1"
        );
        assert_eq!(
            SqlBuilder::delete("users").unwrap(),
            "DELETE FROM \"users\" WHERE data @> $1"
        );
        assert_eq!(
            SqlBuilder::count("users").unwrap(),
            "SELECT COUNT(*) AS count FROM \"users\" WHERE data @> $1"
        );
        assert!(SqlBuilder::insert("users").unwrap().contains("WITH ORDINALITY"));
    }

    #[test]
    fn test_schema_statements() {
        assert_eq!(
            SqlBuilder::create_table("users").unwrap(),
            "CREATE TABLE IF NOT EXISTS \"users\" (id BIGSERIAL PRIMARY KEY, data JSONB NOT NULL)"
        );
        assert_eq!(
            SqlBuilder::create_unique_index("users", "email").unwrap(),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"users_email_key\" ON \"users\" ((data ->> 'email'))"
        );
        assert!(SqlBuilder::create_unique_index("users", "em'ail").is_err());
    }

    #[test]
    fn test_invalid_table_never_reaches_sql() {
        let stmt = Statement::new("users\"; --");
        assert!(SqlBuilder::select(&stmt).is_err());
        assert!(SqlBuilder::create_table("bad name").is_err());
    }
}

//! Entity contract.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// A record type a repository manages.
///
/// Entities are stored as JSON documents, one row per entity. `Default` is
/// the zero value: it is the delete template and the upsert existence probe,
/// and since every field is zero it adds no condition to either.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Debug, Default, Serialize, Deserialize, Entity)]
/// #[entity(table = "users", unique = "email")]
/// struct User { id: i64, email: String }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Table the entity lives in unless a session routes it elsewhere
    const TABLE: &'static str;

    /// Fields schema sync backs with a unique index
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Schema description handed to `Connection::sync`.
    fn schema() -> TableSchema {
        TableSchema {
            name: Self::TABLE.to_string(),
            unique: Self::unique_fields().iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Table layout synchronised by migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub unique: Vec<String>,
}

impl TableSchema {
    /// Same layout under another table name.
    pub fn routed(mut self, table: &str) -> Self {
        self.name = table.to_string();
        self
    }
}

/// Serialize an entity into the JSON object stored for it.
pub(crate) fn to_document<T: Serialize>(table: &str, value: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidDocument {
            table: table.to_string(),
        }),
    }
}

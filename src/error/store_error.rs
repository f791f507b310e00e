use thiserror::Error;

/// Errors raised by store engines and sessions.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection pool could not be built or could not hand out a connection
    #[error("Connection pool error: {message}")]
    Pool { message: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Unique index violation
    #[error("Duplicate entry: {table}.{field} = '{value}' already exists")]
    Duplicate {
        table: String,
        field: String,
        value: String,
    },

    /// The table was never synchronised
    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    /// Table or field name that cannot be used as an SQL identifier
    #[error("Invalid identifier '{name}'")]
    InvalidIdentifier { name: String },

    /// An update value had no non-zero field to write
    #[error("Nothing to update in table {table}: every field of the value is zero")]
    NothingToUpdate { table: String },

    /// A record did not serialize to a JSON object
    #[error("Record for table {table} is not a JSON object")]
    InvalidDocument { table: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The call's context was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// The call's context deadline passed
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl StoreError {
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool {
            message: message.into(),
        }
    }

    pub fn database(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Database {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    pub fn nothing_to_update(table: impl Into<String>) -> Self {
        Self::NothingToUpdate {
            table: table.into(),
        }
    }

    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

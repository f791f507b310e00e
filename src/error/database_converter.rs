use crate::error::{ConstraintParser, StoreError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Utility for converting Diesel errors raised by the PostgreSQL engine into
/// structured `StoreError` variants.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate StoreError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    /// * `table` - The table the operation targeted
    ///
    /// # Returns
    /// A StoreError variant appropriate for the type of database error
    pub fn convert_diesel_error(error: DieselError, operation: &str, table: &str) -> StoreError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info, operation, table)
            }
            other => StoreError::database(operation, other),
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: Box<dyn diesel::result::DatabaseErrorInformation + Send + Sync>,
        operation: &str,
        table: &str,
    ) -> StoreError {
        let message = info.message();
        let detail = info.details().unwrap_or_default();
        let full_message = format!("{}\nDETAIL: {}", message, detail);

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                match ConstraintParser::parse_unique_violation(
                    table,
                    &full_message,
                    info.constraint_name(),
                ) {
                    Some((field, value)) => StoreError::Duplicate {
                        table: table.to_string(),
                        field,
                        value,
                    },
                    None => StoreError::database(
                        operation,
                        anyhow::Error::msg(format!("Unique constraint violation: {}", message)),
                    ),
                }
            }
            // 42P01 undefined_table surfaces as Unknown with this message shape
            _ if message.contains("does not exist") && message.contains("relation") => {
                StoreError::table_not_found(table)
            }
            _ => StoreError::database(
                operation,
                anyhow::Error::msg(format!("Database error: {}", message)),
            ),
        }
    }
}

//! Error types for repositories, conversion adapters and store engines.

mod constraint_parser;
mod database_converter;
mod repo_error;
mod store_error;

pub use constraint_parser::ConstraintParser;
pub use database_converter::DatabaseErrorConverter;
pub use repo_error::{ConvertError, RepoError, RepoResult};
pub use store_error::{StoreError, StoreResult};

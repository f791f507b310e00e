//! Builds the engine selected by configuration.

use std::sync::Arc;

use crate::config::settings::{DatabaseConfig, StoreBackend};
use crate::error::StoreResult;
use crate::store::{Engine, MemoryEngine, PostgresEngine};

/// Build the configured engine.
///
/// The result is what `MigrationBehavior::inject_engine` expects; clone the
/// `Arc` to share one engine between repositories.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn Engine>> {
    let engine: Arc<dyn Engine> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryEngine::new()),
        StoreBackend::Postgres => Arc::new(PostgresEngine::new(config).await?),
    };

    tracing::info!(backend = engine.name(), "Store engine ready");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let engine = connect(&DatabaseConfig::default()).await.unwrap();
        assert_eq!(engine.name(), "memory");
    }

    #[tokio::test]
    async fn test_connect_postgres_without_url_fails() {
        let config = DatabaseConfig {
            backend: StoreBackend::Postgres,
            ..Default::default()
        };
        let result = connect(&config).await;
        assert!(matches!(result, Err(StoreError::Pool { .. })));
    }
}

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use anyhow::{Result, bail};

use crate::config::PersistenceConfig;
use crate::persistence::PersistenceLayer;

/// Build the persistence provider named in the configuration.
pub async fn connect(config: &PersistenceConfig) -> Result<Arc<dyn PersistenceLayer>> {
    match config.provider.as_str() {
        "postgres" => {
            if config.database_url.trim().is_empty() {
                bail!("persistence.database_url is required for the postgres provider");
            }
            let provider =
                postgres::PostgresProvider::new(&config.database_url, config.max_connections)
                    .await?;
            Ok(Arc::new(provider))
        }
        "memory" => {
            let provider = match config.seed_file.as_deref().filter(|p| !p.trim().is_empty()) {
                Some(path) => memory::MemoryProvider::from_seed_file(path)?,
                None => memory::MemoryProvider::new(),
            };
            Ok(Arc::new(provider))
        }
        other => bail!("unknown persistence provider '{other}' (expected 'memory' or 'postgres')"),
    }
}

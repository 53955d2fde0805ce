//! Database Config

use std::time::Duration;

use clap::Args;

use bookstore_app::database::PoolSettings;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10_u32)]
    pub database_max_connections: u32,

    /// Seconds to wait for a free pooled connection
    #[arg(long, env = "DATABASE_ACQUIRE_TIMEOUT_SECONDS", default_value_t = 5_u64)]
    pub database_acquire_timeout_seconds: u64,

    /// Apply pending migrations before serving
    #[arg(long, env = "DATABASE_RUN_MIGRATIONS", default_value_t = false)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Pool sizing derived from the configured limits.
    #[must_use]
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.database_max_connections,
            acquire_timeout: Duration::from_secs(self.database_acquire_timeout_seconds),
        }
    }
}

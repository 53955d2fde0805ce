//! Application Environment Config

use clap::Args;

/// Where the server is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AppEnv {
    /// Local development. Error responses carry internal detail.
    Development,

    /// Production. Internal detail is only logged.
    Production,
}

impl AppEnv {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Deployment environment settings.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Deployment environment (development, production)
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = AppEnv::Production)]
    pub app_env: AppEnv,
}

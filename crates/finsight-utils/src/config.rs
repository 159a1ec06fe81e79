//! Process-level configuration

use serde::{Deserialize, Serialize};

/// Environment variable naming the deployment environment
const ENV_VAR: &str = "FINSIGHT_ENV";

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name, used in logs and provenance
    pub app_name: String,
    /// Deployment environment (development, production)
    pub environment: String,
    /// Emit JSON logs instead of human-readable output
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "finsight".to_string(),
            environment: "development".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Build from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let environment =
            std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string());
        let json_logs = environment == "production";
        Self {
            environment,
            json_logs,
            ..Self::default()
        }
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

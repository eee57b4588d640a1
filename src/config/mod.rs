/// Configuration management for the Planweave backend
///
/// Handles server binding, database location, and reasoning-service settings.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Reasoning service configuration
    pub planner: PlannerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection string (default: "sqlite://planweave.db?mode=rwc")
    pub url: String,
}

/// Reasoning service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// API key for the Anthropic Messages API
    pub api_key: String,
    /// Service base URL, overridable for proxies and tests
    pub base_url: String,
    /// Model identifier used for plan generation
    pub model: String,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("PLANWEAVE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("PLANWEAVE_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            database: DatabaseConfig {
                url: std::env::var("PLANWEAVE_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://planweave.db?mode=rwc".to_string()),
            },
            planner: PlannerConfig {
                api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
                base_url: std::env::var("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
                model: std::env::var("PLANWEAVE_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string()),
            },
        }
    }
}

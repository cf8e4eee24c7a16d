use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the public scoreboard API
    pub scoreboard_base_url: String,

    /// Per-request timeout in seconds for both upstream APIs
    pub request_timeout_secs: u64,

    /// SQLite database path for persisted dashboard state
    pub database_url: String,

    /// Odds gateway URL seeded into state when none was saved yet
    pub odds_gateway_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            scoreboard_base_url: env::var("SCOREBOARD_BASE_URL")
                .unwrap_or_else(|_| "https://site.web.api.espn.com/apis/v2/sports".to_string()),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a valid number")?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/prop-tracker.db".to_string()),

            odds_gateway_url: env::var("ODDS_GATEWAY_URL").ok(),
        })
    }
}

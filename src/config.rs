//! Configuration loading from environment.
//!
//! Everything has a sensible default so the service can run against a local
//! SQLite file with no configuration at all.

use std::env;

use crate::error::{RedressalError, Result};

/// Default path of the SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "data/redressal.db";

/// Default caseload ceiling for newly registered admins.
pub const DEFAULT_MAX_CASE_LOAD: u32 = 50;

/// How many times to retry generating a tracking token on collision.
pub const DEFAULT_TOKEN_ATTEMPTS: u32 = 10;

/// Main configuration for the redressal service.
#[derive(Debug, Clone)]
pub struct RedressalConfig {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Caseload ceiling applied when a registration does not specify one.
    pub default_max_case_load: u32,
    /// Token generation retry budget.
    pub token_attempts: u32,
}

impl RedressalConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `DATABASE_PATH`: SQLite file path (default: `data/redressal.db`)
    /// - `DEFAULT_MAX_CASE_LOAD`: default admin caseload ceiling (default: 50)
    /// - `TOKEN_ATTEMPTS`: tracking-token retry budget (default: 10)
    pub fn from_env() -> Result<Self> {
        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());

        let default_max_case_load = match env::var("DEFAULT_MAX_CASE_LOAD") {
            Ok(s) => s.parse::<u32>().map_err(|_| {
                RedressalError::Config(format!("DEFAULT_MAX_CASE_LOAD is not a number: {}", s))
            })?,
            Err(_) => DEFAULT_MAX_CASE_LOAD,
        };
        if default_max_case_load == 0 {
            return Err(RedressalError::Config(
                "DEFAULT_MAX_CASE_LOAD must be positive".to_string(),
            ));
        }

        let token_attempts = env::var("TOKEN_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_ATTEMPTS);

        Ok(Self {
            database_path,
            default_max_case_load,
            token_attempts,
        })
    }
}

impl Default for RedressalConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            default_max_case_load: DEFAULT_MAX_CASE_LOAD,
            token_attempts: DEFAULT_TOKEN_ATTEMPTS,
        }
    }
}

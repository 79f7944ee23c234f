//! Process configuration, read once at startup and handed to the services as plain values.

use std::{env, str::FromStr};

use tracing::{info, warn};

use crate::round::models::RoundSettings;
use crate::user::ParticipantRules;

/// Seconds between round creation and round start when `COOLDOWN_DURATION` is unset.
const DEFAULT_COOLDOWN_SECS: u64 = 60;
/// Round length in seconds when `ROUND_DURATION` is unset.
const DEFAULT_ROUND_SECS: u64 = 300;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub round_settings: RoundSettings,
    pub rules: ParticipantRules,
    pub jwt_secret: String,
    /// Postgres connection string; the in-memory stores are used when absent.
    pub database_url: Option<String>,
    pub bind_addr: String,
}

impl AppConfig {
    /// Build the configuration from the process environment, falling back to defaults per key.
    pub fn from_env() -> Self {
        let cooldown_secs = parse_var("COOLDOWN_DURATION", DEFAULT_COOLDOWN_SECS);
        let round_secs = parse_var("ROUND_DURATION", DEFAULT_ROUND_SECS);

        let defaults = ParticipantRules::default();
        let rules = ParticipantRules {
            ghost_role: string_var("GHOST_ROLE").unwrap_or(defaults.ghost_role),
            excluded_username: string_var("EXCLUDED_USERNAME")
                .unwrap_or(defaults.excluded_username),
            admin_role: string_var("ADMIN_ROLE").unwrap_or(defaults.admin_role),
        };

        let config = Self {
            round_settings: RoundSettings::from_secs(cooldown_secs, round_secs),
            rules,
            jwt_secret: string_var("JWT_SECRET")
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            database_url: string_var("DATABASE_URL"),
            bind_addr: string_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        };

        info!(
            cooldown_secs,
            round_secs,
            ghost_role = %config.rules.ghost_role,
            postgres = config.database_url.is_some(),
            "loaded configuration from environment"
        );
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            round_settings: RoundSettings::from_secs(DEFAULT_COOLDOWN_SECS, DEFAULT_ROUND_SECS),
            rules: ParticipantRules::default(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

/// Non-empty value of `key`, if set.
fn string_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse `key`, warning and keeping `default` when the value does not parse.
fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match string_var(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    key,
                    value = %raw,
                    error = %err,
                    fallback = %default,
                    "failed to parse environment value; using default"
                );
                default
            }
        },
        None => default,
    }
}

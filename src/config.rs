use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{EngineSettings, RecommendationLimits};
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    pub collection: CollectionSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub recommendation: RecommendationSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub listings: String,
    pub rental_preferences: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSettings {
    #[serde(default = "default_content_pool")]
    pub content_pool: usize,
    #[serde(default = "default_content_top")]
    pub content_top: usize,
    #[serde(default = "default_strategy_limit")]
    pub trending_limit: usize,
    #[serde(default = "default_strategy_limit")]
    pub verified_limit: usize,
    #[serde(default = "default_merged_limit")]
    pub merged_limit: usize,
    #[serde(default = "default_trending_window_days")]
    pub trending_window_days: i64,
    #[serde(default = "default_comparable_limit")]
    pub comparable_limit: usize,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
    #[serde(default = "default_candidate_fetch_limit")]
    pub candidate_fetch_limit: usize,
    #[serde(default = "default_algorithm_version")]
    pub algorithm_version: String,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            content_pool: default_content_pool(),
            content_top: default_content_top(),
            trending_limit: default_strategy_limit(),
            verified_limit: default_strategy_limit(),
            merged_limit: default_merged_limit(),
            trending_window_days: default_trending_window_days(),
            comparable_limit: default_comparable_limit(),
            max_age_hours: default_max_age_hours(),
            candidate_fetch_limit: default_candidate_fetch_limit(),
            algorithm_version: default_algorithm_version(),
        }
    }
}

impl RecommendationSettings {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            limits: RecommendationLimits {
                content_pool: self.content_pool,
                content_top: self.content_top,
                trending: self.trending_limit,
                verified: self.verified_limit,
                merged: self.merged_limit,
                trending_window_days: self.trending_window_days,
            },
            comparable_limit: self.comparable_limit,
            max_age: chrono::Duration::hours(self.max_age_hours),
            algorithm_version: self.algorithm_version.clone(),
        }
    }
}

fn default_content_pool() -> usize { 100 }
fn default_content_top() -> usize { 30 }
fn default_strategy_limit() -> usize { 10 }
fn default_merged_limit() -> usize { 50 }
fn default_trending_window_days() -> i64 { 30 }
fn default_comparable_limit() -> usize { 50 }
fn default_max_age_hours() -> i64 { 24 }
fn default_candidate_fetch_limit() -> usize { 500 }
fn default_algorithm_version() -> String { crate::core::engine::DEFAULT_ALGORITHM_VERSION.to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_price_weight")]
    pub price: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_rooms_weight")]
    pub rooms: f64,
    #[serde(default = "default_amenities_weight")]
    pub amenities: f64,
    #[serde(default = "default_bonus_weight")]
    pub bonus: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            price: default_price_weight(),
            location: default_location_weight(),
            rooms: default_rooms_weight(),
            amenities: default_amenities_weight(),
            bonus: default_bonus_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(value: &WeightsConfig) -> Self {
        ScoringWeights {
            price: value.price,
            location: value.location,
            rooms: value.rooms,
            amenities: value.amenities,
            bonus: value.bonus,
        }
    }
}

fn default_price_weight() -> f64 { 25.0 }
fn default_location_weight() -> f64 { 25.0 }
fn default_rooms_weight() -> f64 { 20.0 }
fn default_amenities_weight() -> f64 { 20.0 }
fn default_bonus_weight() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RENTMATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RENTMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RENTMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RENTMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Apply well-known environment variables on top of the layered config
///
/// `DATABASE_URL` wins over `database.url`; Appwrite credentials may be given
/// as `RENTMATCH_APPWRITE__*` without the double-underscore prefix.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }

    for (var, key) in [
        ("RENTMATCH_APPWRITE__ENDPOINT", "appwrite.endpoint"),
        ("RENTMATCH_APPWRITE__API_KEY", "appwrite.api_key"),
        ("RENTMATCH_APPWRITE__PROJECT_ID", "appwrite.project_id"),
        ("RENTMATCH_APPWRITE__DATABASE_ID", "appwrite.database_id"),
    ] {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

//! # Service Configuration
//!
//! Where the ledger lives, how checkout totals are computed, and how often
//! the overdue monitor runs.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CUOTA_DB_PATH=/var/lib/cuota/cuota.db                              │
//! │     CUOTA_TAX_RATE_BPS=825                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cuota/cuota.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.cuota.pos/cuota.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/cuota/cuota.db"
//! max_connections = 5
//!
//! [checkout]
//! tax_rate = 825           # basis points
//! tax_mode = "exclusive"   # exclusive | inclusive
//! max_discount_bps = 2000
//!
//! [overdue]
//! enabled = true
//! interval_secs = 3600
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use cuota_core::{CheckoutConfig, Rate, TaxMode};

const CONFIG_FILE: &str = "cuota.toml";
const DATABASE_FILE: &str = "cuota.db";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Platform data directory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Overdue Monitor Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between overdue scans.
    #[serde(default = "default_overdue_interval")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_overdue_interval() -> u64 {
    3600
}

impl Default for OverdueSettings {
    fn default() -> Self {
        OverdueSettings {
            enabled: true,
            interval_secs: default_overdue_interval(),
        }
    }
}

// =============================================================================
// Service Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub overdue: OverdueSettings,
}

impl ServiceConfig {
    /// Loads configuration from the file (explicit path or platform default),
    /// then applies `CUOTA_*` environment overrides and validates.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`ServiceConfig::load`], falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.checkout
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.overdue.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "overdue interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a key lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("CUOTA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("CUOTA_DB_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.database.max_connections = m;
            }
        }

        if let Some(rate) = lookup("CUOTA_TAX_RATE_BPS") {
            if let Ok(bps) = rate.parse::<u32>() {
                debug!(bps, "Overriding tax rate from environment");
                self.checkout.tax_rate = Rate::from_bps(bps);
            }
        }

        if let Some(mode) = lookup("CUOTA_TAX_MODE") {
            match mode.to_lowercase().as_str() {
                "exclusive" => self.checkout.tax_mode = TaxMode::Exclusive,
                "inclusive" => self.checkout.tax_mode = TaxMode::Inclusive,
                _ => warn!(mode = %mode, "Unknown tax mode in environment"),
            }
        }

        if let Some(max) = lookup("CUOTA_MAX_DISCOUNT_BPS") {
            if let Ok(bps) = max.parse::<u32>() {
                self.checkout.max_discount_bps = bps;
            }
        }

        if let Some(enabled) = lookup("CUOTA_OVERDUE_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.overdue.enabled = true,
                "0" | "false" | "no" => self.overdue.enabled = false,
                _ => warn!(value = %enabled, "Unknown CUOTA_OVERDUE_ENABLED value"),
            }
        }

        if let Some(secs) = lookup("CUOTA_OVERDUE_INTERVAL_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.overdue.interval_secs = s;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cuota", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Resolved database file: the configured path, else the platform data
    /// directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "cuota", "pos")
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
    }
}

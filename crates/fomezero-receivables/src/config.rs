//! # Receivables Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FOMEZERO_DATABASE_PATH=/var/lib/fomezero/fomezero.db               │
//! │     FOMEZERO_UTC_OFFSET_MINUTES=-180                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/fomezero/fomezero.toml (Linux)                           │
//! │     ~/Library/Application Support/br.fomezero.fomezero/... (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # fomezero.toml
//! [database]
//! path = "/var/lib/fomezero/fomezero.db"
//! max_connections = 5
//!
//! [dashboard]
//! utc_offset_minutes = -180   # America/Sao_Paulo
//! overdue_days = 30
//! high_risk_unpaid_count = 3
//! high_risk_debt_cents = 10000
//! history_months = 6
//! ```

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ReceivablesError, ReceivablesResult};
use fomezero_core::dashboard::DashboardPolicy;
use fomezero_core::{
    Money, DEFAULT_OVERDUE_DAYS, HIGH_RISK_DEBT_CENTS, HIGH_RISK_UNPAID_COUNT, HISTORY_MONTHS,
};
use fomezero_db::DbConfig;

/// Largest offset a real time zone uses (UTC+14).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first start.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for another writer (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("br", "fomezero", "fomezero")
        .map(|dirs| dirs.data_dir().join("fomezero.db"))
        .unwrap_or_else(|| PathBuf::from("fomezero.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Dashboard Settings
// =============================================================================

/// Thresholds and list sizes of the dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Offset of the shop's time zone from UTC. Days and months of the
    /// report are cut at local midnight.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// An unpaid sale older than this is an "old debt".
    #[serde(default = "default_overdue_days")]
    pub overdue_days: i64,

    #[serde(default = "default_high_risk_unpaid_count")]
    pub high_risk_unpaid_count: i64,

    #[serde(default = "default_high_risk_debt_cents")]
    pub high_risk_debt_cents: i64,

    /// Months in the rolling history, current month included.
    #[serde(default = "default_history_months")]
    pub history_months: u32,

    #[serde(default = "default_top_snacks")]
    pub top_snacks: usize,

    #[serde(default = "default_top_debtors")]
    pub top_debtors: usize,

    #[serde(default = "default_old_debts_limit")]
    pub old_debts_limit: usize,

    #[serde(default = "default_high_risk_limit")]
    pub high_risk_limit: usize,
}

fn default_overdue_days() -> i64 {
    DEFAULT_OVERDUE_DAYS
}

fn default_high_risk_unpaid_count() -> i64 {
    HIGH_RISK_UNPAID_COUNT
}

fn default_high_risk_debt_cents() -> i64 {
    HIGH_RISK_DEBT_CENTS
}

fn default_history_months() -> u32 {
    HISTORY_MONTHS
}

fn default_top_snacks() -> usize {
    3
}

fn default_top_debtors() -> usize {
    5
}

fn default_old_debts_limit() -> usize {
    10
}

fn default_high_risk_limit() -> usize {
    5
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            utc_offset_minutes: 0,
            overdue_days: default_overdue_days(),
            high_risk_unpaid_count: default_high_risk_unpaid_count(),
            high_risk_debt_cents: default_high_risk_debt_cents(),
            history_months: default_history_months(),
            top_snacks: default_top_snacks(),
            top_debtors: default_top_debtors(),
            old_debts_limit: default_old_debts_limit(),
            high_risk_limit: default_high_risk_limit(),
        }
    }
}

impl DashboardSettings {
    /// Converts the settings into the aggregator's policy.
    pub fn policy(&self) -> ReceivablesResult<DashboardPolicy> {
        let utc_offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ReceivablesError::InvalidConfig(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })?;

        Ok(DashboardPolicy {
            utc_offset,
            overdue_days: self.overdue_days,
            high_risk_unpaid_count: self.high_risk_unpaid_count,
            high_risk_debt: Money::from_cents(self.high_risk_debt_cents),
            history_months: self.history_months,
            top_snacks: self.top_snacks,
            top_debtors: self.top_debtors,
            old_debts_limit: self.old_debts_limit,
            high_risk_limit: self.high_risk_limit,
        })
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete receivables configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceivablesConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,
}

impl ReceivablesConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`fomezero.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ReceivablesResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading receivables config from file");
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

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load receivables config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ReceivablesResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ReceivablesError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Receivables config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ReceivablesResult<()> {
        if self.database.max_connections == 0 {
            return Err(ReceivablesError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        let offset = self.dashboard.utc_offset_minutes;
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset) {
            return Err(ReceivablesError::InvalidConfig(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, offset
            )));
        }

        if self.dashboard.overdue_days < 0 {
            return Err(ReceivablesError::InvalidConfig(
                "overdue_days must not be negative".into(),
            ));
        }

        if self.dashboard.history_months == 0 {
            return Err(ReceivablesError::InvalidConfig(
                "history_months must be at least 1".into(),
            ));
        }

        if self.dashboard.high_risk_unpaid_count <= 0 || self.dashboard.high_risk_debt_cents <= 0 {
            return Err(ReceivablesError::InvalidConfig(
                "high risk thresholds must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("FOMEZERO_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("FOMEZERO_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid FOMEZERO_MAX_CONNECTIONS"),
            }
        }

        if let Some(offset) = var("FOMEZERO_UTC_OFFSET_MINUTES") {
            match offset.parse::<i32>() {
                Ok(minutes) => {
                    debug!(minutes, "Overriding UTC offset from environment");
                    self.dashboard.utc_offset_minutes = minutes;
                }
                Err(_) => warn!(value = %offset, "Ignoring invalid FOMEZERO_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(days) = var("FOMEZERO_OVERDUE_DAYS") {
            match days.parse::<i64>() {
                Ok(d) => self.dashboard.overdue_days = d,
                Err(_) => warn!(value = %days, "Ignoring invalid FOMEZERO_OVERDUE_DAYS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("br", "fomezero", "fomezero")
            .map(|dirs| dirs.config_dir().join("fomezero.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool configuration for [`fomezero_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    /// Dashboard policy.
    pub fn dashboard_policy(&self) -> ReceivablesResult<DashboardPolicy> {
        self.dashboard.policy()
    }
}

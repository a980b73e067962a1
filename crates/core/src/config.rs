//! Tunable constants for the forecast and prediction heuristics.
//!
//! Every default reproduces the hand-tuned value the engine has always used;
//! a TOML file may override any subset of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub forecast: ForecastSettings,
    pub patterns: PatternThresholds,
    pub month_end: MonthEndSettings,
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast.window_months == 0 {
            return Err(ConfigError::Invalid {
                name: "forecast.window_months",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.month_end.history_months == 0 {
            return Err(ConfigError::Invalid {
                name: "month_end.history_months",
                reason: "must be at least 1".to_string(),
            });
        }
        let p = &self.patterns;
        if p.burst_ratio_min >= p.burst_ratio_max {
            return Err(ConfigError::Invalid {
                name: "patterns.burst_ratio_min",
                reason: format!("{} is not below burst_ratio_max {}", p.burst_ratio_min, p.burst_ratio_max),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Trailing months averaged into the baseline.
    pub window_months: usize,
    /// Number of projected points.
    pub horizon_months: u32,
    /// Projected expense never drops below this share of the average.
    pub expense_floor_ratio: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            window_months: 3,
            horizon_months: 12,
            expense_floor_ratio: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternThresholds {
    pub min_transactions: usize,

    pub fixed_amount_cv: f64,
    pub fixed_day_stddev: f64,
    pub fixed_max_per_month: usize,
    pub fixed_confidence: f64,

    pub periodic_min_intervals: usize,
    pub periodic_interval_cv: f64,
    pub periodic_max_interval_days: f64,
    pub periodic_amount_window: usize,
    pub periodic_confidence: f64,

    pub burst_ratio_min: f64,
    pub burst_ratio_max: f64,
    pub burst_min_months: usize,
    pub burst_confidence: f64,

    pub seasonal_total_cv: f64,
    pub seasonal_min_months: usize,
    pub seasonal_window: usize,
    pub seasonal_confidence: f64,

    pub variable_window: usize,
    pub variable_confidence: f64,

    /// Weight of sample `i` (0 = oldest) is `1 + i * recency_step`.
    pub recency_step: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            min_transactions: 3,

            fixed_amount_cv: 0.08,
            fixed_day_stddev: 4.0,
            fixed_max_per_month: 2,
            fixed_confidence: 0.95,

            periodic_min_intervals: 3,
            periodic_interval_cv: 0.35,
            periodic_max_interval_days: 25.0,
            periodic_amount_window: 6,
            periodic_confidence: 0.85,

            burst_ratio_min: 0.35,
            burst_ratio_max: 0.85,
            burst_min_months: 2,
            burst_confidence: 0.75,

            seasonal_total_cv: 0.5,
            seasonal_min_months: 4,
            seasonal_window: 3,
            seasonal_confidence: 0.65,

            variable_window: 4,
            variable_confidence: 0.7,

            recency_step: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthEndSettings {
    pub history_months: usize,
    pub recency_step: f64,
    /// Below this share of the reference curve the partial total is not extrapolated.
    pub curve_floor: f64,
    pub confidence_base: f64,
    pub confidence_slope: f64,
    pub confidence_cap: f64,
    pub no_history_confidence: f64,
}

impl Default for MonthEndSettings {
    fn default() -> Self {
        Self {
            history_months: 6,
            recency_step: 0.3,
            curve_floor: 0.05,
            confidence_base: 0.4,
            confidence_slope: 0.6,
            confidence_cap: 0.95,
            no_history_confidence: 0.3,
        }
    }
}

use crate::{
    error::{DistError, DistResult},
    types::PaymentPolicy,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const MAX_ROUNDING_PRECISION: u32 = 10;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Knobs for one generation call. Every stochastic or decision point
/// in the engine reads from here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlgorithmSettings {
    /// 0 = strict greedy fitting, 1 = amounts may swing by ±200%.
    pub variation_factor: f64,
    pub rounding_precision: u32,
    pub prefer_exact_match: bool,
    pub allow_new_order_types: bool,
    pub max_iterations: u32,
}

impl Default for AlgorithmSettings {
    fn default() -> Self {
        Self {
            variation_factor: 0.2,
            rounding_precision: 2,
            prefer_exact_match: true,
            allow_new_order_types: false,
            max_iterations: 1000,
        }
    }
}

impl AlgorithmSettings {
    /// Strict settings: no variance, greedy fitting.
    pub fn strict() -> Self {
        Self {
            variation_factor: 0.0,
            ..Self::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.variation_factor == 0.0
    }

    pub fn validate(&self) -> DistResult<()> {
        if !(0.0..=1.0).contains(&self.variation_factor) {
            return Err(DistError::invalid_settings(format!(
                "variation_factor {} outside [0, 1]",
                self.variation_factor
            )));
        }
        if self.max_iterations == 0 {
            return Err(DistError::invalid_settings("max_iterations must be > 0"));
        }
        if self.rounding_precision > MAX_ROUNDING_PRECISION {
            return Err(DistError::invalid_settings(format!(
                "rounding_precision {} exceeds {MAX_ROUNDING_PRECISION}",
                self.rounding_precision
            )));
        }
        Ok(())
    }
}

/// The daily operating window orders are spread across.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkingWindow {
    pub opens_at: NaiveTime,
    pub duration_minutes: u32,
}

impl Default for WorkingWindow {
    /// 08:00–20:00.
    fn default() -> Self {
        Self {
            opens_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            duration_minutes: 12 * 60,
        }
    }
}

impl WorkingWindow {
    pub fn validate(&self) -> DistResult<()> {
        if self.duration_minutes == 0 {
            return Err(DistError::invalid_settings("working window is empty"));
        }
        let opens = self.opens_at.hour() * 60 + self.opens_at.minute();
        if opens + self.duration_minutes > MINUTES_PER_DAY {
            return Err(DistError::invalid_settings(
                "working window must not cross midnight",
            ));
        }
        Ok(())
    }

    pub fn start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.opens_at)
    }

    /// Exclusive upper bound of the window on `date`.
    pub fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
        self.start_on(date) + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn contains(&self, date: NaiveDate, at: NaiveDateTime) -> bool {
        at >= self.start_on(date) && at < self.end_on(date)
    }
}

/// Full generator configuration: engine settings plus the
/// scheduling window and default payment policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub settings: AlgorithmSettings,
    pub window: WorkingWindow,
    pub payment_policy: PaymentPolicy,
}

impl GeneratorConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    /// In tests, use GeneratorConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GeneratorConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            settings: AlgorithmSettings::default(),
            window: WorkingWindow::default(),
            payment_policy: PaymentPolicy::Mixed,
        }
    }

    pub fn validate(&self) -> DistResult<()> {
        self.settings.validate()?;
        self.window.validate()
    }
}

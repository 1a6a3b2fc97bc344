//! TOML config file loading and validation for the session, the sensor
//! simulation, the assistant and an optional crop catalog override.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use airmind_engine::assistant::{default_replies, CannedReplies, DEFAULT_GREETING};
use airmind_engine::session::{DEFAULT_INITIAL_DAY, DEFAULT_MAX_NOTICES};
use airmind_engine::{Catalog, CropProfile, SensorReading, SessionSettings, SimParams, Thresholds};

use crate::ticker::DEFAULT_TICK_INTERVAL;

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub assistant: AssistantSection,
    /// Replaces the built-in catalog when non-empty.
    #[serde(default)]
    pub crops: Vec<CropProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub tick_interval_ms: i64,
    pub initial_day: i64,
    /// Enables the day clock when set.
    pub day_length_secs: Option<i64>,
    pub ph_tolerance: f64,
    pub ec_tolerance: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub max_notices: usize,
    pub initial_reading: ReadingEntry,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as i64,
            initial_day: i64::from(DEFAULT_INITIAL_DAY),
            day_length_secs: None,
            ph_tolerance: 0.2,
            ec_tolerance: None,
            temp_min: None,
            temp_max: None,
            max_notices: DEFAULT_MAX_NOTICES,
            initial_reading: ReadingEntry::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReadingEntry {
    pub ph: f64,
    pub ec: f64,
    pub temp: f64,
}

impl Default for ReadingEntry {
    fn default() -> Self {
        let r = SensorReading::default();
        Self {
            ph: r.ph,
            ec: r.ec,
            temp: r.temp,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub ph_jitter: f64,
    pub temp_baseline: f64,
    pub temp_jitter: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let p = SimParams::default();
        Self {
            ph_jitter: p.ph_jitter,
            temp_baseline: p.temp_baseline,
            temp_jitter: p.temp_jitter,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssistantSection {
    pub greeting: String,
    /// Falls back to the built-in replies when empty.
    pub replies: Vec<String>,
    pub reply_delay_ms: i64,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            replies: Vec::new(),
            reply_delay_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate every section. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_session(&mut errors);
        self.validate_simulation(&mut errors);
        self.validate_assistant(&mut errors);

        if !self.crops.is_empty() {
            if let Err(e) = Catalog::new(self.crops.clone()) {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_session(&self, errors: &mut Vec<String>) {
        let s = &self.session;

        if s.tick_interval_ms <= 0 {
            errors.push(format!(
                "session: tick_interval_ms must be positive, got {}",
                s.tick_interval_ms
            ));
        }
        if s.initial_day < 1 || s.initial_day > i64::from(u32::MAX) {
            errors.push(format!(
                "session: initial_day must be at least 1, got {}",
                s.initial_day
            ));
        }
        if let Some(secs) = s.day_length_secs {
            if secs <= 0 {
                errors.push(format!(
                    "session: day_length_secs must be positive, got {secs}"
                ));
            }
        }
        if s.max_notices == 0 {
            errors.push("session: max_notices must be positive".to_string());
        }

        // ── Thresholds ──────────────────────────────────────────
        if !non_negative(s.ph_tolerance) {
            errors.push(format!(
                "session: ph_tolerance must be non-negative, got {}",
                s.ph_tolerance
            ));
        }
        if let Some(tol) = s.ec_tolerance {
            if !non_negative(tol) {
                errors.push(format!(
                    "session: ec_tolerance must be non-negative, got {tol}"
                ));
            }
        }
        match (s.temp_min, s.temp_max) {
            (Some(min), Some(max)) if min >= max => errors.push(format!(
                "session: temp_min ({min}) must be less than temp_max ({max})"
            )),
            (Some(_), None) | (None, Some(_)) => errors.push(
                "session: temp_min and temp_max must be set together".to_string(),
            ),
            _ => {}
        }

        // ── Initial reading ─────────────────────────────────────
        let r = &s.initial_reading;
        if !(0.0..=14.0).contains(&r.ph) {
            errors.push(format!(
                "session: initial_reading.ph {} out of range [0.0, 14.0]",
                r.ph
            ));
        }
        if !non_negative(r.ec) {
            errors.push(format!(
                "session: initial_reading.ec must be non-negative, got {}",
                r.ec
            ));
        }
        if !r.temp.is_finite() {
            errors.push("session: initial_reading.temp is not a number".to_string());
        }
    }

    fn validate_simulation(&self, errors: &mut Vec<String>) {
        let sim = &self.simulation;
        if !non_negative(sim.ph_jitter) {
            errors.push(format!(
                "simulation: ph_jitter must be non-negative, got {}",
                sim.ph_jitter
            ));
        }
        if !non_negative(sim.temp_jitter) {
            errors.push(format!(
                "simulation: temp_jitter must be non-negative, got {}",
                sim.temp_jitter
            ));
        }
        if !sim.temp_baseline.is_finite() {
            errors.push("simulation: temp_baseline is not a number".to_string());
        }
    }

    fn validate_assistant(&self, errors: &mut Vec<String>) {
        let a = &self.assistant;
        if a.reply_delay_ms < 0 {
            errors.push(format!(
                "assistant: reply_delay_ms must not be negative, got {}",
                a.reply_delay_ms
            ));
        }
        for (i, reply) in a.replies.iter().enumerate() {
            if reply.trim().is_empty() {
                errors.push(format!("assistant: replies[{i}] is empty"));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Derived settings (call after `validate`)
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> Result<Catalog> {
        if self.crops.is_empty() {
            return Ok(Catalog::builtin());
        }
        Catalog::new(self.crops.clone()).context("invalid crop catalog")
    }

    pub fn session_settings(&self) -> SessionSettings {
        let s = &self.session;
        let r = &s.initial_reading;
        SessionSettings {
            initial_day: u32::try_from(s.initial_day).unwrap_or(1),
            initial_reading: SensorReading {
                ph: r.ph,
                ec: r.ec,
                temp: r.temp,
            },
            thresholds: Thresholds {
                ph_tolerance: s.ph_tolerance,
                ec_tolerance: s.ec_tolerance,
                temp_range: s.temp_min.zip(s.temp_max),
            },
            sim: SimParams {
                ph_jitter: self.simulation.ph_jitter,
                temp_baseline: self.simulation.temp_baseline,
                temp_jitter: self.simulation.temp_jitter,
            },
            max_notices: s.max_notices,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.session.tick_interval_ms.max(1) as u64)
    }

    pub fn day_length(&self) -> Option<Duration> {
        self.session
            .day_length_secs
            .map(|secs| Duration::from_secs(secs.max(1) as u64))
    }

    pub fn assistant(&self) -> Result<CannedReplies> {
        let replies = if self.assistant.replies.is_empty() {
            default_replies()
        } else {
            self.assistant.replies.clone()
        };
        CannedReplies::new(self.assistant.greeting.clone(), replies)
            .context("invalid assistant configuration")
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.assistant.reply_delay_ms.max(0) as u64)
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================

use std::path::Path;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use serde::Deserialize;

use crate::error::LootError;
use crate::model::SourceKind;
use crate::track::{TrackEntry, TrackRegistry};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Scoring parameters. Every section is optional; an empty document yields
/// the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub tiers: TierConfig,
    #[serde(default)]
    pub freshness: FreshnessConfig,
    #[serde(default)]
    pub weekly_reset: WeeklyResetConfig,
    /// Replaces the built-in track registry when non-empty.
    #[serde(default)]
    pub tracks: Vec<TrackEntry>,
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Reserved scores that override simulated dps.
#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    #[serde(default = "default_bis_score")]
    pub bis_score: f64,
    #[serde(default = "default_floor_score")]
    pub floor_score: f64,
}

fn default_bis_score() -> f64 {
    1e9
}

fn default_floor_score() -> f64 {
    -1.0
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            bis_score: default_bis_score(),
            floor_score: default_floor_score(),
        }
    }
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// A feed older than its limit (relative to the drop) is flagged stale.
#[derive(Debug, Clone, Deserialize)]
pub struct FreshnessConfig {
    #[serde(default = "default_simulation_age")]
    pub simulation_max_age_hours: u32,
    #[serde(default = "default_feed_age")]
    pub audit_max_age_hours: u32,
    #[serde(default = "default_feed_age")]
    pub progression_max_age_hours: u32,
}

fn default_simulation_age() -> u32 {
    168
}

fn default_feed_age() -> u32 {
    72
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            simulation_max_age_hours: default_simulation_age(),
            audit_max_age_hours: default_feed_age(),
            progression_max_age_hours: default_feed_age(),
        }
    }
}

impl FreshnessConfig {
    pub fn max_age(&self, kind: SourceKind) -> Option<Duration> {
        let hours = match kind {
            SourceKind::Simulation => self.simulation_max_age_hours,
            SourceKind::Audit => self.audit_max_age_hours,
            SourceKind::Progression => self.progression_max_age_hours,
            SourceKind::History => return None,
        };
        Some(Duration::hours(i64::from(hours)))
    }
}

// ---------------------------------------------------------------------------
// Weekly reset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyResetConfig {
    /// `mon`..`sun` or the full day name.
    #[serde(default = "default_reset_weekday")]
    pub weekday: String,
    #[serde(default = "default_reset_hour")]
    pub hour_utc: u32,
}

fn default_reset_weekday() -> String {
    "tue".to_string()
}

fn default_reset_hour() -> u32 {
    15
}

impl Default for WeeklyResetConfig {
    fn default() -> Self {
        Self {
            weekday: default_reset_weekday(),
            hour_utc: default_reset_hour(),
        }
    }
}

impl WeeklyResetConfig {
    pub fn weekday(&self) -> Result<Weekday, LootError> {
        self.weekday.trim().parse::<Weekday>().map_err(|_| {
            LootError::ConfigValidation(format!("weekly_reset.weekday '{}' is not a day", self.weekday))
        })
    }

    /// The most recent reset at or before `ts`.
    pub fn last_reset_before(&self, ts: DateTime<Utc>) -> Result<DateTime<Utc>, LootError> {
        let weekday = self.weekday()?;
        let days_back = (ts.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
        let date = ts.date_naive() - Duration::days(i64::from(days_back));
        let naive = date.and_hms_opt(self.hour_utc, 0, 0).ok_or_else(|| {
            LootError::ConfigValidation(format!("weekly_reset.hour_utc {} out of range", self.hour_utc))
        })?;
        let reset = Utc.from_utc_datetime(&naive);
        Ok(if reset > ts { reset - Duration::days(7) } else { reset })
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ScoringConfig {
    pub fn from_toml(input: &str) -> Result<Self, LootError> {
        let config: ScoringConfig =
            toml::from_str(input).map_err(|e| LootError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, LootError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| LootError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), LootError> {
        let TierConfig { bis_score, floor_score } = self.tiers;
        if !bis_score.is_finite() || !floor_score.is_finite() {
            return Err(LootError::ConfigValidation("tier scores must be finite".into()));
        }
        if floor_score >= 0.0 {
            return Err(LootError::ConfigValidation(format!(
                "floor_score must be negative, got {floor_score}"
            )));
        }
        if bis_score <= floor_score {
            return Err(LootError::ConfigValidation(format!(
                "bis_score ({bis_score}) must exceed floor_score ({floor_score})"
            )));
        }

        self.weekly_reset.weekday()?;
        if self.weekly_reset.hour_utc > 23 {
            return Err(LootError::ConfigValidation(format!(
                "weekly_reset.hour_utc must be 0..=23, got {}",
                self.weekly_reset.hour_utc
            )));
        }

        if !self.tracks.is_empty() {
            TrackRegistry::from_entries(self.tracks.clone())?;
        }
        Ok(())
    }

    /// The configured track registry, or the built-in one.
    pub fn track_registry(&self) -> Result<TrackRegistry, LootError> {
        if self.tracks.is_empty() {
            Ok(TrackRegistry::builtin())
        } else {
            TrackRegistry::from_entries(self.tracks.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Timing profiles for reel reveals

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing profile for a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Full reveal schedule
    #[default]
    Normal,
    /// Half-length schedule
    Turbo,
    /// No delays at all (tests, scripted runs)
    Instant,
    /// Result of scaling another profile
    Custom,
}

impl TimingProfile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Turbo => "turbo",
            Self::Instant => "instant",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for TimingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "turbo" => Ok(Self::Turbo),
            "instant" => Ok(Self::Instant),
            other => Err(format!(
                "Unknown timing profile '{}' (expected normal, turbo or instant)",
                other
            )),
        }
    }
}

/// Reveal schedule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Delay before the first reel stops (ms)
    pub base_delay_ms: f64,

    /// Added delay per reel index (ms)
    pub reel_interval_ms: f64,

    /// Upper bound (exclusive) of the random per-reel jitter (ms)
    pub jitter_ms: f64,

    /// Pause between the last reel stop and the committed result (ms)
    pub settle_ms: f64,
}

impl TimingConfig {
    /// Normal timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            base_delay_ms: 1500.0,
            reel_interval_ms: 800.0,
            jitter_ms: 500.0,
            settle_ms: 500.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            ..Self::normal().halved()
        }
    }

    /// Every delay is zero
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            base_delay_ms: 0.0,
            reel_interval_ms: 0.0,
            jitter_ms: 0.0,
            settle_ms: 0.0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        Self {
            profile: TimingProfile::Custom,
            base_delay_ms: self.base_delay_ms * factor,
            reel_interval_ms: self.reel_interval_ms * factor,
            jitter_ms: self.jitter_ms * factor,
            settle_ms: self.settle_ms * factor,
        }
    }

    fn halved(&self) -> Self {
        self.scaled(0.5)
    }

    /// Scheduled stop of reel `reel_index` given its jitter draw
    pub fn reveal_offset_ms(&self, reel_index: usize, jitter_ms: f64) -> f64 {
        let jitter = jitter_ms.clamp(0.0, self.jitter_ms.max(0.0));
        self.base_delay_ms + reel_index as f64 * self.reel_interval_ms + jitter
    }

    /// Latest possible stop across `reel_count` reels
    pub fn max_reveal_ms(&self, reel_count: usize) -> f64 {
        if reel_count == 0 {
            return 0.0;
        }
        self.reveal_offset_ms(reel_count - 1, self.jitter_ms)
    }

    /// Upper bound on a full draw, settle included
    pub fn max_draw_duration_ms(&self, reel_count: usize) -> f64 {
        if reel_count == 0 {
            return 0.0;
        }
        self.max_reveal_ms(reel_count) + self.settle_ms
    }

    /// Every delay must be a finite, non-negative number of milliseconds
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("base_delay_ms", self.base_delay_ms),
            ("reel_interval_ms", self.reel_interval_ms),
            ("jitter_ms", self.jitter_ms),
            ("settle_ms", self.settle_ms),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("Invalid {}: {}", name, value));
            }
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

/// Millisecond offset to a `Duration`.
///
/// Negative and NaN clamp to zero, anything too large to represent
/// saturates at `Duration::MAX`.
pub fn ms_to_duration(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_schedule() {
        let timing = TimingConfig::normal();
        assert_eq!(timing.reveal_offset_ms(0, 0.0), 1500.0);
        assert_eq!(timing.reveal_offset_ms(2, 250.0), 1500.0 + 1600.0 + 250.0);
        assert_eq!(timing.max_draw_duration_ms(2), 1500.0 + 800.0 + 500.0 + 500.0);
    }

    #[test]
    fn test_jitter_is_clamped() {
        let timing = TimingConfig::normal();
        assert_eq!(timing.reveal_offset_ms(0, 9000.0), 2000.0);
        assert_eq!(timing.reveal_offset_ms(0, -5.0), 1500.0);
    }

    #[test]
    fn test_profiles() {
        let turbo = TimingConfig::from_profile(TimingProfile::Turbo);
        assert_eq!(turbo.profile, TimingProfile::Turbo);
        assert_eq!(turbo.base_delay_ms, 750.0);
        assert_eq!(turbo.settle_ms, 250.0);

        let instant = TimingConfig::instant();
        assert_eq!(instant.max_draw_duration_ms(5), 0.0);

        let custom = TimingConfig::normal().scaled(2.0);
        assert_eq!(custom.profile, TimingProfile::Custom);
        assert_eq!(custom.reel_interval_ms, 1600.0);
    }

    #[test]
    fn test_zero_reels() {
        assert_eq!(TimingConfig::normal().max_draw_duration_ms(0), 0.0);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("Turbo".parse::<TimingProfile>(), Ok(TimingProfile::Turbo));
        assert_eq!(" instant ".parse::<TimingProfile>(), Ok(TimingProfile::Instant));
        assert!("custom".parse::<TimingProfile>().is_err());
        assert_eq!(TimingProfile::Normal.to_string(), "normal");
    }

    #[test]
    fn test_ms_to_duration() {
        assert_eq!(ms_to_duration(1500.0), Duration::from_millis(1500));
        assert_eq!(ms_to_duration(-1.0), Duration::ZERO);
        assert_eq!(ms_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(ms_to_duration(1e300), Duration::MAX);
        assert_eq!(ms_to_duration(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn test_validate() {
        for profile in [TimingProfile::Normal, TimingProfile::Turbo, TimingProfile::Instant] {
            assert!(TimingConfig::from_profile(profile).validate().is_ok());
        }
        assert!(TimingConfig::normal().scaled(f64::INFINITY).validate().is_err());

        let negative = TimingConfig {
            settle_ms: -1.0,
            ..TimingConfig::normal()
        };
        let err = negative.validate().unwrap_err();
        assert!(err.contains("settle_ms"));

        let nan = TimingConfig {
            jitter_ms: f64::NAN,
            ..TimingConfig::normal()
        };
        assert!(nan.validate().is_err());
    }
}

//! Immutable analysis thresholds.
//!
//! Earlier revisions of this tool kept thresholds in a mutable settings
//! singleton that any module could poke at runtime. Here the caller builds
//! one `AnalysisConfig` up front and passes it by reference into every
//! classification call, so a batch run can never observe a mid-flight
//! threshold change.

use serde::{Deserialize, Serialize};

/// Threshold set consumed by the VAD pipeline and both call rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Frame RMS energy threshold on the i16 amplitude scale (0..=32767).
    /// Lower values detect fainter speech. Default: 600.
    pub vad_energy_threshold: f32,
    /// Minimum duration for an accepted speech segment (ms). Default: 100.
    pub vad_min_speech_duration_ms: f64,
    /// Grace period before the agent's first utterance counts as late (s).
    /// Also the minimum call duration for the Releasing rule. Default: 5.0.
    pub late_hello_time_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::with_sensitivity(Sensitivity::Medium)
    }
}

impl AnalysisConfig {
    /// Default late-hello grace period (seconds). Extended from the historical
    /// 4.0 s to tolerate network connect delay on the dialer side.
    pub const DEFAULT_LATE_HELLO_SECS: f64 = 5.0;

    /// Build a config from a named sensitivity preset.
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        let (vad_energy_threshold, vad_min_speech_duration_ms) = match sensitivity {
            Sensitivity::High => (400.0, 80.0),
            Sensitivity::Medium => (600.0, 100.0),
            Sensitivity::Low => (900.0, 150.0),
        };
        Self {
            vad_energy_threshold,
            vad_min_speech_duration_ms,
            late_hello_time_secs: Self::DEFAULT_LATE_HELLO_SECS,
        }
    }
}

/// Named VAD sensitivity presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Detects faint or unclear speech; more false positives.
    High,
    /// Balanced detection (recommended).
    Medium,
    /// Only clear speech; more false negatives.
    Low,
}

impl std::str::FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown sensitivity preset: {other}")),
        }
    }
}

//! The two call-outcome rules.
//!
//! Both consume the same adaptive VAD output. Precedence is explicit: a call
//! with zero speech segments belongs to Releasing, never Late Hello, and a
//! call shorter than the grace period is never Releasing.
//!
//! The rules are split into pure functions over an already-computed segment
//! list so threshold boundaries can be tested without synthesizing audio.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::AudioClip;
use crate::config::AnalysisConfig;
use crate::vad::{detect_speech_segments, SpeechSegment, VadMode};

/// Two-valued rule outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Yes,
    No,
}

impl Flag {
    pub fn is_yes(self) -> bool {
        self == Flag::Yes
    }

    fn from_bool(value: bool) -> Self {
        if value {
            Flag::Yes
        } else {
            Flag::No
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flag::Yes => "Yes",
            Flag::No => "No",
        })
    }
}

/// Outcome of both rules for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallClassification {
    /// Agent channel never produced speech over a sufficiently long call.
    pub releasing: Flag,
    /// Agent's first utterance began after the grace period.
    pub late_hello: Flag,
}

impl CallClassification {
    /// Whether this call belongs in the flagged report.
    pub fn flagged(&self) -> bool {
        self.releasing.is_yes() || self.late_hello.is_yes()
    }
}

/// Run both rules against an agent-channel clip.
///
/// The VAD runs once and both rules consume the same segment list, which
/// keeps the pair mutually consistent.
pub fn classify_call(agent: &AudioClip, config: &AnalysisConfig) -> CallClassification {
    let segments = detect_speech_segments(agent, config, VadMode::Adaptive);
    let result = CallClassification {
        releasing: releasing_from_segments(&segments, agent.duration_secs(), config),
        late_hello: late_hello_from_segments(&segments, config),
    };
    debug!(
        segments = segments.len(),
        releasing = %result.releasing,
        late_hello = %result.late_hello,
        "call classified"
    );
    result
}

/// Releasing rule over an already-computed segment list.
///
/// Calls shorter than the grace period return `No` unconditionally: there is
/// too little audio to judge "the agent never spoke".
pub fn releasing_from_segments(
    segments: &[SpeechSegment],
    duration_secs: f64,
    config: &AnalysisConfig,
) -> Flag {
    if duration_secs < config.late_hello_time_secs {
        return Flag::No;
    }
    Flag::from_bool(segments.is_empty())
}

/// Late Hello rule over an already-computed segment list.
///
/// An empty list belongs to the Releasing rule and returns `No` here. An
/// onset at exactly the grace period is on time; only a strictly later onset
/// is flagged.
pub fn late_hello_from_segments(segments: &[SpeechSegment], config: &AnalysisConfig) -> Flag {
    let Some(first) = segments.first() else {
        return Flag::No;
    };
    Flag::from_bool(first.start_ms > config.late_hello_time_secs * 1000.0)
}

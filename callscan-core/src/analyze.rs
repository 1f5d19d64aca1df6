//! One-clip diagnostic report.
//!
//! Used by the CLI debug path to explain a classification: how much speech
//! was found, where it started, and what both rules decided.

use serde::Serialize;
use tracing::debug;

use crate::audio::AudioClip;
use crate::classify::{late_hello_from_segments, releasing_from_segments, Flag};
use crate::config::AnalysisConfig;
use crate::vad::{detect_speech_segments, SpeechSegment, VadMode};

/// Segments beyond this count are summarized, not listed.
const MAX_REPORTED_SEGMENTS: usize = 5;

/// Per-clip analysis summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipDiagnostics {
    pub duration_ms: f64,
    pub segment_count: usize,
    /// Start of the first detected utterance, if any.
    pub first_onset_ms: Option<f64>,
    /// Fraction of the clip covered by detected speech.
    pub speech_ratio: f64,
    pub releasing: Flag,
    pub late_hello: Flag,
    /// Leading segments, capped at [`MAX_REPORTED_SEGMENTS`].
    pub segments: Vec<SpeechSegment>,
}

/// Analyze one agent-channel clip and report what the detector saw.
pub fn analyze_clip(agent: &AudioClip, config: &AnalysisConfig) -> ClipDiagnostics {
    let segments = detect_speech_segments(agent, config, VadMode::Adaptive);
    let releasing = releasing_from_segments(&segments, agent.duration_secs(), config);
    let late_hello = late_hello_from_segments(&segments, config);

    let duration_ms = agent.duration_ms();
    let speech_ms: f64 = segments.iter().map(SpeechSegment::duration_ms).sum();
    let speech_ratio = if duration_ms > 0.0 {
        speech_ms / duration_ms
    } else {
        0.0
    };

    debug!(
        duration_ms,
        segments = segments.len(),
        speech_ratio,
        "clip analyzed"
    );

    ClipDiagnostics {
        duration_ms,
        segment_count: segments.len(),
        first_onset_ms: segments.first().map(|s| s.start_ms),
        speech_ratio,
        releasing,
        late_hello,
        segments: segments.into_iter().take(MAX_REPORTED_SEGMENTS).collect(),
    }
}

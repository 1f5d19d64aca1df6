//! Voice activity detection.
//!
//! ## Pipeline
//!
//! ```text
//! samples ─► peak normalize ─► noise floor (adaptive mode)
//!                 │
//!          per-frame features: RMS energy, ZCR, centroid/bandwidth/rolloff
//!                 │
//!          multi-criterion frame predicate (frame.rs)
//!                 │
//!          run-length segment assembly (segments.rs)
//! ```
//!
//! The primary pipeline returns `Result<Vec<SpeechSegment>, VadError>`; the
//! orchestrator selects the coarser loudness fallback on `Err`. Degradation
//! is an explicit value, never stack unwinding, so `detect_speech_segments`
//! cannot fail for loadable audio.

pub mod fallback;
pub mod frame;
pub mod noise;
pub mod segments;
pub mod spectral;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::audio::AudioClip;
use crate::config::AnalysisConfig;
use frame::FrameClassifier;

/// Analysis frame length (ms).
pub const FRAME_MS: f64 = 50.0;
/// Hop between frame starts (ms) — 50% overlap.
pub const HOP_MS: f64 = 25.0;

/// A detected span of agent speech. `end_ms > start_ms` by construction;
/// a clip's segment list is time-ordered and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSegment {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl SpeechSegment {
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

/// Per-frame descriptors produced by the primary pipeline, in time order.
#[derive(Debug, Clone, Copy)]
pub struct FrameFeature {
    /// Frame RMS energy on the i16 amplitude scale.
    pub energy: f32,
    /// Zero-crossing rate in [0, 1].
    pub zcr: f32,
    /// Spectral centroid (Hz).
    pub centroid: f32,
    /// Spectral bandwidth (Hz).
    pub bandwidth: f32,
    /// 85% spectral rolloff point (Hz).
    pub rolloff: f32,
    /// Combined speech/not-speech decision for this frame.
    pub is_speech: bool,
}

/// Threshold mode for the frame classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadMode {
    /// Effective threshold raised above the clip's estimated noise floor.
    Adaptive,
    /// The configured threshold is used as-is.
    Fixed,
}

/// Why the primary pipeline could not run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VadError {
    #[error("clip contains no samples")]
    EmptyClip,
    #[error("clip contains non-finite samples")]
    NonFiniteSamples,
    #[error("clip sample rate is zero")]
    ZeroSampleRate,
}

/// Detect speech segments in an agent-channel clip.
///
/// Runs the multi-criterion frame pipeline; if it reports a [`VadError`] the
/// loudness fallback is selected instead. Coarser, but still deterministic.
pub fn detect_speech_segments(
    clip: &AudioClip,
    config: &AnalysisConfig,
    mode: VadMode,
) -> Vec<SpeechSegment> {
    match primary_segments(clip, config, mode) {
        Ok(segments) => segments,
        Err(err) => {
            debug!(error = %err, "primary VAD unavailable — using loudness fallback");
            fallback::detect_loud_spans(clip)
        }
    }
}

/// The primary pipeline: noise floor → frame features → segment assembly.
///
/// Exposed separately so callers can distinguish "no speech" from "could not
/// analyze"; most callers want [`detect_speech_segments`] instead.
pub fn primary_segments(
    clip: &AudioClip,
    config: &AnalysisConfig,
    mode: VadMode,
) -> std::result::Result<Vec<SpeechSegment>, VadError> {
    if clip.sample_rate == 0 {
        return Err(VadError::ZeroSampleRate);
    }
    if clip.samples.is_empty() {
        return Err(VadError::EmptyClip);
    }

    let normalized = normalize_peak(&clip.samples)?;

    let frame_len = (FRAME_MS / 1000.0 * clip.sample_rate as f64) as usize;
    let hop_len = (HOP_MS / 1000.0 * clip.sample_rate as f64) as usize;
    if frame_len == 0 || hop_len == 0 {
        return Err(VadError::ZeroSampleRate);
    }

    let noise_floor = match mode {
        VadMode::Adaptive => noise::estimate_noise_floor(&normalized, frame_len, hop_len),
        VadMode::Fixed => 0.0,
    };

    let classifier = FrameClassifier::new(config, noise_floor, mode);
    let features = classifier.classify_frames(&normalized, frame_len, hop_len, clip.sample_rate);

    let flags: Vec<bool> = features.iter().map(|f| f.is_speech).collect();
    Ok(segments::assemble(
        &flags,
        hop_len,
        clip.sample_rate,
        normalized.len(),
        config.vad_min_speech_duration_ms,
    ))
}

/// Scale samples so the loudest one sits at ±1.0. All-zero input passes
/// through unchanged; non-finite input is rejected.
fn normalize_peak(samples: &[f32]) -> std::result::Result<Vec<f32>, VadError> {
    if samples.iter().any(|s| !s.is_finite()) {
        return Err(VadError::NonFiniteSamples);
    }
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        Ok(samples.iter().map(|s| s / peak).collect())
    } else {
        Ok(samples.to_vec())
    }
}

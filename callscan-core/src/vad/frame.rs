//! Per-frame speech/not-speech decision.
//!
//! A frame counts as speech only when all three criteria hold:
//!
//! 1. RMS energy above the effective threshold (noise-floor-adaptive when
//!    requested).
//! 2. Zero-crossing rate inside the voiced-speech band — rejects both pure
//!    hum (too few crossings) and broadband static (too many).
//! 3. At least two of the three spectral shape checks pass.
//!
//! A hard deterministic predicate: no probabilities, no learned weights.

use crate::config::AnalysisConfig;

use super::spectral::SpectralAnalyzer;
use super::{FrameFeature, VadMode};

/// Voiced-speech zero-crossing-rate band (exclusive bounds).
const ZCR_MIN: f32 = 0.01;
const ZCR_MAX: f32 = 0.3;

/// Spectral centroid acceptance band (Hz, half-open).
const CENTROID_MIN_HZ: f32 = 300.0;
const CENTROID_MAX_HZ: f32 = 3500.0;
/// Pure tones have near-zero bandwidth; speech does not.
const BANDWIDTH_MIN_HZ: f32 = 200.0;
/// Speech concentrates its energy below this rolloff point.
const ROLLOFF_MAX_HZ: f32 = 4000.0;
/// How many of the three spectral checks must pass.
const SPECTRAL_SCORE_MIN: u8 = 2;

/// Multi-criterion frame classifier for one clip.
pub struct FrameClassifier {
    effective_threshold: f32,
}

impl FrameClassifier {
    /// In adaptive mode the effective threshold rides above the measured
    /// noise floor (`floor + 0.3·t`) but never drops below 70% of the
    /// configured threshold `t`.
    pub fn new(config: &AnalysisConfig, noise_floor: f32, mode: VadMode) -> Self {
        let t = config.vad_energy_threshold;
        let effective_threshold = match mode {
            VadMode::Adaptive => (noise_floor + 0.3 * t).max(0.7 * t),
            VadMode::Fixed => t,
        };
        Self {
            effective_threshold,
        }
    }

    pub fn effective_threshold(&self) -> f32 {
        self.effective_threshold
    }

    /// Classify every full frame of peak-normalized mono samples, in order.
    pub fn classify_frames(
        &self,
        samples: &[f32],
        frame_len: usize,
        hop_len: usize,
        sample_rate: u32,
    ) -> Vec<FrameFeature> {
        let mut analyzer = SpectralAnalyzer::new(frame_len, sample_rate);
        let mut features = Vec::new();
        let mut i = 0;
        while i + frame_len < samples.len() {
            features.push(self.classify_frame(&samples[i..i + frame_len], &mut analyzer));
            i += hop_len;
        }
        features
    }

    fn classify_frame(&self, frame: &[f32], analyzer: &mut SpectralAnalyzer) -> FrameFeature {
        let energy = rms_scaled(frame);
        let zcr = zero_crossing_rate(frame);
        let spectral = analyzer.analyze(frame);

        let mut score = 0u8;
        if (CENTROID_MIN_HZ..CENTROID_MAX_HZ).contains(&spectral.centroid) {
            score += 1;
        }
        if spectral.bandwidth > BANDWIDTH_MIN_HZ {
            score += 1;
        }
        if spectral.rolloff < ROLLOFF_MAX_HZ {
            score += 1;
        }

        let is_speech = energy > self.effective_threshold
            && zcr > ZCR_MIN
            && zcr < ZCR_MAX
            && score >= SPECTRAL_SCORE_MIN;

        FrameFeature {
            energy,
            zcr,
            centroid: spectral.centroid,
            bandwidth: spectral.bandwidth,
            rolloff: spectral.rolloff,
            is_speech,
        }
    }
}

/// Frame RMS scaled to the i16 amplitude range.
pub(crate) fn rms_scaled(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = frame.iter().map(|s| s * s).sum();
    (sum_sq / frame.len() as f32).sqrt() * 32767.0
}

/// Fraction of adjacent sample pairs whose sign differs.
pub(crate) fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| sign(pair[0]) != sign(pair[1]))
        .count();
    crossings as f32 / frame.len() as f32
}

fn sign(x: f32) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

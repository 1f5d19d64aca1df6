//! Frequency-domain frame descriptors.
//!
//! A forward FFT magnitude spectrum feeds three shape features:
//!
//! - **centroid** — magnitude-weighted mean frequency,
//! - **bandwidth** — weighted standard deviation around the centroid,
//! - **rolloff** — lowest frequency below which 85% of cumulative spectral
//!   energy lies.
//!
//! A frame with no spectral energy (or any other degenerate input) yields
//! the zero triple; this stage never reports an error.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Cumulative-energy fraction defining the rolloff frequency.
const ROLLOFF_FRACTION: f32 = 0.85;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralFeatures {
    /// Magnitude-weighted mean frequency (Hz).
    pub centroid: f32,
    /// Weighted standard deviation of frequency around the centroid (Hz).
    pub bandwidth: f32,
    /// 85% cumulative-energy rolloff point (Hz).
    pub rolloff: f32,
}

/// Reusable per-clip analyzer: one FFT plan, one scratch buffer.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    frame_len: usize,
    sample_rate: u32,
    scratch: Vec<Complex<f32>>,
}

impl SpectralAnalyzer {
    pub fn new(frame_len: usize, sample_rate: u32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(frame_len.max(1));
        Self {
            fft,
            frame_len,
            sample_rate,
            scratch: vec![Complex::default(); frame_len],
        }
    }

    /// Compute the feature triple for one frame.
    ///
    /// Frames of the wrong length or with zero total energy degrade to
    /// `SpectralFeatures::default()` rather than failing.
    pub fn analyze(&mut self, frame: &[f32]) -> SpectralFeatures {
        if frame.len() != self.frame_len || self.frame_len == 0 {
            return SpectralFeatures::default();
        }

        for (slot, sample) in self.scratch.iter_mut().zip(frame) {
            *slot = Complex::new(*sample, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Real input: the spectrum is symmetric, keep bins 0..=N/2.
        let bins = self.frame_len / 2 + 1;
        let freq_step = self.sample_rate as f32 / self.frame_len as f32;
        let magnitudes: Vec<f32> = self.scratch[..bins].iter().map(|c| c.norm()).collect();

        let total: f32 = magnitudes.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return SpectralFeatures::default();
        }

        let weighted: f32 = magnitudes
            .iter()
            .enumerate()
            .map(|(k, m)| m * k as f32 * freq_step)
            .sum();
        let centroid = weighted / total;

        let variance: f32 = magnitudes
            .iter()
            .enumerate()
            .map(|(k, m)| {
                let d = k as f32 * freq_step - centroid;
                m * d * d
            })
            .sum::<f32>()
            / total;
        let bandwidth = variance.sqrt();

        let target = total * ROLLOFF_FRACTION;
        let mut cumulative = 0.0f32;
        let mut rolloff = (bins - 1) as f32 * freq_step;
        for (k, m) in magnitudes.iter().enumerate() {
            cumulative += m;
            if cumulative >= target {
                rolloff = k as f32 * freq_step;
                break;
            }
        }

        SpectralFeatures {
            centroid,
            bandwidth,
            rolloff,
        }
    }
}

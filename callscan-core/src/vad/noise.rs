//! Ambient noise-floor estimation.
//!
//! The floor is a low percentile of frame RMS energies: low enough to sit
//! under any real speech, high enough to ride above electrical hum and line
//! static on noisy trunks. The adaptive frame classifier lifts its effective
//! threshold above this value.

use super::frame::rms_scaled;

/// Percentile of sorted frame energies taken as the floor.
const FLOOR_PERCENTILE: f64 = 0.10;

/// Estimate the noise floor of peak-normalized mono samples, on the i16
/// amplitude scale. Returns 0.0 when the clip is shorter than one frame.
pub fn estimate_noise_floor(samples: &[f32], frame_len: usize, hop_len: usize) -> f32 {
    let mut energies = Vec::new();
    let mut i = 0;
    while i + frame_len < samples.len() {
        energies.push(rms_scaled(&samples[i..i + frame_len]));
        i += hop_len;
    }
    if energies.is_empty() {
        return 0.0;
    }
    energies.sort_by(|a, b| a.total_cmp(b));
    percentile(&energies, FLOOR_PERCENTILE)
}

/// Linear-interpolated percentile over an already-sorted slice.
fn percentile(sorted: &[f32], p: f64) -> f32 {
    let rank = (sorted.len() - 1) as f64 * p;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = (rank - lo as f64) as f32;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_signal_floor_equals_its_energy() {
        // ±0.5 square wave: RMS 0.5 → 16383.5 on the i16 scale.
        let samples: Vec<f32> = (0..4000)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let floor = estimate_noise_floor(&samples, 400, 200);
        assert_relative_eq!(floor, 16383.5, epsilon = 1.0);
    }

    #[test]
    fn mostly_silent_clip_has_zero_floor() {
        let mut samples = vec![0.0f32; 8000];
        for s in samples[6000..6400].iter_mut() {
            *s = 0.9;
        }
        let floor = estimate_noise_floor(&samples, 400, 200);
        assert_relative_eq!(floor, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn clip_shorter_than_one_frame_yields_zero() {
        let samples = vec![0.5f32; 100];
        assert_eq!(estimate_noise_floor(&samples, 400, 200), 0.0);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = vec![0.0, 10.0];
        assert_relative_eq!(percentile(&sorted, 0.10), 1.0, epsilon = 1e-6);
        assert_relative_eq!(percentile(&sorted, 0.50), 5.0, epsilon = 1e-6);
        let single = vec![7.0];
        assert_eq!(percentile(&single, 0.10), 7.0);
    }
}

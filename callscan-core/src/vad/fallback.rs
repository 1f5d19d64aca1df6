//! Coarse loudness-based fallback detector.
//!
//! Selected when the primary pipeline reports a [`VadError`](super::VadError).
//! Works directly on clip loudness in 10 ms steps against a fixed dBFS
//! threshold: silent gaps shorter than 200 ms do not terminate a span, and
//! spans shorter than 100 ms are dropped as noise. This path cannot fail;
//! its worst case is an empty list.

use crate::audio::AudioClip;

use super::SpeechSegment;

/// Loudness threshold separating signal from line silence (dBFS, full scale
/// = 1.0).
const SILENCE_THRESHOLD_DBFS: f32 = -40.0;
/// Minimum silent gap that terminates a span (ms).
const MIN_SILENCE_MS: f64 = 200.0;
/// Spans shorter than this are discarded (ms).
const MIN_SPAN_MS: f64 = 100.0;
/// Loudness analysis granularity (ms).
const STEP_MS: f64 = 10.0;

/// Detect loud spans of the clip.
pub fn detect_loud_spans(clip: &AudioClip) -> Vec<SpeechSegment> {
    if clip.sample_rate == 0 || clip.samples.is_empty() {
        return Vec::new();
    }
    let step = (STEP_MS / 1000.0 * clip.sample_rate as f64) as usize;
    if step == 0 {
        return Vec::new();
    }

    let loud: Vec<bool> = clip
        .samples
        .chunks(step)
        .map(|chunk| dbfs(chunk) > SILENCE_THRESHOLD_DBFS)
        .collect();

    let gap_steps = (MIN_SILENCE_MS / STEP_MS) as usize;
    let step_ms = step as f64 / clip.sample_rate as f64 * 1000.0;

    let mut spans = Vec::new();
    // (first loud step, last loud step) of the open span.
    let mut current: Option<(usize, usize)> = None;
    let mut silent_run = 0usize;

    for (idx, &is_loud) in loud.iter().enumerate() {
        if is_loud {
            match current.as_mut() {
                Some((_, last)) => *last = idx,
                None => current = Some((idx, idx)),
            }
            silent_run = 0;
        } else if let Some((start, last)) = current {
            silent_run += 1;
            if silent_run >= gap_steps {
                push_span(&mut spans, start, last, step_ms);
                current = None;
                silent_run = 0;
            }
        }
    }
    if let Some((start, last)) = current {
        push_span(&mut spans, start, last, step_ms);
    }

    spans
}

fn push_span(spans: &mut Vec<SpeechSegment>, first: usize, last: usize, step_ms: f64) {
    let start_ms = first as f64 * step_ms;
    let end_ms = (last + 1) as f64 * step_ms;
    if end_ms - start_ms >= MIN_SPAN_MS {
        spans.push(SpeechSegment { start_ms, end_ms });
    }
}

fn dbfs(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_sq: f32 = chunk.iter().map(|s| s * s).sum();
    let rms = (sum_sq / chunk.len() as f32).sqrt();
    if rms <= 0.0 {
        return f32::NEG_INFINITY;
    }
    20.0 * rms.log10()
}

//! Decoded audio container and agent-channel extraction.

pub mod loader;

/// A fully decoded recording: interleaved f32 samples in [-1.0, 1.0].
///
/// A clip is exclusively owned by the processing of one file; the batch
/// orchestrator never shares one across workers, so no locking is required
/// anywhere downstream.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved samples, frame-major (`L R L R …` for stereo).
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count as reported by the decoder.
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_secs() * 1000.0
    }
}

/// Isolate the agent-side signal from a recording.
///
/// Dialer convention: left channel = agent, right channel = customer. Mono
/// recordings are assumed to already be agent-only, and any other channel
/// count falls back to the mono treatment.
pub fn extract_agent_channel(clip: AudioClip) -> AudioClip {
    if clip.channels == 2 {
        let left: Vec<f32> = clip.samples.iter().step_by(2).copied().collect();
        AudioClip::new(left, clip.sample_rate, 1)
    } else {
        clip
    }
}

//! # callscan-core
//!
//! Deterministic classification engine for recorded two-party phone calls.
//! Detects two agent-failure patterns on the agent channel:
//!
//! - **Releasing** — the agent never produces speech for the entire call.
//! - **Late Hello** — the agent's first utterance begins after a configured
//!   grace period.
//!
//! ## Architecture
//!
//! ```text
//! BatchOrchestrator ─(worker pool, per file)─► load_clip
//!                                                  │
//!                                        extract_agent_channel
//!                                                  │
//!                                        detect_speech_segments
//!                                        (primary VAD, loudness fallback)
//!                                                  │
//!                                   { releasing, late_hello } rules
//!                                                  │
//!                                        FileProcessingResult
//! ```
//!
//! Identical input audio and configuration always yield identical results:
//! no randomness, no learned weights, no global mutable state.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod analyze;
pub mod audio;
pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod vad;

// Convenience re-exports for downstream crates
pub use analyze::{analyze_clip, ClipDiagnostics};
pub use audio::{extract_agent_channel, loader::load_clip, AudioClip};
pub use batch::{BatchOrchestrator, FileProcessingResult};
pub use classify::{classify_call, CallClassification, Flag};
pub use config::{AnalysisConfig, Sensitivity};
pub use error::{CallscanError, Result};
pub use vad::{detect_speech_segments, SpeechSegment, VadMode};

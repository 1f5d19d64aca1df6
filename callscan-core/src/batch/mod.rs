//! Concurrent folder processing.
//!
//! ```text
//!   find_audio_files ──▶ job channel ──▶ worker × N ──▶ result channel
//!                                            │
//!                                   process_file_isolated
//!                              (validate → load → classify)
//! ```
//!
//! Workers are spawned once per run and pull file paths until the job
//! channel closes. Results are collected in completion batches of
//! [`BATCH_SIZE`], with a progress checkpoint after each batch. Every
//! failure — unreadable file, decode error, even a panic inside one file's
//! pipeline — is converted into a failure record for that file; one bad
//! recording never takes down the run.

mod identity;

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::unbounded;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::extract_agent_channel;
use crate::audio::loader::{load_clip, SUPPORTED_EXTENSIONS};
use crate::classify::{classify_call, CallClassification};
use crate::config::AnalysisConfig;
use crate::error::{CallscanError, Result};

pub use identity::{parse_identity, CallIdentity};

/// Files dispatched per progress checkpoint.
const BATCH_SIZE: usize = 20;
/// Upper bound on worker threads regardless of core count.
const MAX_WORKERS: usize = 16;
/// Files below this size cannot hold a decodable call.
const MIN_FILE_BYTES: u64 = 1024;
/// Clips below this duration are rejected before classification.
const MIN_CLIP_MS: f64 = 1000.0;

/// Outcome of processing one recording file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProcessingResult {
    pub agent_name: String,
    pub phone_number: String,
    pub file_path: PathBuf,
    pub classification_success: bool,
    pub classification: Option<CallClassification>,
    pub error: Option<String>,
}

impl FileProcessingResult {
    fn success(path: &Path, classification: CallClassification) -> Self {
        let identity = identity_of(path);
        Self {
            agent_name: identity.agent_name,
            phone_number: identity.phone_number,
            file_path: path.to_path_buf(),
            classification_success: true,
            classification: Some(classification),
            error: None,
        }
    }

    fn failure(path: &Path, message: String) -> Self {
        let identity = identity_of(path);
        Self {
            agent_name: identity.agent_name,
            phone_number: identity.phone_number,
            file_path: path.to_path_buf(),
            classification_success: false,
            classification: None,
            error: Some(message),
        }
    }

    /// Whether this result should appear in the flagged report.
    pub fn flagged(&self) -> bool {
        self.classification.map_or(false, |c| c.flagged())
    }
}

fn identity_of(path: &Path) -> CallIdentity {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    parse_identity(stem)
}

/// Drives a pool of classification workers over a set of files.
pub struct BatchOrchestrator {
    config: AnalysisConfig,
    workers: usize,
}

impl BatchOrchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            workers: default_worker_count(),
        }
    }

    /// Override the worker count (floored at 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Recursively collect supported audio files under `root`, sorted by
    /// path for a deterministic processing order. A missing or unreadable
    /// root yields an empty list.
    pub fn find_audio_files(root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_audio_files(root, &mut files);
        files.sort();
        files
    }

    /// Discover and process every supported recording under `root`.
    pub fn process_folder(
        &self,
        root: &Path,
        progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> Vec<FileProcessingResult> {
        let files = Self::find_audio_files(root);
        self.process_files(&files, progress)
    }

    /// Process a fixed file list with the worker pool.
    ///
    /// Returns one result per input file. Results arrive in completion
    /// order, not input order. The progress callback fires after every
    /// completed batch with `(done, total)`.
    pub fn process_files(
        &self,
        files: &[PathBuf],
        progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> Vec<FileProcessingResult> {
        let total = files.len();
        if total == 0 {
            return Vec::new();
        }
        info!(total, workers = self.workers, "batch started");

        let (job_tx, job_rx) = unbounded::<PathBuf>();
        let (result_tx, result_rx) = unbounded::<FileProcessingResult>();

        let mut results = Vec::with_capacity(total);
        thread::scope(|scope| {
            for _ in 0..self.workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let config = &self.config;
                scope.spawn(move || {
                    for path in job_rx.iter() {
                        let result = process_file_isolated(&path, config);
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            let mut completed = 0usize;
            for batch in files.chunks(BATCH_SIZE) {
                for path in batch {
                    // Workers outlive the sends; a send failure means every
                    // worker already exited, which only happens on teardown.
                    if job_tx.send(path.clone()).is_err() {
                        break;
                    }
                }
                for _ in 0..batch.len() {
                    match result_rx.recv() {
                        Ok(result) => results.push(result),
                        Err(_) => break,
                    }
                }
                completed += batch.len();
                debug!(completed, total, "batch checkpoint");
                if let Some(callback) = progress {
                    callback(completed, total);
                }
            }
            drop(job_tx);
        });

        let failures = results.iter().filter(|r| !r.classification_success).count();
        info!(total, failures, "batch finished");
        results
    }
}

/// Worker count used when none is configured: twice the core count, capped.
pub fn default_worker_count() -> usize {
    (num_cpus::get() * 2).clamp(1, MAX_WORKERS)
}

fn collect_audio_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_audio_files(&path, files);
        } else if has_supported_extension(&path) {
            files.push(path);
        }
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

/// Process one file, absorbing panics into a failure record.
fn process_file_isolated(path: &Path, config: &AnalysisConfig) -> FileProcessingResult {
    run_isolated(path, || process_file(path, config))
}

/// Convert a per-file pipeline outcome into a result record, catching
/// panics at the file boundary.
fn run_isolated(
    path: &Path,
    pipeline: impl FnOnce() -> Result<CallClassification>,
) -> FileProcessingResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(pipeline));
    match outcome {
        Ok(Ok(classification)) => FileProcessingResult::success(path, classification),
        Ok(Err(err)) => {
            warn!(path = %path.display(), %err, "file failed");
            FileProcessingResult::failure(path, err.to_string())
        }
        Err(_) => {
            warn!(path = %path.display(), "file processing panicked");
            FileProcessingResult::failure(path, format!("processing panicked: {}", path.display()))
        }
    }
}

/// Validate, load, and classify one recording.
pub fn process_file(path: &Path, config: &AnalysisConfig) -> Result<CallClassification> {
    validate_file(path)?;
    let clip = load_clip(path)?;
    let agent = extract_agent_channel(clip);
    if agent.duration_ms() < MIN_CLIP_MS {
        return Err(CallscanError::TooShort {
            duration_ms: agent.duration_ms() as u64,
        });
    }
    Ok(classify_call(&agent, config))
}

fn validate_file(path: &Path) -> Result<()> {
    if !has_supported_extension(path) {
        return Err(CallscanError::InvalidFile {
            path: path.to_path_buf(),
        });
    }
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        // A vanished path is an invalid input file, not an internal IO fault.
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CallscanError::InvalidFile {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    if !metadata.is_file() || metadata.len() < MIN_FILE_BYTES {
        return Err(CallscanError::InvalidFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_supported_extension(Path::new("call.MP3")));
        assert!(has_supported_extension(Path::new("call.wav")));
        assert!(has_supported_extension(Path::new("call.m4a")));
        assert!(!has_supported_extension(Path::new("call.txt")));
        assert!(!has_supported_extension(Path::new("call")));
    }

    #[test]
    fn missing_root_yields_empty_list() {
        let files = BatchOrchestrator::find_audio_files(Path::new("/nonexistent/callscan"));
        assert!(files.is_empty());
    }

    #[test]
    fn worker_count_is_bounded() {
        let count = default_worker_count();
        assert!((1..=MAX_WORKERS).contains(&count));
        let orchestrator =
            BatchOrchestrator::new(AnalysisConfig::default()).with_workers(0);
        assert_eq!(orchestrator.workers(), 1);
    }

    #[test]
    fn unsupported_extension_is_invalid() {
        let err = validate_file(Path::new("call.txt")).unwrap_err();
        assert!(matches!(err, CallscanError::InvalidFile { .. }));
    }

    #[test]
    fn missing_path_is_invalid_file() {
        let err = process_file(
            Path::new("/nonexistent/callscan/Agent_5550100.wav"),
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CallscanError::InvalidFile { .. }));
        assert!(err.to_string().contains("invalid audio file"));
    }

    #[test]
    fn panicking_pipeline_becomes_failure_record() {
        let path = Path::new("recordings/JohnSmith_5550199.wav");
        let result = run_isolated(path, || panic!("decoder blew up"));
        assert!(!result.classification_success);
        assert!(result.classification.is_none());
        let message = result.error.as_deref().expect("error message");
        assert!(message.contains("panicked"), "message={message}");
        // Identity parsing still works for the failure record.
        assert_eq!(result.agent_name, "John Smith");
        assert_eq!(result.phone_number, "5550199");
    }
}

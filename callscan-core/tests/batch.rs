//! End-to-end batch classification over synthetic WAV recordings.

use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;

use callscan_core::{
    AnalysisConfig, BatchOrchestrator, FileProcessingResult, Flag,
};

const RATE: u32 = 8000;

/// Fresh scratch directory per test.
fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("callscan-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Mono clip with 800 Hz bursts over silence.
fn clip_with_bursts(total_ms: f64, bursts: &[(f64, f64)]) -> Vec<f32> {
    let total = (total_ms / 1000.0 * RATE as f64) as usize;
    let mut samples = vec![0.0f32; total];
    for &(start_ms, end_ms) in bursts {
        let start = (start_ms / 1000.0 * RATE as f64) as usize;
        let end = ((end_ms / 1000.0 * RATE as f64) as usize).min(total);
        for (i, sample) in samples[start..end].iter_mut().enumerate() {
            let t = i as f32 / RATE as f32;
            *sample = 0.5 * (2.0 * std::f32::consts::PI * 800.0 * t).sin();
        }
    }
    samples
}

fn write_wav(path: &PathBuf, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &sample in samples {
        let value = (sample * i16::MAX as f32) as i16;
        writer.write_sample(value).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

fn single_result(results: &[FileProcessingResult]) -> &FileProcessingResult {
    assert_eq!(results.len(), 1);
    &results[0]
}

#[test]
fn silent_call_is_releasing() {
    let dir = temp_dir("silent");
    write_wav(
        &dir.join("JohnSmith_5550100.wav"),
        &clip_with_bursts(10_000.0, &[]),
    );

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(2);
    let results = orchestrator.process_folder(&dir, None);
    let result = single_result(&results);
    assert!(result.classification_success);
    let classification = result.classification.expect("classification present");
    assert_eq!(classification.releasing, Flag::Yes);
    assert_eq!(classification.late_hello, Flag::No);
    assert_eq!(result.agent_name, "John Smith");
    assert_eq!(result.phone_number, "5550100");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn late_first_utterance_is_late_hello() {
    let dir = temp_dir("late");
    write_wav(
        &dir.join("MaryJones_555-0101.wav"),
        &clip_with_bursts(8000.0, &[(6200.0, 7200.0)]),
    );

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(2);
    let results = orchestrator.process_folder(&dir, None);
    let result = single_result(&results);
    let classification = result.classification.expect("classification present");
    assert_eq!(classification.releasing, Flag::No);
    assert_eq!(classification.late_hello, Flag::Yes);
    assert_eq!(result.phone_number, "5550101");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn prompt_greeting_passes_both_rules() {
    let dir = temp_dir("ontime");
    write_wav(
        &dir.join("Agent_5550102.wav"),
        &clip_with_bursts(8000.0, &[(2000.0, 3000.0)]),
    );

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(2);
    let results = orchestrator.process_folder(&dir, None);
    let classification = single_result(&results)
        .classification
        .expect("classification present");
    assert_eq!(classification.releasing, Flag::No);
    assert_eq!(classification.late_hello, Flag::No);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn short_silent_call_is_not_flagged() {
    // 3 s of silence: shorter than the 5 s grace period, so not Releasing.
    let dir = temp_dir("short");
    write_wav(
        &dir.join("Agent_5550103.wav"),
        &clip_with_bursts(3000.0, &[]),
    );

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(1);
    let results = orchestrator.process_folder(&dir, None);
    let result = single_result(&results);
    assert!(result.classification_success);
    let classification = result.classification.expect("classification present");
    assert_eq!(classification.releasing, Flag::No);
    assert_eq!(classification.late_hello, Flag::No);
    assert!(!result.flagged());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn one_bad_file_does_not_sink_the_batch() {
    let dir = temp_dir("isolation");
    for i in 0..5 {
        let path = dir.join(format!("Agent{i}_555010{i}.wav"));
        if i == 3 {
            // Zero-byte stand-in for a truncated upload.
            fs::write(&path, []).expect("write empty file");
        } else {
            write_wav(&path, &clip_with_bursts(8000.0, &[(1000.0, 2000.0)]));
        }
    }

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(4);
    let results = orchestrator.process_folder(&dir, None);
    assert_eq!(results.len(), 5);
    let successes = results.iter().filter(|r| r.classification_success).count();
    assert_eq!(successes, 4);

    let failure = results
        .iter()
        .find(|r| !r.classification_success)
        .expect("one failure");
    assert!(failure.classification.is_none());
    let message = failure.error.as_deref().expect("error message");
    assert!(message.contains("invalid"), "message={message}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn undecodable_file_reports_load_failure() {
    let dir = temp_dir("garbage");
    let path = dir.join("Agent_5550104.mp3");
    fs::write(&path, vec![0xA5u8; 4096]).expect("write garbage");

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(1);
    let results = orchestrator.process_folder(&dir, None);
    let result = single_result(&results);
    assert!(!result.classification_success);
    let message = result.error.as_deref().expect("error message");
    assert!(message.contains("load"), "message={message}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn classification_is_deterministic_across_runs() {
    let dir = temp_dir("determinism");
    write_wav(
        &dir.join("Agent_5550105.wav"),
        &clip_with_bursts(8000.0, &[(5200.0, 6200.0)]),
    );

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(3);
    let first = orchestrator.process_folder(&dir, None);
    let second = orchestrator.process_folder(&dir, None);
    assert_eq!(
        single_result(&first).classification,
        single_result(&second).classification
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn progress_fires_once_per_completed_batch() {
    let dir = temp_dir("progress");
    let samples = clip_with_bursts(6000.0, &[(1000.0, 2000.0)]);
    for i in 0..25 {
        write_wav(&dir.join(format!("Agent_55502{i:02}.wav")), &samples);
    }

    let checkpoints: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
    let record = |done: usize, total: usize| checkpoints.lock().push((done, total));

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(4);
    let results = orchestrator.process_folder(&dir, Some(&record));
    assert_eq!(results.len(), 25);
    assert_eq!(*checkpoints.lock(), vec![(20, 25), (25, 25)]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn results_cover_every_input_exactly_once() {
    let dir = temp_dir("coverage");
    let samples = clip_with_bursts(6000.0, &[(500.0, 1500.0)]);
    for i in 0..7 {
        write_wav(&dir.join(format!("Agent{i}_5550{i}.wav")), &samples);
    }

    let files = BatchOrchestrator::find_audio_files(&dir);
    assert_eq!(files.len(), 7);

    let orchestrator = BatchOrchestrator::new(AnalysisConfig::default()).with_workers(4);
    let results = orchestrator.process_files(&files, None);
    assert_eq!(results.len(), 7);

    let mut seen: Vec<_> = results.iter().map(|r| r.file_path.clone()).collect();
    seen.sort();
    assert_eq!(seen, files);

    let _ = fs::remove_dir_all(&dir);
}

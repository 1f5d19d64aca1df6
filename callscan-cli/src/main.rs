//! `callscan` — scan a folder of call recordings for Releasing and Late
//! Hello calls.
//!
//! ```text
//! callscan ./recordings
//! callscan ./recordings --sensitivity high --json
//! callscan ./recordings/JohnSmith_5550199.wav --debug
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use callscan_core::{
    analyze_clip, extract_agent_channel, load_clip, AnalysisConfig, BatchOrchestrator,
    FileProcessingResult, Sensitivity,
};

#[derive(Debug, Parser)]
#[command(name = "callscan", version, about = "Classify call recordings for agent failures")]
struct Args {
    /// Folder of recordings (or a single file with --debug).
    root: PathBuf,

    /// VAD sensitivity preset: high, medium, or low (default: medium).
    #[arg(long)]
    sensitivity: Option<Sensitivity>,

    /// Override the late-hello grace period (seconds).
    #[arg(long)]
    late_hello_secs: Option<f64>,

    /// Override the frame energy threshold (i16 scale).
    #[arg(long)]
    energy_threshold: Option<f32>,

    /// Worker thread count (default: 2× cores, capped at 16).
    #[arg(long)]
    workers: Option<usize>,

    /// JSON config file; CLI flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit results as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Analyze one file in detail instead of running a batch.
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    if args.debug {
        return run_debug(&args, &config);
    }
    run_batch(&args, &config)
}

/// Config file first, then flag overrides on top.
fn resolve_config(args: &Args) -> anyhow::Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let mut config: AnalysisConfig = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            // An explicit preset beats the file's VAD thresholds, like the
            // other flag overrides below.
            if let Some(sensitivity) = args.sensitivity {
                let preset = AnalysisConfig::with_sensitivity(sensitivity);
                config.vad_energy_threshold = preset.vad_energy_threshold;
                config.vad_min_speech_duration_ms = preset.vad_min_speech_duration_ms;
            }
            config
        }
        None => AnalysisConfig::with_sensitivity(args.sensitivity.unwrap_or(Sensitivity::Medium)),
    };
    if let Some(secs) = args.late_hello_secs {
        config.late_hello_time_secs = secs;
    }
    if let Some(threshold) = args.energy_threshold {
        config.vad_energy_threshold = threshold;
    }
    Ok(config)
}

fn run_batch(args: &Args, config: &AnalysisConfig) -> anyhow::Result<()> {
    let mut orchestrator = BatchOrchestrator::new(config.clone());
    if let Some(workers) = args.workers {
        orchestrator = orchestrator.with_workers(workers);
    }

    let files = BatchOrchestrator::find_audio_files(&args.root);
    if files.is_empty() {
        anyhow::bail!("no supported audio files under {}", args.root.display());
    }
    info!(files = files.len(), "starting scan");

    let progress = |done: usize, total: usize| {
        eprintln!("processed {done}/{total}");
    };
    let results = orchestrator.process_files(&files, Some(&progress));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let flagged: Vec<&FileProcessingResult> = results.iter().filter(|r| r.flagged()).collect();
    let failed: Vec<&FileProcessingResult> = results
        .iter()
        .filter(|r| !r.classification_success)
        .collect();

    print_table(&flagged);
    println!(
        "\n{} files scanned, {} flagged, {} failed",
        results.len(),
        flagged.len(),
        failed.len()
    );
    for failure in &failed {
        eprintln!(
            "failed: {} ({})",
            failure.file_path.display(),
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_table(flagged: &[&FileProcessingResult]) {
    if flagged.is_empty() {
        println!("No flagged calls.");
        return;
    }
    println!("{:<24} {:<14} {:<10} {:<10}", "Agent", "Phone", "Releasing", "LateHello");
    for result in flagged {
        let classification = match result.classification {
            Some(c) => c,
            None => continue,
        };
        println!(
            "{:<24} {:<14} {:<10} {:<10}",
            result.agent_name,
            result.phone_number,
            classification.releasing.to_string(),
            classification.late_hello.to_string()
        );
    }
}

/// Single-file diagnostic mode.
fn run_debug(args: &Args, config: &AnalysisConfig) -> anyhow::Result<()> {
    let clip = load_clip(&args.root)
        .with_context(|| format!("loading {}", args.root.display()))?;
    let agent = extract_agent_channel(clip);
    let report = analyze_clip(&agent, config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("file:          {}", args.root.display());
    println!("duration:      {:.1} ms", report.duration_ms);
    println!("segments:      {}", report.segment_count);
    match report.first_onset_ms {
        Some(onset) => println!("first onset:   {onset:.1} ms"),
        None => println!("first onset:   none"),
    }
    println!("speech ratio:  {:.1}%", report.speech_ratio * 100.0);
    println!("releasing:     {}", report.releasing);
    println!("late hello:    {}", report.late_hello);
    for segment in &report.segments {
        println!("  segment {:.1} .. {:.1} ms", segment.start_ms, segment.end_ms);
    }
    Ok(())
}

mod manifest;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use liveguard_core::analysis::infrastructure::analyzer_suite::AnalyzerSuite;
use liveguard_core::pipeline::liveness_orchestrator::LivenessOrchestrator;
use liveguard_core::pipeline::liveness_stage::LivenessStage;
use liveguard_core::pipeline::session_logger::LogSessionLogger;
use liveguard_core::scoring::domain::fusion_scorer::DecisionThresholds;
use liveguard_core::scoring::domain::liveness_scorer::LivenessScorer;
use liveguard_core::scoring::infrastructure::cached_liveness_scorer::CachedLivenessScorer;
use liveguard_core::scoring::infrastructure::onnx_liveness_scorer::OnnxLivenessScorer;
use liveguard_core::shared::config::LivenessConfig;
use liveguard_core::shared::constants::CNN_SCALE_FACTORS;
use liveguard_core::shared::frame::Frame;

use manifest::Manifest;

const EXIT_FAIL: i32 = 2;
const EXIT_UNDECIDED: i32 = 3;

/// Face liveness check over a recorded session.
#[derive(Parser)]
#[command(name = "liveguard")]
struct Cli {
    /// Session manifest (JSON) listing frames and detector output.
    manifest: PathBuf,

    /// JSON configuration file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the strict pass/fail thresholds (0.85/0.55).
    #[arg(long)]
    strict: bool,

    /// Anti-spoofing ONNX model (repeat for an ensemble). Without a model,
    /// per-frame `cnn_score` values from the manifest are used.
    #[arg(long = "model")]
    models: Vec<PathBuf>,

    /// Face-box scale factor per model, in the same order as --model.
    #[arg(long, value_delimiter = ',')]
    model_scales: Option<Vec<f64>>,

    /// Run the stateless analyzers in parallel within each frame.
    #[arg(long)]
    parallel: bool,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(stage) => process::exit(exit_code(&stage)),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<LivenessStage, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let manifest = Manifest::load(&cli.manifest)?;

    let scorer = build_scorer(&cli, &manifest)?;
    let extractor = AnalyzerSuite::new(scorer, &config);
    let mut orchestrator = LivenessOrchestrator::new(config, Box::new(extractor))?
        .with_logger(Box::new(LogSessionLogger::default()));

    let mut stage = orchestrator.stage().clone();
    for (index, entry) in manifest.frames.iter().enumerate() {
        let rgb = image::open(&entry.image)
            .map_err(|e| format!("failed to open {}: {e}", entry.image.display()))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height, 3, index)
            .with_timestamp_ms(entry.timestamp_ms(index));

        stage = orchestrator.process_frame(&frame, &entry.observation());
        if stage.is_terminal() {
            if index + 1 < manifest.frames.len() {
                log::info!(
                    "Decision reached after {} of {} frames",
                    index + 1,
                    manifest.frames.len()
                );
            }
            break;
        }
    }

    println!("{}", serde_json::to_string_pretty(&stage)?);
    Ok(stage)
}

fn build_config(cli: &Cli) -> Result<LivenessConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => LivenessConfig::from_json_file(path)?,
        None => LivenessConfig::default(),
    };
    if cli.strict {
        config.thresholds = DecisionThresholds::strict();
    }
    if cli.parallel {
        config.parallel_analysis = true;
    }
    config.validate()?;
    Ok(config)
}

fn build_scorer(
    cli: &Cli,
    manifest: &Manifest,
) -> Result<Box<dyn LivenessScorer>, Box<dyn std::error::Error>> {
    if cli.models.is_empty() {
        let cache: HashMap<usize, f64> = manifest
            .frames
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.cnn_score.map(|score| (i, score)))
            .collect();
        if cache.is_empty() {
            log::warn!("No --model and no cnn_score in manifest; CNN signal will be neutral");
        }
        return Ok(Box::new(CachedLivenessScorer::new(Arc::new(cache))));
    }

    let scales = match &cli.model_scales {
        Some(scales) if scales.len() != cli.models.len() => {
            return Err(format!(
                "--model-scales has {} values for {} models",
                scales.len(),
                cli.models.len()
            )
            .into());
        }
        Some(scales) => scales.clone(),
        None => (0..cli.models.len())
            .map(|i| CNN_SCALE_FACTORS[i.min(CNN_SCALE_FACTORS.len() - 1)])
            .collect(),
    };
    let models: Vec<_> = cli
        .models
        .iter()
        .map(PathBuf::as_path)
        .zip(scales)
        .collect();
    Ok(Box::new(OnnxLivenessScorer::new(&models)?))
}

fn exit_code(stage: &LivenessStage) -> i32 {
    match stage.result() {
        Some(result) if result.passed => 0,
        Some(_) => EXIT_FAIL,
        None => EXIT_UNDECIDED,
    }
}

//! ppe_report - helmet compliance report for an image or video
//!
//! Either submits a media file to the detection service or renders a
//! previously saved service response, then prints the violation timeline
//! and the incident summary.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use ppe_report::config::normalize_service_url;
use ppe_report::render::{render_json, render_text};
use ppe_report::{
    parse_detection_payload, Analysis, AnalysisSession, DetectionResult, DetectionService,
    HttpDetectionService, MediaKind, ReportComposer, ReportConfig, ServiceError,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Image,
    Video,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image or video file to submit to the detection service.
    #[arg(long, conflicts_with = "result", required_unless_present = "result")]
    media: Option<PathBuf>,
    /// Saved detection service response (JSON) to render instead of submitting.
    #[arg(long)]
    result: Option<PathBuf>,
    /// Media kind of a saved result (default: video when it carries a duration).
    #[arg(long, value_enum, requires = "result")]
    kind: Option<KindArg>,
    /// Detection service base URL (overrides config).
    #[arg(long, env = "PPE_SERVICE_URL")]
    service_url: Option<String>,
    /// Report format written to stdout or --output.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also store the detection result as JSON for later --result runs.
    #[arg(long)]
    save_result: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, value_enum, default_value = "auto", value_name = "MODE")]
    ui: ui::UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = ui::Ui::new(args.ui, std::io::stderr().is_terminal());

    let mut cfg = ReportConfig::load()?;
    if let Some(url) = &args.service_url {
        cfg.service.url = normalize_service_url(url)?;
    }
    let composer = ReportComposer::new(cfg.notes.clone());
    let notes = composer.settings();
    log::debug!(
        "report notes: confidence threshold {}, min visibility {}s, fragmentation above {}",
        notes.confidence_threshold,
        notes.min_visibility_s,
        notes.fragmentation_threshold
    );

    let analysis = match (&args.media, &args.result) {
        (Some(media), _) => analyse_media(media, &cfg, &composer, &ui, args.save_result.as_deref())?,
        (None, Some(saved)) => {
            let result = load_saved_result(saved, &ui)?;
            let kind = match args.kind {
                Some(KindArg::Image) => MediaKind::Image,
                Some(KindArg::Video) => MediaKind::Video,
                None if result.video_duration_s.is_some() => MediaKind::Video,
                None => MediaKind::Image,
            };
            if let Some(path) = &args.save_result {
                save_result(path, &result)?;
            }
            Analysis::from_result(&result, kind, &composer)
        }
        (None, None) => return Err(anyhow!("either --media or --result is required")),
    };

    let report = match args.format {
        OutputFormat::Text => render_text(&analysis, cfg.timeline_columns, Some(&cfg.service.url)),
        OutputFormat::Json => render_json(&analysis)?,
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, report)
                .map_err(|e| anyhow!("failed to write report {}: {}", path.display(), e))?;
            println!("report written to {}", path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}

fn analyse_media(
    media: &Path,
    cfg: &ReportConfig,
    composer: &ReportComposer,
    ui: &ui::Ui,
    save_path: Option<&Path>,
) -> Result<Analysis> {
    let mut session = AnalysisSession::new();
    let kind = session.select(media)?.kind;
    let service = HttpDetectionService::from_settings(&cfg.service)?;

    let stage = ui.stage(match kind {
        MediaKind::Image => "Analyse image",
        MediaKind::Video => "Analyse video",
    });
    let result = service
        .analyze(session.require_current()?)
        .map_err(|err| {
            if let Some(service_err) = err.downcast_ref::<ServiceError>() {
                log::error!(
                    "analysis failed [{}]; make sure the detection service is running at {} and retry",
                    service_err.code,
                    service.base_url()
                );
            }
            err
        })?;
    stage.done();
    log::info!(
        "detection result: {} violations, {} compliant, {} total",
        result.violations,
        result.compliant,
        result.total_detections
    );

    if let Some(path) = save_path {
        save_result(path, &result)?;
    }
    let stage = ui.stage("Compose report");
    let analysis = session.record(&result, composer)?.clone();
    stage.done();
    Ok(analysis)
}

fn load_saved_result(path: &Path, ui: &ui::Ui) -> Result<DetectionResult> {
    let stage = ui.stage("Load detection result");
    let raw = std::fs::read(path)
        .map_err(|e| anyhow!("failed to read result file {}: {}", path.display(), e))?;
    let result = parse_detection_payload(&raw)?;
    stage.done();
    Ok(result)
}

fn save_result(path: &Path, result: &DetectionResult) -> Result<()> {
    let json = serde_json::to_vec_pretty(result)?;
    std::fs::write(path, json)
        .map_err(|e| anyhow!("failed to write result file {}: {}", path.display(), e))?;
    log::info!("detection result saved to {}", path.display());
    Ok(())
}

use anyhow::Context;
use clap::Parser;
use minedoc_vision::ocr::RecognizedText;
use minedoc_vision::{
    ErrorResponse, PageAnalysis, PipelineConfig, PipelineError, Preprocessor, TableConfig,
    TableSize,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug, Clone)]
#[command(name = "minedoc-vision")]
#[command(about = "Analyze scanned mining report pages: orientation, layout, document type and tables")]
#[command(version)]
pub struct Args {
    /// Page image to analyze (PNG, JPEG, TIFF, ...)
    pub input: PathBuf,

    /// Longest edge, in pixels, a page is scaled down to
    #[arg(long, env = "MINEDOC_MAX_IMAGE_SIZE", default_value = "4096")]
    pub max_image_size: u32,

    /// Minimum layout detection score
    #[arg(long, env = "MINEDOC_CONFIDENCE_THRESHOLD", default_value = "0.7")]
    pub confidence_threshold: f32,

    /// Request GPU inference (only the CPU backend is available)
    #[arg(long, env = "MINEDOC_ENABLE_GPU")]
    pub enable_gpu: bool,

    /// Straighten small skew before model inference
    #[arg(long, env = "MINEDOC_DESKEW")]
    pub deskew: bool,

    /// Skip the merged-cell heuristic during table extraction
    #[arg(long, env = "MINEDOC_NO_MERGED_CELLS")]
    pub no_merged_cells: bool,

    /// Minimum confidence of tables found by whole-page discovery
    #[arg(long, env = "MINEDOC_MIN_TABLE_CONFIDENCE", default_value = "0.75")]
    pub min_table_confidence: f32,

    /// Minimum table width and height in pixels for whole-page discovery
    #[arg(long, env = "MINEDOC_MIN_TABLE_SIZE", value_parser = parse_size, default_value = "100x50")]
    pub min_table_size: TableSize,

    /// Directory holding the .rten model files
    #[arg(long, env = "MINEDOC_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Base URL missing model files are downloaded from
    #[arg(long, env = "MINEDOC_MODEL_BASE_URL")]
    pub model_base_url: Option<String>,

    /// Write the enhanced page image to this path
    #[arg(long)]
    pub output_image: Option<PathBuf>,

    /// Recognize text of table cells and text regions
    #[arg(long)]
    pub ocr: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        Self {
            max_image_size: args.max_image_size,
            confidence_threshold: args.confidence_threshold,
            enable_gpu: args.enable_gpu,
            deskew: args.deskew,
            model_dir: args.model_dir,
            model_base_url: args.model_base_url,
            table: TableConfig {
                min_confidence: args.min_table_confidence,
                min_table_size: args.min_table_size,
                detect_merged_cells: !args.no_merged_cells,
            },
        }
    }
}

fn parse_size(value: &str) -> Result<TableSize, String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", value))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("{:?}: {}", v, e));
    Ok(TableSize {
        width: parse(width)?,
        height: parse(height)?,
    })
}

/// JSON report printed on stdout
#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    analysis: PageAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<Vec<RecognizedText>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the JSON report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting minedoc-vision v{}", env!("CARGO_PKG_VERSION"));

    let pretty = args.pretty;
    let outcome = run(args).await;

    let json = match &outcome {
        Ok(report) if pretty => serde_json::to_string_pretty(report)?,
        Ok(report) => serde_json::to_string(report)?,
        Err(e) => {
            tracing::error!("Analysis failed: {:#}", e);
            serde_json::to_string(&error_response(e))?
        }
    };
    println!("{}", json);

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<Report> {
    let input = args.input.clone();
    let output_image = args.output_image.clone();
    let with_ocr = args.ocr;
    let config = PipelineConfig::from(args);

    let bytes = tokio::fs::read(&input).await.map_err(PipelineError::from)?;
    tracing::info!("Analyzing {:?} ({} bytes)", input, bytes.len());

    let preprocessor = Preprocessor::from_config(config.clone());
    let mut analysis = preprocessor.analyze(&bytes).await?;

    if let Some(path) = output_image {
        analysis
            .preprocessing
            .processed_image
            .save(&path)
            .with_context(|| format!("Failed to write processed image to {:?}", path))?;
        tracing::info!("Wrote processed image to {:?}", path);
    }

    let text = if with_ocr {
        let (updated, text) =
            tokio::task::spawn_blocking(move || recognize(&config, analysis)).await??;
        analysis = updated;
        Some(text)
    } else {
        None
    };

    Ok(Report { analysis, text })
}

#[cfg(feature = "engine-ocrs")]
fn recognize(
    config: &PipelineConfig,
    mut analysis: PageAnalysis,
) -> anyhow::Result<(PageAnalysis, Vec<RecognizedText>)> {
    use minedoc_vision::ocr::{attach_text, OcrsRecognizer};

    let recognizer = OcrsRecognizer::from_config(config)?;
    let text = attach_text(&recognizer, &mut analysis)?;
    Ok((analysis, text))
}

#[cfg(not(feature = "engine-ocrs"))]
fn recognize(
    _config: &PipelineConfig,
    _analysis: PageAnalysis,
) -> anyhow::Result<(PageAnalysis, Vec<RecognizedText>)> {
    anyhow::bail!("--ocr requires the engine-ocrs feature")
}

fn error_response(err: &anyhow::Error) -> ErrorResponse {
    match err.downcast_ref::<PipelineError>() {
        Some(pipeline_error) => ErrorResponse::from(pipeline_error),
        None => ErrorResponse {
            error: format!("{:#}", err),
            code: "INTERNAL_ERROR".to_string(),
        },
    }
}

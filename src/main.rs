use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};
use xfl_player::export::{load_document, render_png_sequence, ExportOptions};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON document
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Directory the PNG frames are written to
    #[arg(long, short, default_value = "frames")]
    out: PathBuf,

    /// First frame to render
    #[arg(long, default_value_t = 0)]
    start: i64,

    /// Last frame to render, inclusive (defaults to the final frame)
    #[arg(long)]
    end: Option<i64>,

    /// Output width in pixels (defaults to the stage width)
    #[arg(long)]
    width: Option<i32>,

    /// Output height in pixels (defaults to the stage height)
    #[arg(long)]
    height: Option<i32>,

    /// Frame the output through the camera layer
    #[arg(long)]
    follow_camera: bool,

    /// Top-level layer indices to hide
    #[arg(long, value_delimiter = ',')]
    hide: Vec<usize>,

    /// Paint layers in index order instead of top-first
    #[arg(long)]
    reverse_layers: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    info!(document = ?cli.document, out = ?cli.out, "loading document");
    let document = load_document(&cli.document)?;

    let options = ExportOptions {
        width: cli.width,
        height: cli.height,
        start: cli.start,
        end: cli.end,
        follow_camera: cli.follow_camera,
        hidden_layers: cli.hide,
        reverse_layers: cli.reverse_layers,
    };
    let written = render_png_sequence(document, &options, &cli.out)?;
    info!(frames = written.len(), "render complete");
    Ok(())
}

//! `ttyrec-timeline`: record or read a ttyrec session and print its playback
//! timeline as JSON.
//!
//! Without `--script-file` a fresh session is recorded with the configured
//! recorder (ttyrec by default) into a temporary file. The resulting render
//! payload, `{"timeline": [[text, offset_ms], ..], "dimensions": [h, w]}`, is
//! written to `--output-file` or stdout.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttyrec_timeline::{
    ByteOrder, Config, DimensionProbe, Dimensions, Recorder, RenderPayload, Timeline,
    TimelineError, build_timeline,
};

#[derive(Parser, Debug)]
#[command(
    name = "ttyrec-timeline",
    about = "Turn a ttyrec recording into a playback timeline",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Command to record instead of an interactive shell
    #[arg(short, long, conflicts_with = "script_file")]
    command: Option<String>,

    /// Terminal dimensions to report
    #[arg(short, long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
    dimensions: Option<Vec<u16>>,

    /// Write the JSON here instead of stdout
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// Read an existing ttyrec log instead of recording one
    #[arg(short, long)]
    script_file: Option<PathBuf>,

    /// Byte order of frame headers: little, big or native
    #[arg(long, value_name = "ORDER")]
    byte_order: Option<ByteOrder>,

    /// Configuration file (TOML or JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit the frames before a truncated tail instead of failing
    #[arg(long)]
    allow_truncated: bool,
}

impl Cli {
    fn dimensions(&self) -> Option<Dimensions> {
        match self.dimensions.as_deref() {
            Some(&[height, width]) => Some(Dimensions::new(height, width)),
            _ => None,
        }
    }

    /// Configuration from file and environment, with flags on top.
    fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("loading configuration")?;
        if let Some(byte_order) = self.byte_order {
            config = config.byte_order(byte_order);
        }
        if let Some(dimensions) = self.dimensions() {
            config = config.dimensions(dimensions);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    run(&Cli::parse())
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config()?;

    let (timeline, replaying) = match &cli.script_file {
        Some(path) => (decode_file(path, &config)?, true),
        None => (record_session(cli.command.as_deref(), &config)?, false),
    };

    if let Some(&err) = timeline.truncation() {
        let err = TimelineError::truncated(timeline.len(), err);
        if !cli.allow_truncated {
            return Err(err).context("log is truncated (use --allow-truncated to keep the decoded frames)");
        }
        warn!(error = %err, "emitting partial timeline");
    }

    let probed = DimensionProbe::new()
        .explicit(config.dimensions)
        .probe_terminal(!replaying)
        .resolve();
    info!(
        frames = timeline.len(),
        duration_ms = timeline.duration_ms(),
        dimensions = %probed.dimensions,
        "timeline built"
    );

    let payload = RenderPayload::from_timeline(timeline, probed.dimensions);
    match &cli.output_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            payload
                .write_json(BufWriter::new(file))
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => payload
            .write_json(io::stdout().lock())
            .context("writing to stdout")?,
    }
    Ok(())
}

fn decode_file(path: &Path, config: &Config) -> Result<Timeline> {
    let log = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    info!(path = %path.display(), bytes = log.len(), "decoding ttyrec log");
    Ok(build_timeline(log, &config.decoder))
}

fn record_session(command: Option<&str>, config: &Config) -> Result<Timeline> {
    let scratch = tempfile::Builder::new()
        .prefix("ttyrec-timeline-")
        .suffix(".tty")
        .tempfile()
        .context("creating temporary recording file")?;

    Recorder::new(config.recorder.clone())
        .record(command, scratch.path())
        .context("recording session")?;
    decode_file(scratch.path(), config)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

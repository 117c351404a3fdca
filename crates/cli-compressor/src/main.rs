use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::{Context, Result};
use clap::Parser;
use compressor::{
    console,
    preview::{self, Preview},
    BatchConverter, BatchOutcome, ConvertConfig, FfmpegEncoder, InvocationStyle, Quality,
};
use crossterm::style::Stylize;
use log::{debug, info, LevelFilter};

const BANNER: &str = r#"
                __
 _      _____  / /_  ____  _____
| | /| / / _ \/ __ \/ __ \/ ___/
| |/ |/ /  __/ /_/ / /_/ / /__
|__/|__/\___/_.___/ .___/\___/
                 /_/
"#;

/// Batch-convert the images in a directory to WebP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the images
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Compression quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Run without preview and confirmation
    #[arg(short, long)]
    skip: bool,

    /// Replace originals: write outputs beside the sources and delete each converted source
    #[arg(short, long)]
    replace: bool,

    /// Also convert .avif files
    #[arg(long)]
    avif: bool,

    /// Number of workers (defaults to the number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Encoder binary to invoke
    #[arg(long)]
    encoder: Option<PathBuf>,

    /// Select the libwebp codec explicitly (`-c:v libwebp -quality`)
    #[arg(long)]
    libwebp: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG still wins over the flag
    env_logger::Builder::new()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console::failure(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    println!("{}", BANNER.magenta());

    let cfg = build_config(&args)?;
    debug!("Configuration: {:?}", cfg);

    let encoder = FfmpegEncoder::from_config(&cfg);
    let converter = BatchConverter::new(cfg, encoder);

    let mut prompt = |preview: &Preview| {
        preview.print();
        confirm_execution()
    };

    match converter.run(&args.directory, &mut prompt).await? {
        BatchOutcome::Cancelled => {
            console::info("Operation cancelled by user");
        }
        BatchOutcome::Completed(report) => {
            println!();
            if args.json {
                let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
                println!("{}", json);
            } else {
                report.print_summary();
            }
            info!(
                "Run finished: {} converted, {} failed",
                report.stats.converted, report.stats.failed
            );
        }
    }

    Ok(())
}

/// Config file first, then command-line overrides
fn build_config(args: &Args) -> Result<ConvertConfig> {
    let mut cfg = ConvertConfig::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(q) = args.quality {
        cfg.quality = Quality::new(q)?;
    }
    if let Some(encoder) = &args.encoder {
        cfg.encoder_bin = encoder.clone();
    }
    if args.libwebp {
        cfg.invocation = InvocationStyle::Libwebp;
    }
    if args.workers.is_some() {
        cfg.workers = args.workers;
    }
    cfg.skip_preview |= args.skip;
    cfg.in_place |= args.replace;
    cfg.include_avif |= args.avif;

    Ok(cfg)
}

/// Ask on stdin; anything but an explicit yes cancels
fn confirm_execution() -> bool {
    print!("\nContinue? (y/N): ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => preview::is_affirmative(&answer),
        Err(e) => {
            debug!("Failed to read confirmation: {}", e);
            false
        }
    }
}

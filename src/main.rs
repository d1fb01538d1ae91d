use clap::{Parser, Subcommand};
use imgpool::config::{self, PipelineConfig};
use imgpool::imaging::RustCodec;
use imgpool::pool::WorkerPool;
use imgpool::report::{Reporter, RunReport};
use imgpool::task::Operation;
use imgpool::{naming, output, scan};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that run a batch.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Comma-separated 1-based indices from `scan` (default: every image)
    #[arg(long, value_delimiter = ',')]
    select: Vec<usize>,

    /// Worker threads (default: [processing] workers, else CPU cores)
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(clap::Args, Clone)]
struct ZoomArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Magnification, > 0 (below 1 zooms out)
    #[arg(long)]
    level: Option<f32>,

    /// Focus point x as a fraction of the width
    #[arg(long)]
    center_x: Option<f32>,

    /// Focus point y as a fraction of the height
    #[arg(long)]
    center_y: Option<f32>,

    #[arg(long)]
    out_width: Option<u32>,

    #[arg(long)]
    out_height: Option<u32>,
}

#[derive(clap::Args, Clone)]
struct ResizeArgs {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser)]
#[command(name = "imgpool")]
#[command(about = "Batch image transforms on a fixed pool of worker threads")]
#[command(long_about = "\
Batch image transforms on a fixed pool of worker threads

Every image in the input directory (or the ones picked with --select) becomes
one task. A fixed number of workers load, transform and save them in parallel;
each result is printed as it completes, followed by a summary.

Output naming (in the output directory):

  zoom     cat.jpg → processed_cat.jpg_zoom.jpg
  rotate   cat.jpg → processed_cat.jpg_rotate.jpg
  resize   cat.jpg → processed_cat.jpg_resize.jpg
  convert  cat.jpg → cat.png

A machine-readable report.json is written next to the outputs.

Run 'imgpool gen-config' to generate a documented imgpool.toml.")]
#[command(version = env!("IMGPOOL_VERSION"))]
struct Cli {
    /// Directory holding the source images
    #[arg(long, default_value = "train1", global = true)]
    input: PathBuf,

    /// Directory the results are written to
    #[arg(long, default_value = "processed_images", global = true)]
    output: PathBuf,

    /// Config file (default: ./imgpool.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the images in the input directory with their indices
    Scan,
    /// Digital zoom: crop around a focus point and scale to a fixed size
    Zoom(ZoomArgs),
    /// Rotate 90° clockwise
    Rotate(RunArgs),
    /// Nearest-neighbor resize to a fixed size
    Resize(ResizeArgs),
    /// Re-encode as PNG without changing pixels
    Convert(RunArgs),
    /// Print a stock imgpool.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if matches!(cli.command, Command::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let config = config::load_config(resolve_config_path(cli.config.as_deref()).as_deref())?;

    match &cli.command {
        Command::Scan => {
            let images = scan::scan(&cli.input)?;
            output::print_scan_output(&images, &cli.input);
            Ok(ExitCode::SUCCESS)
        }
        Command::Zoom(args) => {
            let mut zoom = config.zoom.clone();
            if let Some(level) = args.level {
                zoom.level = level;
            }
            if let Some(x) = args.center_x {
                zoom.center[0] = x;
            }
            if let Some(y) = args.center_y {
                zoom.center[1] = y;
            }
            if let Some(w) = args.out_width {
                zoom.out_width = w;
            }
            if let Some(h) = args.out_height {
                zoom.out_height = h;
            }
            run_batch(&cli, &config, Operation::Zoom(zoom.params()?), &args.run)
        }
        Command::Rotate(run) => run_batch(&cli, &config, Operation::Rotate90, run),
        Command::Resize(args) => {
            let mut resize = config.resize.clone();
            if let Some(w) = args.width {
                resize.width = w;
            }
            if let Some(h) = args.height {
                resize.height = h;
            }
            run_batch(&cli, &config, Operation::Resize(resize.params()?), &args.run)
        }
        Command::Convert(run) => run_batch(&cli, &config, Operation::FormatConvert, run),
        Command::GenConfig => Ok(ExitCode::SUCCESS),
    }
}

/// Logs go to stderr so they never interleave with result lines on stdout.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// An explicit `--config` must exist; the default file is optional.
fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(config::DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Scan, select, run every task through the pool, print and record results.
fn run_batch(
    cli: &Cli,
    config: &PipelineConfig,
    operation: Operation,
    run: &RunArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let listed = scan::scan(&cli.input)?;
    let images = if run.select.is_empty() {
        listed
    } else {
        let selection = scan::select_by_index(&listed, &run.select);
        for line in output::format_selection_warnings(&selection.out_of_range, listed.len()) {
            warn!("{}", line);
        }
        selection.images
    };

    if images.is_empty() {
        println!("No images to process in {}", cli.input.display());
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::create_dir_all(&cli.output)?;
    let tasks = naming::plan_tasks(&images, operation, &cli.output);
    let workers = run
        .workers
        .unwrap_or_else(|| config::effective_workers(&config.processing));
    info!(
        tasks = tasks.len(),
        workers,
        operation = %operation.kind(),
        "starting batch"
    );

    let (reporter, rx) = Reporter::with_channel();
    let printer = std::thread::spawn(move || {
        for result in rx {
            output::print_result(&result);
        }
    });

    let started = Instant::now();
    let codec = Arc::new(RustCodec::with_quality(config.output.quality()));
    let mut pool = WorkerPool::with_reporter(codec, reporter);
    for task in tasks {
        pool.enqueue(task)?;
    }
    pool.start(workers)?;
    pool.wait_all()?;
    pool.stop();
    let elapsed = started.elapsed();
    let results = pool.reporter().take_results();

    // Dropping the pool drops the reporter, which ends the printer's channel.
    drop(pool);
    printer.join().map_err(|_| "result printer thread panicked")?;

    output::print_summary(&results, elapsed);

    let report = RunReport::new(operation.kind(), workers, elapsed, results);
    let report_path = cli.output.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    info!(path = %report_path.display(), "wrote run report");

    if report.counts.failed + report.counts.cancelled > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use miette::Result;
use tracing_subscriber::EnvFilter;

use halflife_core::{
    HalfLifeConfig, LogSink, Logger, PathSelector, RunMode, SearchMode, TracingSink, Verbosity,
};
use halflife_history::estimate::HalfLifeEstimator;
use halflife_history::git::GitHistory;
use halflife_history::orchestrate::Orchestrator;
use halflife_history::query::RepositoryQuery;
use halflife_history::sink::{CsvSink, ResultSink};

#[derive(Parser)]
#[command(
    name = "halflife",
    version,
    about = "Find the half-life of a codebase in its git history",
    long_about = "Find the half-life of a codebase in its git history.\n\n\
                   Starting from a baseline revision, finds the first later revision at which\n\
                   more than half of the baseline's lines under the target path have been\n\
                   removed or changed.\n\n\
                   Examples:\n  \
                     halflife -s src v1.0 HEAD              One baseline, v1.0\n  \
                     halflife -l src v1.0 HEAD -o out.csv   Every revision as a baseline\n  \
                     halflife --logarithmic src v1.0 HEAD   Chain from half-point to half-point\n  \
                     halflife -s -f --estimate . v1.0 HEAD  Binary search, plus decay estimate"
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["single_commit", "linear", "logarithmic"])
))]
struct Cli {
    /// Search once, from the starting point
    #[arg(short, long)]
    single_commit: bool,

    /// Search from every revision between the starting and end points
    #[arg(short, long)]
    linear: bool,

    /// Chain searches: each half-point found becomes the next baseline
    #[arg(long, visible_alias = "ll")]
    logarithmic: bool,

    /// The files/directories you want to analyze
    target_objects: String,

    /// The treeish you want to start on
    starting_point: String,

    /// The treeish you want to run to
    end_point: String,

    /// Verbosity level
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u8).range(0..=2),
        long_help = "Verbosity level.\n\n\
                       0  half-points found or not found (default)\n\
                       1  parameters, baseline line totals, changed/total ratio per candidate\n\
                       2  window sizes and individual search probes"
    )]
    verbosity: Option<u8>,

    /// Binary-search each candidate window instead of scanning it
    #[arg(
        short,
        long,
        long_help = "Binary-search each candidate window instead of scanning it.\n\n\
                       Needs far fewer diffs on long histories, but is only exact when the\n\
                       changed-line count never drops along the window. Histories that revert\n\
                       earlier churn can yield an earlier half-point than the linear scan."
    )]
    fast: bool,

    /// Append one CSV row per half-point found to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Repository path (default: current directory)
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Path to configuration file (default: .halflife.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print the exponential-decay half-life estimate for the whole range
    #[arg(long)]
    estimate: bool,
}

impl Cli {
    fn run_mode(&self) -> RunMode {
        if self.linear {
            RunMode::Linear
        } else if self.logarithmic {
            RunMode::Logarithmic
        } else {
            RunMode::Single
        }
    }
}

/// Routes log lines around an active spinner so they don't tear it.
struct SpinnerSink {
    bar: ProgressBar,
}

impl LogSink for SpinnerSink {
    fn write(&self, level: Verbosity, message: &str) {
        self.bar.suspend(|| TracingSink.write(level, message));
    }

    fn warn(&self, message: &str) {
        self.bar.suspend(|| TracingSink.warn(message));
    }
}

fn load_config(path: Option<&Path>) -> Result<HalfLifeConfig> {
    let config = match path {
        Some(path) => HalfLifeConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".halflife.toml");
            if default_path.exists() {
                HalfLifeConfig::from_file(default_path)?
            } else {
                HalfLifeConfig::default()
            }
        }
    };
    Ok(config)
}

fn init_tracing(verbosity: Verbosity) {
    let default_level = match verbosity.get() {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(false)
        .without_time()
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(std::io::stdout)
        .init();
}

fn open_sink(path: &Path, logger: &Logger) -> Option<CsvSink<std::fs::File>> {
    match CsvSink::create(path) {
        Ok(sink) => Some(sink),
        Err(e) => {
            logger.warn(format_args!(
                "cannot write results to {}, continuing without a result file: {e}",
                path.display()
            ));
            None
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let verbosity = match cli.verbosity {
        Some(level) => Verbosity::new(level)?,
        None => config.report.verbosity()?,
    };
    init_tracing(verbosity);

    let mode = cli.run_mode();
    let search_mode = if cli.fast {
        SearchMode::Logarithmic
    } else {
        config.search.mode()
    };

    let spinner = (mode != RunMode::Single
        && verbosity == Verbosity::OUTCOME
        && std::io::stderr().is_terminal())
    .then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
            pb.set_style(style);
        }
        pb.set_message("Searching for half-points...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });
    let sink: Arc<dyn LogSink> = match &spinner {
        Some(bar) => Arc::new(SpinnerSink { bar: bar.clone() }),
        None => Arc::new(TracingSink),
    };
    let logger = Logger::new(verbosity, sink);

    let selector = PathSelector::new(&cli.target_objects);
    logger.detail(format_args!("target objects: {selector}"));
    logger.detail(format_args!("starting point: {}", cli.starting_point));
    logger.detail(format_args!("end point: {}", cli.end_point));
    logger.detail(format_args!("verbosity: {verbosity}"));
    logger.detail(format_args!("search: {search_mode}"));

    let repo_path = cli.repo.clone().unwrap_or(config.repository.path);
    let history = GitHistory::open(&repo_path)?;
    let start = history.resolve(&cli.starting_point)?;
    let end = history.resolve(&cli.end_point)?;

    let output = cli.output.clone().or(config.report.output);
    let mut csv = output.as_deref().and_then(|path| open_sink(path, &logger));

    let orchestrator = Orchestrator::new(&history, selector.clone(), search_mode, logger.clone());
    let outcome = orchestrator.run(
        mode,
        &start,
        &end,
        csv.as_mut().map(|s| s as &mut dyn ResultSink),
    );
    drop(csv);
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let results = outcome?;

    let found = results.iter().filter(|r| r.half_point.is_some()).count();
    logger.detail(format_args!(
        "{found} of {} baselines reached their half point",
        results.len()
    ));

    if cli.estimate {
        let estimator = HalfLifeEstimator::new(&history, selector.clone(), logger.clone());
        match estimator.estimate_range(&start, &end)? {
            Some(estimate) => println!(
                "estimated half-life: {:.2} commits ({} of {} lines changed over {} commits)",
                estimate.half_life,
                estimate.changed_lines,
                estimate.total_lines,
                estimate.commits_elapsed
            ),
            None => println!("no lines under {selector} at {start}; cannot estimate half-life"),
        }
    }

    Ok(())
}

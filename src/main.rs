use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use mappingstats::config::Config;
use mappingstats::report::{self, Reporter, TreemapReporter};
use mappingstats::stats::{self, Statistic, TreeSerializer};
use mappingstats::{ArtifactFlags, Mappings};

/// mappingstats - Measure how much of an obfuscated JAR a mapping makes readable
#[derive(Parser, Debug)]
#[command(name = "mappingstats")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the obfuscated JAR
    artifact: PathBuf,

    /// Path to the Tiny (v1 or v2) mapping file
    mappings: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root package bounding the hierarchy (e.g. "net/minecraft")
    #[arg(long, value_name = "PACKAGE")]
    root_package: Option<String>,

    /// Summary output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for the json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the treemap HTML report
    #[arg(long)]
    treemap: bool,

    /// Treemap output file (default: treemap.html)
    #[arg(long, value_name = "FILE")]
    treemap_output: Option<PathBuf>,

    /// Count shown by the treemap
    #[arg(long, value_enum)]
    statistic: Option<StatisticArg>,

    /// Do not print the coverage summary
    #[arg(long)]
    no_summary: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for report::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => report::ReportFormat::Terminal,
            OutputFormat::Json => report::ReportFormat::Json,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StatisticArg {
    Unmapped,
    Mapped,
}

impl From<StatisticArg> for Statistic {
    fn from(statistic: StatisticArg) -> Self {
        match statistic {
            StatisticArg::Unmapped => Statistic::Unmapped,
            StatisticArg::Mapped => Statistic::Mapped,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("mappingstats v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        let cwd = std::env::current_dir()
            .into_diagnostic()
            .wrap_err("Failed to determine the current directory")?;
        Config::from_default_locations(&cwd)?
    };

    // Override with CLI arguments
    if let Some(root_package) = &cli.root_package {
        config.root_package = root_package.clone();
    }
    if let Some(statistic) = cli.statistic {
        config.report.statistic = statistic.into();
    }
    if let Some(output) = &cli.treemap_output {
        config.report.output = output.clone();
    }

    Ok(config)
}

fn run(config: &Config, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Index the artifact
    let spinner = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .into_diagnostic()?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Indexing {}", cli.artifact.display()));

    let flags = ArtifactFlags::from_jar(&cli.artifact)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to index artifact: {}", cli.artifact.display()));
    spinner.finish_and_clear();
    let flags = flags?;

    // Step 2: Read the mappings
    info!("Reading mappings from {}", cli.mappings.display());
    let mappings = Mappings::from_file(&cli.mappings, &config.namespaces)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read mappings: {}", cli.mappings.display()))?;
    info!("Loaded {}", mappings);

    if mappings.is_empty() {
        warn!("Mapping file contains no entries");
    }

    // Step 3: Classify and aggregate
    let rules = config.classifier_rules();
    let coverage = stats::analyze(&mappings, &flags, &rules);

    // Step 4: Report
    if !cli.no_summary {
        let reporter = Reporter::new(cli.format.clone().into(), cli.output.clone());
        reporter.report(&coverage.summary)?;
    }

    if cli.treemap {
        let statistic = config.report.statistic;
        let tree = TreeSerializer::new(
            &coverage.counts,
            &rules.root_path,
            &rules.class_marker,
            statistic,
        )
        .serialize();

        TreemapReporter::new(config.report.output.clone())
            .with_template(config.report.template.clone())
            .report(statistic.label(), &tree)?;

        if !cli.quiet {
            eprintln!(
                "{}",
                format!("Treemap written to: {}", config.report.output.display()).green()
            );
        }
    }

    info!(
        "Finished in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

//! paired-diff - Paired Difference Analysis CLI
//!
//! Command-line interface for comparing measurements of the same individuals
//! in two states.

use clap::{Parser, Subcommand, ValueEnum};
use paired_diff::data::{PairedResultSet, StatePair};
use paired_diff::error::{PairedError, Result};
use paired_diff::pipeline::{run, CategorySource, PairedConfig, RunOutput};
use paired_diff::plot::PlotFormat;
use paired_diff::rank::SortKey;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CLI-friendly sort key enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSortKey {
    /// Largest absolute t statistic first
    TStatistic,
    /// Largest absolute median difference first
    Median,
}

impl From<CliSortKey> for SortKey {
    fn from(key: CliSortKey) -> Self {
        match key {
            CliSortKey::TStatistic => SortKey::TStatistic,
            CliSortKey::Median => SortKey::Median,
        }
    }
}

/// CLI-friendly figure format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPlotFormat {
    /// Scalable vector graphics
    Svg,
    /// Raster image
    Png,
}

impl From<CliPlotFormat> for PlotFormat {
    fn from(format: CliPlotFormat) -> Self {
        match format {
            CliPlotFormat::Svg => PlotFormat::Svg,
            CliPlotFormat::Png => PlotFormat::Png,
        }
    }
}

/// Paired Difference Analysis
#[derive(Parser)]
#[command(name = "paired-diff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two states of the same individuals
    Run {
        /// Path to mapping file TSV
        #[arg(short, long)]
        mapping: PathBuf,

        /// Directory for the report and figure
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Mapping column holding each sample's state
        #[arg(long)]
        state_category: String,

        /// The two states to compare, in order (e.g., "Pre,Post")
        #[arg(long)]
        state_values: String,

        /// Mapping column holding each sample's individual identifier
        #[arg(long)]
        individual_id_category: String,

        /// Numeric mapping columns to analyze (comma-separated)
        #[arg(long, value_delimiter = ',')]
        metadata_categories: Option<Vec<String>>,

        /// Feature table TSV whose observations are analyzed
        #[arg(short = 'b', long)]
        feature_table: Option<PathBuf>,

        /// Observations to analyze (comma-separated; default all)
        #[arg(long, value_delimiter = ',')]
        observation_ids: Option<Vec<String>>,

        /// Sample filter (e.g., "TreatmentResponse:Improved")
        #[arg(short = 's', long)]
        valid_states: Option<String>,

        /// Scale each panel's y axis independently
        #[arg(long)]
        suppress_share_y_axis: bool,

        /// Statistic used to order the report
        #[arg(long, value_enum, default_value = "t-statistic")]
        sort_key: CliSortKey,

        /// Figure format
        #[arg(long, value_enum, default_value = "svg")]
        plot_format: CliPlotFormat,
    },

    /// Run an analysis from a YAML configuration file
    Config {
        /// Path to configuration YAML
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate an example configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print a previously written report
    Report {
        /// Path to paired_difference_comparisons.txt
        #[arg(short, long)]
        report: PathBuf,

        /// Output format: text, json, or yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            mapping,
            output_dir,
            state_category,
            state_values,
            individual_id_category,
            metadata_categories,
            feature_table,
            observation_ids,
            valid_states,
            suppress_share_y_axis,
            sort_key,
            plot_format,
        } => build_config(
            mapping,
            output_dir,
            &state_category,
            &state_values,
            &individual_id_category,
            metadata_categories,
            feature_table,
            observation_ids,
        )
        .and_then(|config| {
            let mut config = config.sort_key(sort_key.into()).plot_format(plot_format.into());
            if let Some(filter) = valid_states {
                config = config.valid_states(&filter);
            }
            if suppress_share_y_axis {
                config = config.suppress_share_y_axis();
            }
            cmd_run(&config)
        }),

        Commands::Config { config } => cmd_config(&config),

        Commands::Example { output } => cmd_example(&output),

        Commands::Report { report, format } => cmd_report(&report, &format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Assemble a configuration from command-line flags
#[allow(clippy::too_many_arguments)]
fn build_config(
    mapping: PathBuf,
    output_dir: PathBuf,
    state_category: &str,
    state_values: &str,
    individual_id_category: &str,
    metadata_categories: Option<Vec<String>>,
    feature_table: Option<PathBuf>,
    observation_ids: Option<Vec<String>>,
) -> Result<PairedConfig> {
    let categories =
        CategorySource::from_options(metadata_categories, feature_table, observation_ids)?;
    let states = StatePair::parse(state_values)?;

    Ok(PairedConfig::new(
        mapping,
        categories,
        state_category,
        &[states.first(), states.second()],
        individual_id_category,
        output_dir,
    ))
}

/// Run an analysis and print its summary
fn cmd_run(config: &PairedConfig) -> Result<()> {
    let RunOutput {
        analysis,
        report_path,
        figure_path,
    } = run(config)?;

    eprintln!("Done! {} categories compared", analysis.results.len());
    eprintln!("  Report: {}", report_path.display());
    eprintln!("  Figure: {}", figure_path.display());
    eprintln!();
    eprint!("{}", analysis.results.summary());

    Ok(())
}

/// Run an analysis from configuration
fn cmd_config(config_path: &Path) -> Result<()> {
    eprintln!("Loading configuration from {:?}...", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PairedConfig::from_yaml(&config_str)?;
    cmd_run(&config)
}

/// Generate example configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let config = PairedConfig::new(
        "map.txt",
        CategorySource::MappingColumns {
            categories: vec![
                "Streptococcus Abundance".to_string(),
                "Phylogenetic Diversity".to_string(),
            ],
        },
        "TreatmentState",
        &["Pre", "Post"],
        "PersonalID",
        "paired_difference_output",
    )
    .valid_states("TreatmentResponse:Improved");
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{:.4}", v))
}

/// Print a report in the requested format
fn cmd_report(report_path: &Path, format: &str) -> Result<()> {
    let results = PairedResultSet::from_tsv(report_path)?;

    match format {
        "json" => {
            let report = serde_json::json!({
                "results": results,
                "summary": results.summary(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "yaml" => {
            let report = serde_json::json!({
                "results": results,
                "summary": results.summary(),
            });
            println!("{}", serde_yaml::to_string(&report)?);
        }
        "text" => {
            println!(
                "{:<30} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10}  status",
                "category", "n", "mean", "median", "t", "p", "corr_p"
            );
            for r in results.iter() {
                println!(
                    "{:<30} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10}  {}",
                    r.category,
                    r.n,
                    format_value(r.mean),
                    format_value(r.median),
                    format_value(r.statistic),
                    format_value(r.p_value),
                    format_value(r.corrected_p_value),
                    r.status.name()
                );
            }
            println!();
            print!("{}", results.summary());
        }
        other => {
            return Err(PairedError::InvalidParameter(format!(
                "Unknown report format '{}': expected text, json, or yaml",
                other
            )));
        }
    }

    Ok(())
}

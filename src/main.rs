use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, EnvFilter};

use ev_market_analyzer::{
    analysis::Analyzer,
    config::{AnalysisConfig, ChartFormat},
    io,
    models::EvDataset,
    visualization::{
        print_category_table, print_dataset_summary, print_forecast_table, print_grouped_table,
        print_range_ranking, print_range_summary, print_yearly_counts, ChartRenderer,
    },
};

#[derive(Parser)]
#[command(
    name = "ev-analyzer",
    about = "EV Market Analyzer - Electric vehicle registration analysis and market forecast",
    version,
    author
)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: tables, charts and market forecast
    Report {
        /// Path to the registration CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the charts are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Chart image format
        #[arg(short, long, value_enum)]
        format: Option<ChartFormat>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print tables only, skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },

    /// Fit the growth curve and project registrations forward
    Forecast {
        /// Path to the registration CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Last model year used for fitting
        #[arg(long)]
        cutoff: Option<i32>,

        /// Number of years to project
        #[arg(long)]
        horizon: Option<u32>,

        /// Print the forecast as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Display a quick summary of the dataset
    Summary {
        /// Path to the registration CSV
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded; keep the existing one
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_dataset(path: &Path) -> Result<EvDataset> {
    let reader = io::reader_for(path)?;
    let dataset = reader.read(path)?;
    if dataset.is_empty() {
        anyhow::bail!(
            "No complete rows in {} ({} rows read, all dropped)",
            path.display(),
            dataset.rows_read
        );
    }
    Ok(dataset)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Report {
            input,
            output_dir,
            format,
            config,
            no_charts,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = output_dir {
                config.charts.output_dir = dir;
            }
            if let Some(format) = format {
                config.charts.format = format;
            }
            config.validate()?;

            println!(
                "\n{}",
                format!("EV Market Analysis: {}", input.display())
                    .bold()
                    .cyan()
            );
            let dataset = load_dataset(&input)?;
            println!(
                "  Loaded {} vehicles ({} incomplete rows dropped)",
                dataset.len(),
                dataset.rows_dropped
            );

            let analyzer = Analyzer::new(&dataset, &config);
            let report = analyzer.report();

            print_dataset_summary(&report);
            print_yearly_counts(&report.adoption_by_year);
            print_category_table("Top Counties", "County", &report.top_counties);
            print_grouped_table(
                "Top Cities in Top Counties",
                "County",
                "City",
                &report.top_cities,
            );
            print_category_table("Vehicle Types", "EV Type", &report.vehicle_types);
            print_category_table("Top Makes", "Make", &report.top_makes);
            print_grouped_table(
                "Top Models in Top Makes",
                "Make",
                "Model",
                &report.top_models,
            );
            print_range_summary(&report.range_distribution, &report.range_by_year);
            print_range_ranking(&report.top_models_by_range);

            let renderer = (!no_charts).then(|| ChartRenderer::from_config(&config.charts));
            let mut written = match &renderer {
                Some(r) => r.render_descriptive(&report)?,
                None => Vec::new(),
            };

            let forecast = analyzer.forecast()?;
            print_forecast_table(&forecast);
            println!();

            if let Some(renderer) = renderer {
                written.push(renderer.forecast(&forecast)?);
                println!(
                    "{} Wrote {} charts to {}",
                    "Success:".green().bold(),
                    written.len(),
                    renderer.output_dir().display()
                );
            }
        }

        Commands::Forecast {
            input,
            cutoff,
            horizon,
            json,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if cutoff.is_some() {
                config.forecast.cutoff_year = cutoff;
            }
            if let Some(h) = horizon {
                config.forecast.horizon = h;
            }
            config.validate()?;

            let dataset = load_dataset(&input)?;
            let forecast = Analyzer::new(&dataset, &config).forecast()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&forecast)?);
            } else {
                println!(
                    "\n{}",
                    format!("Market Forecast: {} years", config.forecast.horizon)
                        .bold()
                        .cyan()
                );
                print_forecast_table(&forecast);
                println!();
            }
        }

        Commands::Summary { input } => {
            let dataset = load_dataset(&input)?;

            println!("\n{}", "Quick Summary".bold().cyan());
            println!("{}", "=".repeat(40));
            println!("  Name:           {}", dataset.name);
            println!("  Rows Read:      {}", dataset.rows_read);
            println!("  Rows Kept:      {}", dataset.len());
            println!("  Rows Dropped:   {}", dataset.rows_dropped);
            if let Some((first, last)) = dataset.year_span() {
                println!("  Model Years:    {first}-{last}");
            }
            println!("  Makes:          {}", dataset.makes().len());
            println!(
                "  Mean Range:     {:.1} miles",
                dataset.mean_electric_range()
            );
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use cli::{load_config, run_consolidate, run_green, run_labels};
use color_eyre::eyre::Result;
use jointcount::{CategoryRegistry, LabelStatsPipeline, GreenScreenPipeline, StatsConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Joint-count statistics for every category and label
    Labels {
        /// Folder of .npy class rasters
        #[arg(short, long)]
        rasters: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        out: PathBuf,
        /// Results of an earlier run; its images are not processed again
        #[arg(short, long)]
        previous: Option<PathBuf>,
    },
    /// Green-screen joint count and coverage for vegetation classes
    Green {
        /// Folder of color images
        #[arg(short, long)]
        images: PathBuf,
        /// Folder of .npy class rasters
        #[arg(short, long)]
        rasters: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Merge the result tables of several runs
    Consolidate {
        /// Folder of CSV tables
        #[arg(short, long)]
        folder: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print the column headers of both pipelines
    Header,
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Labels { rasters, out, previous } => {
            run_labels(config, rasters, out, previous.as_deref())?;
        }
        Commands::Green { images, rasters, out } => {
            run_green(config, images, rasters, out)?;
        }
        Commands::Consolidate { folder, out } => {
            run_consolidate(&config, folder, out)?;
        }
        Commands::Header => {
            let registry = CategoryRegistry::ade20k()?;
            println!("labels: filename,{}", LabelStatsPipeline::header(&registry).join(","));
            println!("green: {},filename", GreenScreenPipeline::header().join(","));
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&StatsConfig::schema())?);
        }
    }

    info!("Done");
    Ok(())
}

//! Homedash CLI - configuration backend for a Homepage-style dashboard.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use homedash::config::{self, AppConfig, Paths};
use homedash::server;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "homedash")]
#[command(version = "0.1.0")]
#[command(about = "Dashboard configuration backend - YAML CRUD, icon resolution, blob storage")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3211")]
        port: u16,

        /// Path to the user configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root all data paths under this directory (development layout)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Load the configuration and report what the server would use
    Check {
        /// Path to the user configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { port, config, data_dir } => {
            let config_path = config.unwrap_or_else(config::default_config_path);
            let app_config = AppConfig::load(&config_path);
            let paths = match data_dir {
                Some(dir) => Paths::under(&dir),
                None => Paths::default(),
            };
            server::start_server(port, app_config, paths).await
        }
        Commands::Check { config } => {
            let config_path = config.unwrap_or_else(config::default_config_path);
            let app_config = AppConfig::load(&config_path);
            println!("storage strategy: {:?}", app_config.icon_storage.strategy);
            println!(
                "object store configured: {}",
                if app_config.minio.is_some() { "yes" } else { "no" }
            );
            match &app_config.docker_api_endpoint {
                Some(endpoint) => println!("docker api endpoint: {endpoint}"),
                None => println!("docker api endpoint: (not configured)"),
            }
            Ok(())
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use placeholder_svg::{
    config::Config,
    services::PlaceholderService,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "placeholder-svg")]
#[command(version)]
#[command(about = "Generates SVG placeholders with a centered logo at any size")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve placeholders over HTTP (default)
    Serve {
        /// Listening IP address
        #[arg(short = 'H', long, value_name = "IP")]
        host: Option<String>,

        /// Listening port
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Render a single placeholder
    Render {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// Output file, stdout when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("placeholder_svg={},tower_http=trace", cli.log_level)
    } else {
        format!("placeholder_svg={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load_from_file(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            info!("Starting placeholder-svg v{}", env!("CARGO_PKG_VERSION"));
            if let Some(host) = host {
                config.web.host = host;
            }
            if let Some(port) = port {
                config.web.port = port;
            }

            let state = match PlaceholderService::from_config(&config.placeholder) {
                Ok(service) => AppState::ready(service),
                Err(e) => {
                    error!("Placeholder renderer failed to initialize: {}", e);
                    AppState::unavailable(e.to_string())
                }
            };

            WebServer::new(&config.web, state)?.serve().await
        }
        Command::Render {
            width,
            height,
            output,
        } => {
            let service = PlaceholderService::from_config(&config.placeholder)
                .context("failed to initialize placeholder renderer")?;
            let svg = service.render(width, height)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, svg.as_bytes())
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Wrote {}x{} placeholder to {}", width, height, path.display());
                }
                None => println!("{svg}"),
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

//! Vista CLI - describe images with a vision model, on the web or in a terminal.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use vista::render::Theme;
use vista_app::config::{self, ConfigError};
use vista_app::error::Result;
use vista_app::server;
use vista_app::terminal::{self, DescribeRequest, TerminalSurface};

/// Vista - streamed image descriptions from a vision model
#[derive(Parser)]
#[command(name = "vista")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "VISTA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web page
    Serve(ServeArgs),

    /// Describe one image in the terminal
    Describe(DescribeArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Args)]
struct ServeArgs {
    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

/// Arguments for the describe command
#[derive(Args)]
struct DescribeArgs {
    /// JPEG or PNG file
    image: PathBuf,

    /// Extra context or question about the image
    #[arg(short, long)]
    question: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Result theme (light or dark; overrides config)
    #[arg(short, long)]
    theme: Option<Theme>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vista_app={level},vista={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let path = config::resolve_path(cli.config);
    match cli.command {
        Commands::Serve(args) => cmd_serve(args, &path).await,
        Commands::Describe(args) => cmd_describe(args, &path).await,
        Commands::Config(args) => cmd_config(args, &path).await,
    }
}

/// Start the web server.
async fn cmd_serve(args: ServeArgs, path: &Path) -> Result<ExitCode> {
    let mut config = config::load_config_from(path).await?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    println!("Vista running at http://{}", config.server.bind_addr());
    println!("Press Ctrl+C to stop.\n");

    server::serve(&config).await?;
    Ok(ExitCode::SUCCESS)
}

/// Describe one image.
async fn cmd_describe(args: DescribeArgs, path: &Path) -> Result<ExitCode> {
    let mut config = config::load_config_from(path).await?;
    if let Some(model) = args.model {
        config.provider.model = model;
    }

    let analyzer = server::analyzer_from_config(&config)?;
    let request = DescribeRequest {
        image: args.image,
        question: args.question,
        api_key: args.api_key,
        theme: args.theme.unwrap_or(config.ui.theme),
    };

    let mut surface = TerminalSurface::stdio();
    let outcome = terminal::describe(&analyzer, request, &mut surface).await?;

    Ok(if outcome.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, path: &Path) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = config::load_config_from(path).await?;
            let content = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
            println!("# {}", path.display());
            println!("{content}");
        }
        ConfigCommands::Init { force } => match config::init_config(path, force).await {
            Ok(_) => {
                println!("Configuration created: {}", path.display());
                println!();
                println!("Next steps:");
                println!("  1. export OPENAI_API_KEY=<key>");
                println!("  2. vista serve");
            }
            Err(ConfigError::AlreadyExists(existing)) => {
                println!("Configuration already exists at: {}", existing.display());
                println!("Use --force to overwrite.");
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(ExitCode::SUCCESS)
}

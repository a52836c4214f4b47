//! Command line front end for CRO website analysis reports.
//!
//! This crate provides the `croview` binary on top of the `croview` library. It supports:
//! - Signing in and out of the analysis service
//! - Requesting analyses and listing, inspecting, and downloading the reports
//! - Running the offline simulation of report generation
//!
//! # Usage
//!
//! ```bash
//! # Write a default configuration
//! croview init
//!
//! # Sign in
//! croview login --email ada@example.com
//!
//! # Request an analysis and list reports
//! croview analyze https://example.com
//! croview list
//!
//! # Save a finished report
//! croview download 42 --dir ./reports
//!
//! # Watch simulated reports generate locally
//! croview simulate https://example.com https://example.org
//! ```
//!
//! Output is colored, and the `-v` flag raises the logging verbosity for debugging.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use croview::{
  api::ApiClient,
  error::CroError,
  report::{RemoteReport, Report, ReportStatus, SimulatedReport, StatusColor},
  session::{AuthProvider, SessionStore},
  storage::{FileStore, SharedStore},
  Config,
};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Request and track CRO website analysis reports")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default platform-specific
  /// config directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

/// Everything a command needs, resolved once from the command line.
pub struct Context {
  /// Where the configuration was read from
  pub config_path: PathBuf,
  /// The loaded configuration
  pub config:      Config,
  /// Durable storage for the session and the simulated cache
  pub storage:     SharedStore,
  /// Terminal front end
  pub terminal:    Terminal,
}

impl Context {
  /// Loads the configuration named on the command line, or the default one.
  fn from_cli(cli: &Cli) -> Result<Self> {
    let config_path = match &cli.config {
      Some(path) => path.clone(),
      None => Config::default_path()?,
    };
    let config = Config::load_or_default(&config_path)?;
    trace!("Using storage at {}", config.storage_path.display());
    let storage = FileStore::shared(&config.storage_path);
    Ok(Self { config_path, config, storage, terminal: Terminal::new(cli.accept_defaults) })
  }

  /// Client for the configured service endpoints.
  pub fn api(&self) -> Result<ApiClient> { Ok(ApiClient::from_config(&self.config)?) }

  /// The session persisted in storage, if any.
  pub fn session(&self) -> SessionStore { SessionStore::restore(self.storage.clone()) }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .with_writer(std::io::stderr)
    .init();
}

/// Runs the parsed command.
async fn run(cli: Cli) -> Result<()> {
  let context = Context::from_cli(&cli)?;
  debug!("Loaded configuration from {}", context.config_path.display());

  match cli.command {
    Commands::Init(args) => init(&context, args),
    Commands::Login(args) => login(&context, args).await,
    Commands::Register(args) => register(&context, args).await,
    Commands::Logout => logout(&context),
    Commands::Whoami => whoami(&context),
    Commands::Oauth => oauth(&context),
    Commands::Analyze { url } => analyze(&context, &url).await,
    Commands::Simulate { urls } => simulate(&context, &urls).await,
    Commands::List { local } => list(&context, local).await,
    Commands::Get { id } => get(&context, &id).await,
    Commands::Download { id, dir } => download(&context, &id, dir).await,
  }
}

/// Entry point for the croview CLI application
///
/// Parses the command line, sets up logging, and executes the requested command. Failures are
/// printed as a single styled line and the process exits non-zero.
#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  if let Err(e) = run(cli).await {
    eprintln!("{} {}", style(ERROR_PREFIX).red().bold(), style(&e).red());
    std::process::exit(1);
  }
}

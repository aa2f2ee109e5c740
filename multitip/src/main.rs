//! # multitip
//!
//! Command-line front end for the tip rack allocator.
//!
//! # Usage
//!
//! ```bash
//! # Reserve a block of 4 tips and print where to pick it up
//! multitip --config multitip.toml allocate 4
//!
//! # Show which tips are left
//! multitip --config multitip.toml snapshot
//!
//! # Drive the simulated pipette through pick-ups of 1, 4 and 8 tips
//! multitip demo --tips 1,4,8 -v
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use multitip::Session;
use multitip::drivers::builtin_registry;
use multitip_common::config::{ConfigLoader, MultitipConfig};
use multitip_common::consts::DEFAULT_CONFIG_PATH;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// multitip - use an 8-channel pipette with 1 to 8 tips
#[derive(Parser, Debug)]
#[command(name = "multitip")]
#[command(version)]
#[command(about = "Use an 8-channel pipette with any number of tips from 1 to 8")]
#[command(long_about = None)]
struct Args {
    /// Path to multitip.toml. Falls back to /etc/multitip/multitip.toml, then
    /// to built-in defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reserve a block of tips and print where the head must pick it up
    Allocate {
        /// Number of tips (1-8)
        num_tips: usize,

        /// Rack state file (overrides pipette.state_file)
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Print the state of every tip in the rack
    Snapshot {
        /// Rack state file (overrides pipette.state_file)
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Run pick-ups on the simulated pipette and print what it did
    Demo {
        /// Tip counts to pick up, in order
        #[arg(long, value_delimiter = ',', default_value = "1,4,8")]
        tips: Vec<usize>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    if let Err(e) = run() {
        error!("multitip failed: {}", e);
        eprintln!("multitip: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing before the config so config errors are logged
    let log_filter = setup_tracing(&args);

    let config_path = args.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        default.exists().then_some(default)
    });
    let (config, config_dir) = match &config_path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            let config = MultitipConfig::load(path)?;
            let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            (config, dir)
        }
        None => (MultitipConfig::default(), PathBuf::from(".")),
    };
    config.validate()?;

    if !args.verbose {
        let level: Level = config.shared.log_level.into();
        log_filter.reload(EnvFilter::from_default_env().add_directive(level.into()))?;
    }
    info!(
        "multitip v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    match args.command {
        Command::Allocate { num_tips, state } => {
            let session = Session::new(config, &config_dir, state);
            let location = session.allocate(&builtin_registry(), num_tips)?;
            println!("{location}");
        }
        Command::Snapshot { state, format } => {
            let session = Session::new(config, &config_dir, state);
            let snapshot = session.snapshot()?;
            match format {
                Format::Text => print!("{snapshot}"),
                Format::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            }
        }
        Command::Demo { tips } => {
            let session = Session::new(config, &config_dir, None);
            let report = session.demo(&tips)?;
            for action in &report.actions {
                println!("{}", serde_json::to_string(action)?);
            }
            print!("{}", report.rack);
        }
    }

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
///
/// Returns a handle to replace the filter once `[shared].log_level` is known.
fn setup_tracing(args: &Args) -> reload::Handle<EnvFilter, Registry> {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let (filter, handle) = reload::Layer::new(filter);

    let output = if args.json {
        fmt::layer().with_writer(std::io::stderr).json().boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .init();
    handle
}

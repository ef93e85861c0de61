// # shiptrack - Package Tracker
//
// Thin command-line layer over shiptrack-core:
// 1. Parse arguments
// 2. Load the TOML configuration
// 3. Initialize logging and the runtime
// 4. Identify the number and either print the guess or track it
//
// All identification, validation and carrier logic lives in shiptrack-core.
//
// ## Usage
//
// ```bash
// shiptrack 1Z648616E192760718
// shiptrack --guess 9205 5969 0012 8506 2118 21
// shiptrack --service fedex --testing 797806677146
// shiptrack --link JJD0123456
// ```
//
// ## Configuration
//
// - `--config PATH` or `SHIPTRACK_CONFIG`: configuration file
//   (default `~/.config/shiptrack.toml`)
// - `SHIPTRACK_LOG_LEVEL`: trace, debug, info, warn, error (default warn)

use anyhow::{Context, Result};
use clap::Parser;
use shiptrack_core::{Error, Package, PackageTracker, TrackerConfig};
use shiptrack_http::HttpTransport;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiptrackExitCode {
    /// Tracking information printed, or a valid guess
    Success = 0,
    /// Configuration could not be loaded or is invalid
    ConfigError = 1,
    /// The carrier or the network failed
    TrackingError = 2,
    /// No carrier recognizes the number, or it fails validation
    InvalidNumber = 3,
}

impl From<ShiptrackExitCode> for ExitCode {
    fn from(code: ShiptrackExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&Error> for ShiptrackExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::UnsupportedShipper(_) | Error::InvalidTrackingNumber(_) => Self::InvalidNumber,
            Error::Config(_) => Self::ConfigError,
            _ => Self::TrackingError,
        }
    }
}

/// Track a parcel with UPS, FedEx, USPS or DHL
#[derive(Debug, Parser)]
#[command(name = "shiptrack", version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "SHIPTRACK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Carrier to use instead of identifying the number (ups, fedex, usps, dhl)
    #[arg(short, long, value_name = "NAME")]
    service: Option<String>,

    /// Identify and validate the number without contacting the carrier
    #[arg(short, long)]
    guess: bool,

    /// Print an HTML link to the carrier's tracking page
    #[arg(short, long, conflicts_with = "guess")]
    link: bool,

    /// Use carrier test endpoints and accept published sandbox numbers
    #[arg(short, long)]
    testing: bool,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,

    /// Tracking number; spaces between parts are allowed
    #[arg(value_name = "TRACKNUM", required = true, num_args = 1..)]
    tracking_number: Vec<String>,
}

impl Cli {
    fn tracking_number(&self) -> String {
        self.tracking_number.concat()
    }

    fn log_level(&self) -> Level {
        if self.debug {
            return Level::DEBUG;
        }

        let level = std::env::var("SHIPTRACK_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        match level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".config").join("shiptrack.toml"))
}

/// Load the configuration file
///
/// An explicit path must exist. The default path is optional: without it only
/// `--guess` and carriers that need no credentials are usable.
fn load_config(cli: &Cli) -> Result<TrackerConfig> {
    let mut config = match (&cli.config, default_config_path()) {
        (Some(path), _) => TrackerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(path)) if path.exists() => TrackerConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, path) => {
            warn!(
                "No configuration file found{}; carriers have no credentials",
                path.map(|p| format!(" at {}", p.display())).unwrap_or_default()
            );
            TrackerConfig::default()
        }
    };

    if cli.testing {
        config.testing = true;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ShiptrackExitCode::ConfigError.into();
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ShiptrackExitCode::ConfigError.into();
        }
    };

    let transport = match HttpTransport::from_config(&config.http) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ShiptrackExitCode::ConfigError.into();
        }
    };
    debug!("Using {:?}", transport);

    let tracker = match PackageTracker::new(config, Arc::new(transport)) {
        Ok(tracker) => tracker,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ShiptrackExitCode::ConfigError.into();
        }
    };

    let number = cli.tracking_number();
    if cli.link {
        println!("{}", tracker.linkify(&number));
        return ShiptrackExitCode::Success.into();
    }

    let package = match &cli.service {
        Some(service) => tracker.package_for(&number, service),
        None => tracker.package(&number),
    };
    let package = match package {
        Ok(package) => package,
        Err(e) => {
            eprintln!("{}", e);
            return ShiptrackExitCode::from(&e).into();
        }
    };

    if cli.guess {
        return guess(&package).into();
    }

    track(&package).into()
}

/// Print the carrier, validity and tracking page of a package
fn guess(package: &Package) -> ShiptrackExitCode {
    let valid = package.validate();

    println!("Tracking number: {}", package.tracking_number());
    println!("Carrier:         {}", package.shipper());
    println!("Valid:           {}", if valid { "yes" } else { "no" });
    println!("URL:             {}", package.url());

    if valid {
        ShiptrackExitCode::Success
    } else {
        ShiptrackExitCode::InvalidNumber
    }
}

/// Query the carrier and print the tracking information
fn track(package: &Package) -> ShiptrackExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ShiptrackExitCode::TrackingError;
        }
    };

    match runtime.block_on(package.track()) {
        Ok(info) => {
            println!("{}", info);
            for event in &info.events {
                println!("  {}", event);
            }
            ShiptrackExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", failure_message(package, &e));
            ShiptrackExitCode::from(&e)
        }
    }
}

fn failure_message(package: &Package, err: &Error) -> String {
    if err.is_transient() {
        format!("{}: {} (temporary, try again later)", package, err)
    } else {
        format!("{}: {}", package, err)
    }
}

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hintswap_e::WebDriverBackend;
use hintswap_engine::backend::Backend;
use hintswap_engine::config::{ConfigLoader, HintswapConfig, SessionConfig};
use hintswap_h::HeadlessBackend;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hintswap",
    version,
    about = "Look up Siege accounts and switch their data center"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (default: ./hintswap.yaml, then ~/.hintswap/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Browser automation used for username lookups
    #[arg(long, value_enum, default_value_t = Driver::Headless, global = true)]
    driver: Driver,

    /// External WebDriver URL (webdriver driver only; chromedriver is spawned otherwise)
    #[arg(long, global = true)]
    driver_url: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Driver {
    /// Chromium over the DevTools protocol
    Headless,
    /// Chrome through a WebDriver server
    Webdriver,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a username to its account identifier
    Resolve {
        username: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Point one account (or all of them) at a region
    Swap {
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        username: Option<String>,
        /// Every account found on disk; no lookup
        #[arg(long)]
        all: bool,
        /// Region label (e.g. "US-West") or raw token (e.g. "playfab/westus")
        #[arg(long)]
        region: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the selectable regions
    Regions,
    /// List discovered settings files
    Files {
        /// Only the file of this account identifier
        #[arg(long)]
        id: Option<String>,
    },
    /// Print the current DataCenterHint of a settings file
    Show { path: PathBuf },
}

fn init_tracing(verbose: bool) {
    // Logs go to stderr; stdout carries command output.
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Fold command-line overrides into the loaded session options.
fn apply_overrides(config: &mut HintswapConfig, args: &Args) {
    if args.visible {
        config.session.headless = false;
    }
    if let Some(url) = &args.driver_url {
        config.session.webdriver_url = Some(url.clone());
    }
}

fn make_backend(driver: Driver, session: SessionConfig) -> Box<dyn Backend> {
    match driver {
        Driver::Headless => Box::new(HeadlessBackend::new(session)),
        Driver::Webdriver => Box::new(WebDriverBackend::new(session)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);

    let driver = args.driver;
    commands::run(args.command, config, |session| make_backend(driver, session)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_needs_a_target() {
        let err = Args::try_parse_from(["hintswap", "swap", "--region", "Japan"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn swap_targets_are_exclusive() {
        let err = Args::try_parse_from([
            "hintswap", "swap", "--username", "alice", "--all", "--region", "Japan",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from([
            "hintswap",
            "resolve",
            "alice",
            "--driver",
            "webdriver",
            "--driver-url",
            "http://localhost:4444",
            "--visible",
        ])
        .unwrap();
        assert_eq!(args.driver, Driver::Webdriver);

        let mut config = HintswapConfig::default();
        apply_overrides(&mut config, &args);
        assert!(!config.session.headless);
        assert_eq!(
            config.session.webdriver_url.as_deref(),
            Some("http://localhost:4444")
        );
    }

    #[test]
    fn headless_is_the_default_driver() {
        let args = Args::try_parse_from(["hintswap", "regions"]).unwrap();
        assert_eq!(args.driver, Driver::Headless);
        assert!(matches!(args.command, Command::Regions));
    }
}

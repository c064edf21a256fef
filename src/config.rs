//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! command-line flags (some also readable from the environment).  Everything
//! is resolved once at startup into an immutable [`Config`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::filter::FilterConfig;
use crate::rotator::DisplayOptions;
use crate::source::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

const DEFAULT_UPDATE_INTERVAL_MS: u64 = 30 * 60 * 1000;
const DEFAULT_UI_UPDATE_INTERVAL_MS: u64 = 10 * 1000;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "krisinfo")]
#[command(
    author,
    version,
    about = "Rotating terminal ticker for Swedish crisis information (Krisinformation.se)"
)]
#[command(after_help = "Examples:
  krisinfo --area \"Stockholms län\" --area \"Uppsala län\"
  krisinfo --exclude test,övning --oldest 3
  krisinfo --once --always-national false --area \"Gotlands län\"")]
pub struct Cli {
    /// TOML config file (default: <config dir>/krisinfo/config.toml if it exists)
    #[arg(short, long, env = "KRISINFO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the news endpoint
    #[arg(long, env = "KRISINFO_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Give up on a request after this many milliseconds without a response
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Counties to show; repeat or separate with commas (default: all)
    #[arg(long = "area", value_name = "COUNTY", value_delimiter = ',')]
    pub areas: Vec<String>,

    /// Hide messages whose preamble contains this text (case-insensitive)
    #[arg(long = "exclude", value_name = "TEXT", value_delimiter = ',')]
    pub exclusions: Vec<String>,

    /// Always show nation-wide messages when filtering by area
    #[arg(long, value_name = "BOOL")]
    pub always_national: Option<bool>,

    /// Milliseconds between feed polls
    #[arg(long, value_name = "MS")]
    pub update_interval_ms: Option<u64>,

    /// Milliseconds between switching to the next message
    #[arg(long, value_name = "MS")]
    pub ui_update_interval_ms: Option<u64>,

    /// Show the message preamble
    #[arg(long, value_name = "BOOL")]
    pub show_description: Option<bool>,

    /// Skip messages older than this many days
    #[arg(long, value_name = "DAYS")]
    pub oldest: Option<u32>,

    /// Show nothing at all when there is nothing recent to show
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub silent: Option<bool>,

    /// Show the rotation position next to each message
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub debug: Option<bool>,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Fetch once, print the filtered messages and exit
    #[arg(long)]
    pub once: bool,
}

/// The optional TOML config file.  Every key may be omitted.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub always_national: Option<bool>,
    pub update_interval_ms: Option<u64>,
    pub ui_update_interval_ms: Option<u64>,
    pub areas: Option<Vec<String>>,
    pub content_exclusions: Option<Vec<String>>,
    pub show_description: Option<bool>,
    pub oldest: Option<u32>,
    pub silent: Option<bool>,
    pub debug: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub timeout: Duration,
    pub update_interval: Duration,
    pub ui_update_interval: Duration,
    pub filter: FilterConfig,
    pub display: DisplayOptions,
    pub log_file: Option<PathBuf>,
    pub once: bool,
}

impl Config {
    /// Read the config file named on the command line (or the default one,
    /// if present) and merge it with the flags.
    pub fn load(cli: Cli) -> Result<Self> {
        let file = match cli.config.clone().or_else(default_config_path) {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge flags over file values over defaults.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self> {
        let timeout_ms = cli
            .timeout_ms
            .or(file.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT.as_millis() as u64);
        let update_interval_ms = cli
            .update_interval_ms
            .or(file.update_interval_ms)
            .unwrap_or(DEFAULT_UPDATE_INTERVAL_MS);
        let ui_update_interval_ms = cli
            .ui_update_interval_ms
            .or(file.ui_update_interval_ms)
            .unwrap_or(DEFAULT_UI_UPDATE_INTERVAL_MS);

        for (name, value) in [
            ("timeout_ms", timeout_ms),
            ("update_interval_ms", update_interval_ms),
            ("ui_update_interval_ms", ui_update_interval_ms),
        ] {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }

        let areas = if cli.areas.is_empty() {
            file.areas.unwrap_or_default()
        } else {
            cli.areas
        };
        let exclusions = if cli.exclusions.is_empty() {
            file.content_exclusions.unwrap_or_default()
        } else {
            cli.exclusions
        };
        let always_national = cli.always_national.or(file.always_national).unwrap_or(true);

        let defaults = DisplayOptions::default();
        let display = DisplayOptions {
            show_description: cli
                .show_description
                .or(file.show_description)
                .unwrap_or(defaults.show_description),
            oldest_days: cli.oldest.or(file.oldest).unwrap_or(defaults.oldest_days),
            silent: cli.silent.or(file.silent).unwrap_or(defaults.silent),
            debug: cli.debug.or(file.debug).unwrap_or(defaults.debug),
        };

        Ok(Self {
            endpoint: cli
                .endpoint
                .or(file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: Duration::from_millis(timeout_ms),
            update_interval: Duration::from_millis(update_interval_ms),
            ui_update_interval: Duration::from_millis(ui_update_interval_ms),
            filter: FilterConfig::new(areas, always_national, exclusions),
            display,
            log_file: cli.log_file,
            once: cli.once,
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("krisinfo").join("config.toml");
    path.is_file().then_some(path)
}

mod commands;
mod input;
mod platform;
mod shutdown;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pvzhe_core::{AddressPath, Config, config::CONFIG_FILE};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use commands::hex_utils::{parse_hex_value, parse_size};

#[derive(Parser)]
#[command(name = "pvzhe")]
#[command(about = "Save guard for Plants vs. Zombies Hybrid Edition")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE, env = "PVZHE_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Track the game and back up saves periodically
    Watch {
        /// Save and back up every interval while a level is being played
        #[arg(short, long)]
        auto_save: bool,
    },

    /// Save now and back up the save directory
    Save {
        /// Save even when no level is being played
        #[arg(short, long)]
        force: bool,
    },

    /// List backups, newest first
    Backups,

    /// Restore a backup over the save directory
    Recover {
        /// Backup name as listed by `backups`
        name: String,
    },

    /// Show process, screen and music state
    Status,

    /// Print the current music id, or switch to another track
    Music {
        id: Option<i32>,
    },

    /// Read memory through a pointer path
    Peek {
        /// Comma separated offsets, e.g. "0x6A9EC0,0x7FC"
        path: AddressPath,

        /// Bytes to read (1, 2, 4 or 8)
        #[arg(short, long, default_value = "4", value_parser = parse_size)]
        size: usize,
    },

    /// Write a hex value through a pointer path
    Poke {
        /// Comma separated offsets, e.g. "0x408D4B"
        path: AddressPath,

        /// Value in hex
        #[arg(value_parser = parse_hex_value)]
        value: u64,

        /// Bytes to write (1, 2, 4 or 8)
        #[arg(short, long, default_value = "4", value_parser = parse_size)]
        size: usize,
    },
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(c) => {
            info!("Loaded config from {:?}", args.config);
            c
        }
        Err(e) if e.is_not_found() => {
            debug!("No config at {:?}, using defaults", args.config);
            Config::default()
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };

    match pvzhe_core::is_elevated() {
        Ok(true) => {}
        Ok(false) => warn!("Not running as administrator; opening the game may fail"),
        Err(e) => debug!("Elevation check unavailable: {}", e),
    }

    match args.command {
        Command::Watch { auto_save } => commands::watch::run(config, auto_save),
        Command::Save { force } => commands::save::run(&config, force),
        Command::Backups => commands::backups::run(&config),
        Command::Recover { name } => commands::recover::run(&config, &name),
        Command::Status => commands::status::run(&config),
        Command::Music { id } => commands::music::run(&config, id),
        Command::Peek { path, size } => commands::peek::run(&config, &path, size),
        Command::Poke { path, value, size } => commands::poke::run(&config, &path, value, size),
    }
}

/// `RUST_LOG` when set and valid, otherwise info for this tool only
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

const DEFAULT_LOG: &str = "pvzhe=info";

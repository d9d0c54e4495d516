//! md RAID discovery/stats CLI for monitoring agents.
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use mdraid_telemetry::{init_logging, LogConfig, MdraidCollector, DEFAULT_SYS_BLOCK};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mdraid-telemetry",
    version,
    about = "Linux md (software RAID) discovery and stats for monitoring agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base directory holding block device attribute trees
    #[arg(long, global = true, default_value = DEFAULT_SYS_BLOCK)]
    sys_path: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List md devices in the monitoring system's discovery format
    Discovery {
        /// Output format (json or pretty)
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
    /// Report merged array and md attributes for one device
    Stats {
        /// Device name to report (e.g. md0)
        #[arg(short, long)]
        name: Option<String>,

        /// Output format (json or pretty)
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("warn").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    let collector = MdraidCollector::new(cli.sys_path);

    match cli.command {
        Commands::Discovery { format } => {
            let discovered = collector.discover()?;
            let output = match format {
                OutputFormat::Json => serde_json::to_string(&discovered)?,
                OutputFormat::Pretty => serde_json::to_string_pretty(&discovered)?,
            };
            println!("{output}");
        }
        Commands::Stats { name, format } => {
            let Some(name) = name else {
                // The agent invoking us treats a missing --name as a benign
                // misconfiguration, so show usage and exit cleanly.
                print_stats_usage()?;
                return Ok(());
            };

            if let Some(stats) = collector.stats(&name)? {
                let output = match format {
                    OutputFormat::Json => stats.to_json()?,
                    OutputFormat::Pretty => stats.to_json_pretty()?,
                };
                println!("{output}");
            }
        }
    }

    Ok(())
}

fn print_stats_usage() -> Result<()> {
    let mut cmd = Cli::command();
    if let Some(sub) = cmd.find_subcommand_mut("stats") {
        sub.print_help()?;
    }
    Ok(())
}

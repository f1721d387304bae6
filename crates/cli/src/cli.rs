use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// statbot: host metrics monitor with threshold alerts
///
/// statbot samples CPU, memory, disk, network and temperature readings on a
/// fixed period, keeps a rolling history of them and raises alerts when a
/// reading crosses its configured threshold. Commands are read from stdin.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// Defaults are used when omitted. Accepted configuration changes are
    /// written back to this file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// File holding history, alerts and audit logs.
    ///
    /// Overrides `state_path` from the configuration file.
    #[arg(short, long)]
    pub statefile: Option<PathBuf>,

    /// Do not read commands from stdin.
    #[arg(long)]
    pub no_console: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.is_file() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

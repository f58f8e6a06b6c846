use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{Config, OutputFormat};
use crate::error::Result;

/// Find files with identical content under one or more directories,
/// regardless of their names.
#[derive(Parser, Debug)]
#[command(name = "finddups", version)]
pub struct Cli {
    /// Directories to search
    #[arg(required = true, value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Ignore files larger than MAX_SIZE bytes
    #[arg(short = 'M', long)]
    pub max_size: Option<u64>,

    /// Ignore files smaller than MIN_SIZE bytes (default: 1)
    #[arg(short = 'm', long)]
    pub min_size: Option<u64>,

    /// Include symlinks in the duplication report
    #[arg(short = 'l', long)]
    pub enable_symlinks: bool,

    /// Limit matches to file names matching this glob pattern
    #[arg(short, long)]
    pub glob: Option<String>,

    /// Report progress and totals on stderr (repeat for debug output)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Number of hash worker threads (default: 3/4 of the CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Read defaults from a TOML config file; flags take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl Cli {
    /// Builds the run configuration: defaults, then the config file, then flags.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(max_size) = self.max_size {
            config.max_size = max_size;
        }
        if let Some(min_size) = self.min_size {
            config.min_size = min_size;
        }
        if self.enable_symlinks {
            config.include_symlinks = true;
        }
        if let Some(glob) = &self.glob {
            config.glob = glob.clone();
        }
        if self.verbose > 0 {
            config.verbose = true;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(config)
    }
}

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorMode, LogLevel, OutputFormat};
use crate::config::{ConfigLayer, StrategyKind};

/// Verifies that two directory trees hold the same files.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Root of the first tree
    pub left: PathBuf,
    /// Root of the second tree
    pub right: PathBuf,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// YAML file with comparison settings, overridden by the flags below
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// How files present on both sides are compared [default: hash]
    #[clap(long, short, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// Allowed modification time difference in metadata mode [default: 2]
    #[clap(long, short, value_name = "SECONDS")]
    pub tolerance: Option<u64>,

    /// Bytes read at a time while hashing [default: 65536]
    #[clap(long, value_name = "BYTES")]
    pub chunk_size: Option<NonZeroUsize>,

    /// Maximum number of entries compared at once per directory [default: 8]
    #[clap(long, short = 'j')]
    pub concurrency: Option<NonZeroUsize>,

    /// Follow symlinks and compare what they point to instead of their link targets
    #[clap(long, short = 'L', overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Compare symlinks by their link targets, even when the config file
    /// enables following
    #[clap(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    #[clap(long, short, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorMode,
}

impl Cli {
    /// Settings given on the command line, the highest configuration layer.
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            strategy: self.strategy,
            tolerance_seconds: self.tolerance,
            chunk_size: self.chunk_size,
            concurrency: self.concurrency,
            follow_symlinks: match (self.follow_symlinks, self.no_follow_symlinks) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        }
    }
}

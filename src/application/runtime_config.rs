use std::path::PathBuf;

use crate::application::data::{ColorMode, OutputFormat};
use crate::cli::Cli;
use crate::config::ConfigLayer;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub left: PathBuf,
    pub right: PathBuf,
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigLayer,
    pub format: OutputFormat,
    pub color: ColorMode,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        let overrides = cli.overrides();
        Self {
            left: cli.left,
            right: cli.right,
            config_path: cli.config,
            overrides,
            format: cli.format,
            color: cli.color,
        }
    }
}

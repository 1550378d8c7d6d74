//! Comparison settings, layered as built-in defaults, then an optional YAML
//! file, then command-line flags.

mod compare_config;

pub use compare_config::{CompareConfig, ConfigError, ConfigLayer, StrategyKind};

use std::{borrow::Cow, io::Cursor, num::NonZeroUsize, path::Path};

use clap::ValueEnum;
use compio::{fs::File, io::AsyncReadExt, io::BufReader};
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::compare::{
    CompareStrategy, ContentHasher, DEFAULT_CHUNK_SIZE, DEFAULT_TOLERANCE_SECONDS,
    MetadataComparator,
};
use crate::ext::PathDisplayExt;
use crate::walker::DEFAULT_CONCURRENCY;

const STRATEGY_KEY: &str = "strategy";
const TOLERANCE_KEY: &str = "tolerance_seconds";
const CHUNK_SIZE_KEY: &str = "chunk_size";
const CONCURRENCY_KEY: &str = "concurrency";
const FOLLOW_SYMLINKS_KEY: &str = "follow_symlinks";

const KNOWN_KEYS: [&str; 5] = [
    STRATEGY_KEY,
    TOLERANCE_KEY,
    CHUNK_SIZE_KEY,
    CONCURRENCY_KEY,
    FOLLOW_SYMLINKS_KEY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StrategyKind {
    #[default]
    Hash,
    Metadata,
}

/// Fully resolved comparison settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareConfig {
    pub strategy: StrategyKind,
    pub tolerance_seconds: u64,
    pub chunk_size: NonZeroUsize,
    pub concurrency: NonZeroUsize,
    pub follow_symlinks: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            tolerance_seconds: DEFAULT_TOLERANCE_SECONDS,
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
            follow_symlinks: false,
        }
    }
}

impl CompareConfig {
    /// Overrides every setting the layer specifies.
    pub fn with_layer(self, layer: &ConfigLayer) -> Self {
        Self {
            strategy: layer.strategy.unwrap_or(self.strategy),
            tolerance_seconds: layer.tolerance_seconds.unwrap_or(self.tolerance_seconds),
            chunk_size: layer.chunk_size.unwrap_or(self.chunk_size),
            concurrency: layer.concurrency.unwrap_or(self.concurrency),
            follow_symlinks: layer.follow_symlinks.unwrap_or(self.follow_symlinks),
        }
    }

    pub fn strategy(&self) -> CompareStrategy {
        match self.strategy {
            StrategyKind::Hash => CompareStrategy::Hash(ContentHasher::new(self.chunk_size)),
            StrategyKind::Metadata => {
                CompareStrategy::Metadata(MetadataComparator::new(self.tolerance_seconds))
            }
        }
    }
}

/// A partial set of settings coming from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub strategy: Option<StrategyKind>,
    pub tolerance_seconds: Option<u64>,
    pub chunk_size: Option<NonZeroUsize>,
    pub concurrency: Option<NonZeroUsize>,
    pub follow_symlinks: Option<bool>,
}

impl ConfigLayer {
    pub async fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file_path = path.absolute_display();
        debug!("Opening config file: {file_path}");
        let file = File::open(path).await.context(ReadSnafu {
            file_path: file_path.clone(),
        })?;

        let cursor = Cursor::new(file);
        let mut reader = BufReader::new(cursor);
        let res = reader.read_to_string(String::new()).await;
        let n = res.0.context(ReadSnafu { file_path })?;
        debug!("Successfully read config file: {n} bytes");

        res.1.as_str().try_into()
    }

    fn parse_mapping(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, ConfigError> {
        for key in top_level.keys() {
            match key {
                Yaml::Value(Scalar::String(name))
                    if KNOWN_KEYS.iter().any(|known| *known == &**name) => {}
                _ => warn!("Ignoring unknown config key: {:?}", key),
            }
        }

        Ok(Self {
            strategy: lookup(top_level, STRATEGY_KEY)
                .map(parse_strategy)
                .transpose()?,
            tolerance_seconds: lookup(top_level, TOLERANCE_KEY)
                .map(|value| parse_unsigned(TOLERANCE_KEY, value))
                .transpose()?,
            chunk_size: lookup(top_level, CHUNK_SIZE_KEY)
                .map(|value| parse_non_zero(CHUNK_SIZE_KEY, value))
                .transpose()?,
            concurrency: lookup(top_level, CONCURRENCY_KEY)
                .map(|value| parse_non_zero(CONCURRENCY_KEY, value))
                .transpose()?,
            follow_symlinks: lookup(top_level, FOLLOW_SYMLINKS_KEY)
                .map(parse_bool)
                .transpose()?,
        })
    }
}

fn lookup<'a, 'input>(
    top_level: &'a LinkedHashMap<Yaml<'input>, Yaml<'input>>,
    key: &'static str,
) -> Option<&'a Yaml<'input>> {
    top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed(key))))
}

fn invalid(key: &'static str, value: &Yaml) -> ConfigError {
    let value = match value {
        Yaml::Value(Scalar::String(text)) => text.to_string(),
        Yaml::Value(Scalar::Integer(number)) => number.to_string(),
        Yaml::Value(Scalar::Boolean(flag)) => flag.to_string(),
        other => format!("{other:?}"),
    };
    ConfigError::InvalidValue { key, value }
}

fn parse_strategy(value: &Yaml) -> Result<StrategyKind, ConfigError> {
    match value {
        Yaml::Value(Scalar::String(name)) => {
            StrategyKind::from_str(&**name, true).map_err(|_| invalid(STRATEGY_KEY, value))
        }
        _ => Err(invalid(STRATEGY_KEY, value)),
    }
}

fn parse_unsigned(key: &'static str, value: &Yaml) -> Result<u64, ConfigError> {
    match value {
        Yaml::Value(Scalar::Integer(number)) => {
            u64::try_from(*number).map_err(|_| invalid(key, value))
        }
        _ => Err(invalid(key, value)),
    }
}

fn parse_non_zero(key: &'static str, value: &Yaml) -> Result<NonZeroUsize, ConfigError> {
    let number = parse_unsigned(key, value)?;
    usize::try_from(number)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| invalid(key, value))
}

fn parse_bool(value: &Yaml) -> Result<bool, ConfigError> {
    match value {
        Yaml::Value(Scalar::Boolean(flag)) => Ok(*flag),
        _ => Err(invalid(FOLLOW_SYMLINKS_KEY, value)),
    }
}

impl TryFrom<&str> for ConfigLayer {
    type Error = ConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            debug!("Config file is empty, keeping defaults");
            return Ok(Self::default());
        };

        let top_level = document.as_mapping().ok_or(ConfigError::TopLevelNotMap)?;
        Self::parse_mapping(top_level)
    }
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Invalid value for '{}': {}", key, value))]
    InvalidValue { key: &'static str, value: String },
}

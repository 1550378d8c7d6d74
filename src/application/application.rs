use std::io::{self, Write};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::application::data::OutputFormat;
use crate::config::{CompareConfig, ConfigError, ConfigLayer};
use crate::ext::PathDisplayExt;
use crate::filesystem::{FileSystem, LocalFileSystem};
use crate::report::Reporter;
use crate::walker::{TraversalResult, TreeWalker, WalkError};

pub struct Application;

impl Application {
    pub async fn run(runtime_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        Self::run_with_output(runtime_config, &mut io::stdout()).await
    }

    /// Compares the two local trees named by `runtime_config` and writes the
    /// report to `output`. Differing trees are an error so the process exits
    /// with a failure status.
    pub async fn run_with_output(
        runtime_config: impl Into<RuntimeConfig>,
        output: &mut impl Write,
    ) -> Result<(), ApplicationError> {
        let runtime_config: RuntimeConfig = runtime_config.into();

        let file_layer = match &runtime_config.config_path {
            Some(path) => ConfigLayer::from_path(path).await.context(ConfigSnafu)?,
            None => ConfigLayer::default(),
        };
        let config = CompareConfig::default()
            .with_layer(&file_layer)
            .with_layer(&runtime_config.overrides);
        debug!("Resolved config: {:?}", config);

        let left = FileSystem::from(LocalFileSystem::new(
            &runtime_config.left,
            config.follow_symlinks,
        ));
        let right = FileSystem::from(LocalFileSystem::new(
            &runtime_config.right,
            config.follow_symlinks,
        ));
        info!(
            "Comparing {} with {}",
            runtime_config.left.absolute_display(),
            runtime_config.right.absolute_display()
        );

        let result = Self::compare(&left, &right, &config)
            .await
            .context(WalkSnafu)?;

        let reporter = Reporter::new(runtime_config.color.apply());
        match runtime_config.format {
            OutputFormat::Text => reporter.write_text(&result, output),
            OutputFormat::Json => reporter.write_json(&result, output),
        }
        .context(ReportSnafu)?;

        ensure!(
            result.identical,
            TreesDifferSnafu {
                count: result.differences.len()
            }
        );
        Ok(())
    }

    /// Compares two trees of any backend with resolved settings.
    ///
    /// Remote trees are compared by wrapping an already open session in a
    /// [`crate::filesystem::RemoteFileSystem`]; the session stays owned by
    /// the caller.
    pub async fn compare(
        left: &FileSystem,
        right: &FileSystem,
        config: &CompareConfig,
    ) -> Result<TraversalResult, WalkError> {
        let strategy = config.strategy();
        TreeWalker::new(left, right, &strategy)
            .with_concurrency(config.concurrency)
            .walk()
            .await
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: ConfigError },
    #[snafu(display("Critical failure encountered while walking the trees"))]
    WalkError { source: WalkError },
    #[snafu(display("Failed to write the report"))]
    ReportError { source: io::Error },
    #[snafu(display("The trees differ: {} difference(s) found", count))]
    TreesDiffer { count: usize },
}

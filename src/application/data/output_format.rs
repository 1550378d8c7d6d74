use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented, human-readable lines followed by a summary
    #[default]
    Text,
    /// The structured comparison result
    Json,
}

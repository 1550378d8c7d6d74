mod color_mode;
mod log_level;
mod output_format;

pub use color_mode::ColorMode;
pub use log_level::LogLevel;
pub use output_format::OutputFormat;

use clap::ValueEnum;
use supports_color::Stream;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Color only when stdout is a terminal that supports it
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Whether the text report should be colored.
    pub fn use_color(self) -> bool {
        match self {
            ColorMode::Auto => supports_color::on(Stream::Stdout).is_some(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    /// Applies the mode to the global `colored` switch, which otherwise
    /// disables styling whenever stdout is not a terminal.
    pub fn apply(self) -> bool {
        let use_color = self.use_color();
        colored::control::set_override(use_color);
        use_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_modes_ignore_the_terminal() {
        assert!(ColorMode::Always.use_color());
        assert!(!ColorMode::Never.use_color());
    }
}

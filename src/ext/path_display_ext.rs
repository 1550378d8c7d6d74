use std::path::{Path, PathBuf};

/// Renders a path for messages, preferring the canonical form and falling
/// back to the lexically absolute one when the path does not exist.
pub trait PathDisplayExt {
    fn absolute_display(&self) -> String;
}

impl PathDisplayExt for Path {
    fn absolute_display(&self) -> String {
        self.canonicalize()
            .or_else(|_| std::path::absolute(self))
            .unwrap_or_else(|_| self.to_path_buf())
            .display()
            .to_string()
    }
}

impl PathDisplayExt for PathBuf {
    fn absolute_display(&self) -> String {
        self.as_path().absolute_display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_path_is_canonicalized() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let canonical = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize");
        let dotted = temp_dir.path().join(".");
        assert_eq!(dotted.absolute_display(), canonical.display().to_string());
    }

    #[test]
    fn missing_path_is_made_absolute() {
        let display = Path::new("does-not-exist/child").absolute_display();
        assert!(Path::new(&display).is_absolute());
        assert!(display.ends_with("child"));
    }
}

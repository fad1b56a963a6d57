//! File-system [`ProgramLoader`].
//!
//! A program image is a `.prg` file read verbatim: two little-endian load
//! address bytes followed by the body.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::send_program::{ProgramLoadError, ProgramLoader};

/// Reads program images from disk.
#[derive(Debug, Clone, Default)]
pub struct FsProgramLoader {
    base_dir: Option<PathBuf>,
}

impl FsProgramLoader {
    /// Relative names resolve against `base_dir`, or against the working
    /// directory when it is `None`.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    /// Where the file for an already-sanitised `name` is looked up.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Removes control characters and surrounding whitespace from a typed name.
pub fn sanitize_file_name(raw: &str) -> String {
    let visible: String = raw.chars().filter(|c| !c.is_control()).collect();
    visible.trim().to_string()
}

impl ProgramLoader for FsProgramLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>, ProgramLoadError> {
        let name = sanitize_file_name(name);
        if name.is_empty() {
            return Err(ProgramLoadError::EmptyName);
        }

        let path = self.resolve(&name);
        debug!("loading program from {}", path.display());
        std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ProgramLoadError::NotFound { path },
            _ => ProgramLoadError::Io { path, source },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("c64kb_prg_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_sanitize_strips_controls_and_whitespace() {
        assert_eq!(sanitize_file_name("  game.prg\t\r\n"), "game.prg");
        assert_eq!(sanitize_file_name("ga\u{1b}me.prg"), "game.prg");
        assert_eq!(sanitize_file_name("my game.prg"), "my game.prg");
    }

    #[test]
    fn test_load_reads_file_relative_to_base_dir() {
        // Arrange
        let dir = temp_dir();
        std::fs::write(dir.join("hello.prg"), [0x01, 0x08, 0xAA]).unwrap();
        let loader = FsProgramLoader::new(Some(dir.clone()));

        // Act
        let image = loader.load(" hello.prg ").unwrap();

        // Assert
        assert_eq!(image, vec![0x01, 0x08, 0xAA]);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_absolute_path_ignores_base_dir() {
        let dir = temp_dir();
        let file = dir.join("abs.prg");
        std::fs::write(&file, [0x00, 0xC0, 0x60]).unwrap();
        let loader = FsProgramLoader::new(Some(PathBuf::from("/nonexistent")));

        let image = loader.load(file.to_str().unwrap()).unwrap();

        assert_eq!(image, vec![0x00, 0xC0, 0x60]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_reports_not_found_with_path() {
        // Arrange
        let dir = temp_dir();
        let loader = FsProgramLoader::new(Some(dir.clone()));

        // Act
        let result = loader.load("missing.prg");

        // Assert
        match result {
            Err(ProgramLoadError::NotFound { path }) => assert_eq!(path, dir.join("missing.prg")),
            other => panic!("expected NotFound, got {other:?}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_blank_name_is_rejected() {
        let loader = FsProgramLoader::default();

        assert!(matches!(loader.load(" \r\n"), Err(ProgramLoadError::EmptyName)));
    }
}

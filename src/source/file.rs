//! File-based script source.

use crate::model::error::SourceError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Script file, read completely on construction.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    lines: Vec<String>,
}

impl FileSource {
    /// Open and read `path`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::FileNotFound` if the file does not exist.
    /// Returns `SourceError::Io` for other I/O errors.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SourceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let reader = BufReader::new(File::open(path)?);
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// Path the script was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand out every line. Later calls return nothing.
    pub fn drain_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_all_lines_once() {
        let path = std::env::temp_dir().join("waterfall_file_source_once.jsonl");
        fs::write(&path, "one\ntwo\n").unwrap();

        let mut source = FileSource::new(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(source.drain_lines(), vec!["one", "two"]);
        assert!(source.drain_lines().is_empty());
    }

    #[test]
    fn keeps_last_line_without_newline() {
        let path = std::env::temp_dir().join("waterfall_file_source_partial.jsonl");
        fs::write(&path, "one\ntwo").unwrap();

        let mut source = FileSource::new(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(source.drain_lines(), vec!["one", "two"]);
    }

    #[test]
    fn remembers_path() {
        let path = std::env::temp_dir().join("waterfall_file_source_path.jsonl");
        fs::write(&path, "").unwrap();

        let source = FileSource::new(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(source.path(), path.as_path());
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("waterfall_file_source_missing_4411.jsonl");
        assert!(matches!(
            FileSource::new(&path),
            Err(SourceError::FileNotFound { .. })
        ));
    }
}

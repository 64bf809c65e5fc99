//! Input sources.
//!
//! Two kinds of input feed the engine:
//! - [`ItemStream`]: the data source's lazy, append-only sequence of items,
//!   pulled in batches by [`MasonryEngine::pull_from`](crate::engine::MasonryEngine::pull_from)
//! - [`ScriptSource`]: the JSONL host event script read by the `waterfall`
//!   binary, from a file or piped stdin

use crate::model::error::SourceError;
use crate::model::identifiers::ItemSpec;
use std::collections::VecDeque;
use std::path::PathBuf;

pub mod file;
pub mod stdin;

pub use file::FileSource;
pub use stdin::StdinSource;

/// Lazy, append-only sequence of items produced by a data source.
///
/// Finite or infinite, and not restartable: every item is handed out once.
pub trait ItemStream {
    /// Take up to `max` items. An empty batch means nothing is ready yet.
    ///
    /// # Errors
    /// Any [`SourceError`] the underlying source hits.
    fn next_batch(&mut self, max: usize) -> Result<Vec<ItemSpec>, SourceError>;

    /// True once the stream will never produce another item.
    fn is_exhausted(&self) -> bool;
}

/// In-memory finite stream.
#[derive(Debug, Clone, Default)]
pub struct VecStream {
    pending: VecDeque<ItemSpec>,
}

impl VecStream {
    /// Stream handing out `items` in order.
    pub fn new(items: Vec<ItemSpec>) -> Self {
        Self {
            pending: items.into(),
        }
    }

    /// Items not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ItemStream for VecStream {
    fn next_batch(&mut self, max: usize) -> Result<Vec<ItemSpec>, SourceError> {
        let take = max.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Where the host event script comes from.
#[derive(Debug)]
pub enum ScriptSource {
    /// Script file given on the command line.
    File(FileSource),
    /// Script piped to stdin.
    Stdin(StdinSource<std::io::Stdin>),
}

impl ScriptSource {
    /// Read every remaining line of the script.
    ///
    /// # Errors
    /// [`SourceError::Io`] on read failure.
    pub fn read_lines(&mut self) -> Result<Vec<String>, SourceError> {
        match self {
            ScriptSource::File(f) => Ok(f.drain_lines()),
            ScriptSource::Stdin(s) => s.read_to_end(),
        }
    }
}

/// Pick the script source.
///
/// A path wins; otherwise stdin is used if it is piped.
///
/// # Errors
/// - [`SourceError::FileNotFound`] if `file` does not exist
/// - [`SourceError::NoInput`] if no file is given and stdin is a terminal
/// - [`SourceError::Io`] on read failure
pub fn detect_script_source(file: Option<PathBuf>) -> Result<ScriptSource, SourceError> {
    match file {
        Some(path) => Ok(ScriptSource::File(FileSource::new(path)?)),
        None => Ok(ScriptSource::Stdin(StdinSource::new()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::identifiers::ItemId;
    use std::io::IsTerminal;

    fn spec(name: &str) -> ItemSpec {
        ItemSpec::new(ItemId::new(name).unwrap(), 10)
    }

    mod vec_stream {
        use super::*;

        #[test]
        fn hands_out_items_in_order_and_in_batches() {
            let mut stream = VecStream::new(vec![spec("a"), spec("b"), spec("c")]);

            let first: Vec<String> = stream
                .next_batch(2)
                .unwrap()
                .into_iter()
                .map(|s| s.id.to_string())
                .collect();
            assert_eq!(first, vec!["a", "b"]);
            assert!(!stream.is_exhausted());

            assert_eq!(stream.next_batch(5).unwrap().len(), 1);
            assert!(stream.is_exhausted());
            assert!(stream.next_batch(5).unwrap().is_empty());
        }

        #[test]
        fn zero_max_takes_nothing() {
            let mut stream = VecStream::new(vec![spec("a")]);
            assert!(stream.next_batch(0).unwrap().is_empty());
            assert_eq!(stream.remaining(), 1);
        }

        #[test]
        fn empty_stream_is_exhausted() {
            assert!(VecStream::default().is_exhausted());
        }
    }

    mod detect {
        use super::*;

        #[test]
        fn missing_file_is_reported_with_its_path() {
            let missing = std::env::temp_dir().join("waterfall_missing_script_81723.jsonl");
            let result = detect_script_source(Some(missing.clone()));
            match result {
                Err(SourceError::FileNotFound { path }) => assert_eq!(path, missing),
                other => panic!("expected FileNotFound, got {other:?}"),
            }
        }

        #[test]
        fn existing_file_is_read() {
            let path = std::env::temp_dir().join("waterfall_detect_existing.jsonl");
            std::fs::write(&path, "{\"op\":\"flush\"}\n").unwrap();

            let mut source = detect_script_source(Some(path.clone())).unwrap();
            let _ = std::fs::remove_file(&path);

            assert!(matches!(source, ScriptSource::File(_)));
            assert_eq!(source.read_lines().unwrap(), vec!["{\"op\":\"flush\"}"]);
        }

        #[test]
        fn terminal_stdin_without_file_is_no_input() {
            // Only meaningful when the test runner's stdin is a terminal.
            if std::io::stdin().is_terminal() {
                assert!(matches!(
                    detect_script_source(None),
                    Err(SourceError::NoInput)
                ));
            }
        }
    }
}

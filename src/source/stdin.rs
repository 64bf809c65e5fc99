//! Stdin-based script source for piped input.

use crate::model::error::SourceError;
use std::io::{BufRead, BufReader, IsTerminal, Read};

/// Piped stdin, read line by line.
///
/// Refuses an interactive terminal, so the binary never sits waiting for
/// keyboard input when the user forgot to pipe a script.
#[derive(Debug)]
pub struct StdinSource<R: Read> {
    reader: BufReader<R>,
    complete: bool,
}

impl StdinSource<std::io::Stdin> {
    /// Create a new StdinSource from stdin.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NoInput` if stdin is a terminal.
    pub fn new() -> Result<Self, SourceError> {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(SourceError::NoInput);
        }
        Ok(Self::from_reader(stdin))
    }
}

impl<R: Read> StdinSource<R> {
    /// Wrap any reader. Skips the terminal check.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            complete: false,
        }
    }

    /// Next line without its newline, or `None` at EOF.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` for I/O errors.
    pub fn poll(&mut self) -> Result<Option<String>, SourceError> {
        if self.complete {
            return Ok(None);
        }
        let mut buffer = String::new();
        if self.reader.read_line(&mut buffer)? == 0 {
            self.complete = true;
            return Ok(None);
        }
        let line = buffer.strip_suffix('\n').unwrap_or(&buffer);
        let line = line.strip_suffix('\r').unwrap_or(line);
        Ok(Some(line.to_string()))
    }

    /// Read every remaining line.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` for I/O errors.
    pub fn read_to_end(&mut self) -> Result<Vec<String>, SourceError> {
        let mut lines = Vec::new();
        while let Some(line) = self.poll()? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Check if EOF has been reached.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

//! Line-oriented bulk sources
//!
//! A [`LineSource`] turns any buffered reader into a stream of selected
//! field values: one record per line, an optional delimiter-separated field
//! pick, and coalescing of consecutive duplicate values so the histogram
//! pass and the insert pass both see distinct entries. Records come out as
//! `Result<String>` items — a malformed line yields an error item and the
//! stream continues, an I/O failure yields an error item and ends it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, ShardtrieError};

/// Configuration for [`LineSource`]
#[derive(Debug, Clone)]
pub struct LineSourceConfig {
    /// Field delimiter within a line
    pub delimiter: char,
    /// Zero-based index of the field to select; `None` takes the whole line
    pub field: Option<usize>,
}

impl Default for LineSourceConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            field: None,
        }
    }
}

/// Streaming reader of selected-field values from a line-oriented record
/// stream
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    config: LineSourceConfig,
    last: Option<String>,
    line_no: u64,
    done: bool,
}

impl LineSource<BufReader<File>> {
    /// Open a file as a line source with default configuration
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }

    /// Open a file as a line source with the given configuration
    pub fn from_path_with_config<P: AsRef<Path>>(path: P, config: LineSourceConfig) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::with_config(BufReader::new(file), config))
    }
}

impl<R: BufRead> LineSource<R> {
    /// Wrap a buffered reader with default configuration
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, LineSourceConfig::default())
    }

    /// Wrap a buffered reader with the given configuration
    pub fn with_config(reader: R, config: LineSourceConfig) -> Self {
        Self {
            reader,
            config,
            last: None,
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        if self.done {
            return None;
        }
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    // the underlying stream is broken; end after reporting
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
            self.line_no += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            let selected = match self.config.field {
                None => trimmed,
                Some(idx) => match trimmed.split(self.config.delimiter).nth(idx) {
                    Some(field) => field,
                    None => {
                        return Some(Err(ShardtrieError::invalid_data(format!(
                            "line {}: missing field {}",
                            self.line_no, idx
                        ))));
                    }
                },
            };
            if selected.is_empty() {
                continue;
            }
            if self.last.as_deref() == Some(selected) {
                continue;
            }
            let owned = selected.to_string();
            self.last = Some(owned.clone());
            return Some(Ok(owned));
        }
    }
}

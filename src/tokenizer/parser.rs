use std::{
    io::{self, BufRead},
    path::Path,
};

use encoding_rs::Encoding;
use log::debug;
use thiserror::Error;

use super::pipeline::{Pipeline, PipelineError};
use crate::io_utils;

#[derive(Debug, Error)]
pub enum CsvParserError {
    #[error("Line {line} of {source_name}: {source}")]
    Lexical {
        source_name: String,
        line: usize,
        #[source]
        source: PipelineError,
    },
    #[error(
        "Line {line} of {source_name} has {actual} column(s) but the first record has {expected}"
    )]
    ColumnCountMismatch {
        source_name: String,
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("{source_name} does not contain any records")]
    EmptyInput { source_name: String },
    #[error("Failed to decode {source_name} with encoding {encoding}")]
    Decode {
        source_name: String,
        encoding: &'static str,
    },
    #[error("Reading {source_name}")]
    Io {
        source_name: String,
        #[source]
        source: io::Error,
    },
}

/// Line and document level front end over [`Pipeline`].
#[derive(Debug, Default)]
pub struct CsvParser {
    pipeline: Pipeline,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizes one logical record. Line breaks inside quoted fields are
    /// kept as content.
    pub fn parse_line(&mut self, line: &str) -> Result<Vec<String>, PipelineError> {
        self.pipeline.reset();
        if let Err(err) = self.pipeline.feed(line) {
            self.pipeline.reset();
            return Err(err);
        }
        self.pipeline.finish()
    }

    /// Tokenizes a whole document.
    ///
    /// A record whose quoted field is still open at the end of a physical line
    /// continues on the next line with a `\n` in between. Blank lines between
    /// records are skipped. Every record must have the same number of fields as
    /// the first one.
    pub fn parse_reader<R: BufRead>(
        &mut self,
        reader: R,
        source_name: &str,
    ) -> Result<Vec<Vec<String>>, CsvParserError> {
        let lexical = |line: usize, source: PipelineError| CsvParserError::Lexical {
            source_name: source_name.to_string(),
            line,
            source,
        };

        let mut records: Vec<Vec<String>> = Vec::new();
        let mut expected_columns: Option<usize> = None;
        let mut record_start = 0usize;
        let mut in_record = false;

        for (idx, line) in reader.lines().enumerate() {
            let line_number = idx + 1;
            let line = line.map_err(|source| CsvParserError::Io {
                source_name: source_name.to_string(),
                source,
            })?;

            if in_record {
                self.pipeline
                    .handle('\n')
                    .map_err(|err| lexical(record_start, err))?;
            } else {
                if line.trim().is_empty() {
                    continue;
                }
                self.pipeline.reset();
                record_start = line_number;
                in_record = true;
            }

            if let Err(err) = self.pipeline.feed(&line) {
                self.pipeline.reset();
                return Err(lexical(line_number, err));
            }
            if self.pipeline.awaiting_closing_quote() {
                continue;
            }

            let fields = self
                .pipeline
                .finish()
                .map_err(|err| lexical(record_start, err))?;
            in_record = false;

            match expected_columns {
                None => expected_columns = Some(fields.len()),
                Some(expected) if expected != fields.len() => {
                    return Err(CsvParserError::ColumnCountMismatch {
                        source_name: source_name.to_string(),
                        line: record_start,
                        expected,
                        actual: fields.len(),
                    });
                }
                Some(_) => {}
            }
            records.push(fields);
        }

        // A record is only left open while a quoted field is waiting to close.
        if in_record && let Err(err) = self.pipeline.finish() {
            return Err(lexical(record_start, err));
        }
        if records.is_empty() {
            return Err(CsvParserError::EmptyInput {
                source_name: source_name.to_string(),
            });
        }
        debug!("Tokenized {} record(s) from {source_name}", records.len());
        Ok(records)
    }

    pub fn parse_str(
        &mut self,
        text: &str,
        source_name: &str,
    ) -> Result<Vec<Vec<String>>, CsvParserError> {
        self.parse_reader(text.as_bytes(), source_name)
    }

    /// Reads and decodes `path` (or stdin for `-`) before tokenizing it.
    pub fn parse_path(
        &mut self,
        path: &Path,
        encoding: &'static Encoding,
    ) -> Result<Vec<Vec<String>>, CsvParserError> {
        let source_name = path.display().to_string();
        let bytes = io_utils::read_bytes(path).map_err(|source| CsvParserError::Io {
            source_name: source_name.clone(),
            source,
        })?;
        let Some(text) = io_utils::decode_lossless(&bytes, encoding) else {
            return Err(CsvParserError::Decode {
                source_name,
                encoding: encoding.name(),
            });
        };
        self.parse_reader(text.as_bytes(), &source_name)
    }
}

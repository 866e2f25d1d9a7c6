//! Fixture CSV tokenizer.
//!
//! [`Pipeline`] classifies characters of a single record; [`CsvParser`] drives
//! it over lines and documents and enforces a uniform column count.

pub mod parser;
pub mod pipeline;

pub use parser::{CsvParser, CsvParserError};
pub use pipeline::{ESCAPE, Pipeline, PipelineError, QUOTE, SEPARATOR};

/// Quotes `value` so that [`CsvParser`] reads it back unchanged.
pub fn quote_field(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push(QUOTE);
    for c in value.chars() {
        if c == QUOTE || c == ESCAPE {
            quoted.push(ESCAPE);
        }
        quoted.push(c);
    }
    quoted.push(QUOTE);
    quoted
}

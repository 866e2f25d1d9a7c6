//! Character pipeline that turns one logical CSV record into field values.
//!
//! Each lexical context (field start, unquoted field, quoted field, escaped
//! character, after a closing quote) owns an ordered table of rules. A rule
//! pairs a character predicate with an action; the first rule whose predicate
//! matches handles the character. A character that matches no rule in the
//! active table is rejected with [`PipelineError::IllegalInputCharacter`], so
//! nothing is ever dropped silently.
//!
//! Unquoted fields are trimmed: leading whitespace is ignored and interior
//! whitespace is only kept once another non-whitespace character follows it.
//! Quoted fields keep everything literally, including separators and line
//! breaks, up to the closing quote. A backslash escapes the next character in
//! either kind of field.

use std::mem;

use thiserror::Error;

pub const SEPARATOR: char = ',';
pub const QUOTE: char = '"';
pub const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(
        "Illegal input character '{}' at position {position} while reading field {field}",
        .character.escape_debug()
    )]
    IllegalInputCharacter {
        character: char,
        field: usize,
        position: usize,
    },
    #[error("End of input while waiting for a closing quote in field {field}")]
    UnterminatedQuote { field: usize },
    #[error("End of input directly after an escape character in field {field}")]
    DanglingEscape { field: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Unquoted,
    Quoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    FieldStart,
    Unquoted,
    Quoted,
    Escaped(Resume),
    AfterQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Ignore,
    Accept,
    Hold,
    StartUnquoted,
    EndField,
    OpenQuote,
    CloseQuote,
    Escape,
}

struct Rule {
    matches: fn(char) -> bool,
    action: Action,
}

const fn rule(matches: fn(char) -> bool, action: Action) -> Rule {
    Rule { matches, action }
}

fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

fn is_separator(c: char) -> bool {
    c == SEPARATOR
}

fn is_quote(c: char) -> bool {
    c == QUOTE
}

fn is_escape(c: char) -> bool {
    c == ESCAPE
}

fn is_printable(c: char) -> bool {
    !c.is_control()
}

fn is_plain(c: char) -> bool {
    !c.is_control() && c != QUOTE
}

fn is_any(_: char) -> bool {
    true
}

const FIELD_START_RULES: &[Rule] = &[
    rule(is_whitespace, Action::Ignore),
    rule(is_separator, Action::EndField),
    rule(is_quote, Action::OpenQuote),
    rule(is_escape, Action::Escape),
    rule(is_printable, Action::StartUnquoted),
];

const UNQUOTED_RULES: &[Rule] = &[
    rule(is_whitespace, Action::Hold),
    rule(is_separator, Action::EndField),
    rule(is_escape, Action::Escape),
    rule(is_plain, Action::Accept),
];

const QUOTED_RULES: &[Rule] = &[
    rule(is_escape, Action::Escape),
    rule(is_quote, Action::CloseQuote),
    rule(is_any, Action::Accept),
];

const ESCAPED_RULES: &[Rule] = &[rule(is_any, Action::Accept)];

const AFTER_QUOTE_RULES: &[Rule] = &[
    rule(is_whitespace, Action::Ignore),
    rule(is_separator, Action::EndField),
];

impl Mode {
    fn rules(self) -> &'static [Rule] {
        match self {
            Mode::FieldStart => FIELD_START_RULES,
            Mode::Unquoted => UNQUOTED_RULES,
            Mode::Quoted => QUOTED_RULES,
            Mode::Escaped(_) => ESCAPED_RULES,
            Mode::AfterQuote => AFTER_QUOTE_RULES,
        }
    }
}

/// Tokenizer state for a single record.
///
/// A pipeline is reusable but not shareable: it accumulates the field in
/// progress and the completed fields of the current record. Call
/// [`Pipeline::reset`] (or [`Pipeline::finish`]) between records.
#[derive(Debug, Clone)]
pub struct Pipeline {
    mode: Mode,
    current: String,
    pending: String,
    products: Vec<String>,
    position: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            mode: Mode::FieldStart,
            current: String::new(),
            pending: String::new(),
            products: Vec::new(),
            position: 0,
        }
    }

    pub fn reset(&mut self) {
        self.mode = Mode::FieldStart;
        self.current.clear();
        self.pending.clear();
        self.products.clear();
        self.position = 0;
    }

    /// Number of characters consumed since the last reset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Fields completed so far in the current record.
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// True while the record cannot end because a quoted field is still open.
    pub fn awaiting_closing_quote(&self) -> bool {
        matches!(self.mode, Mode::Quoted | Mode::Escaped(Resume::Quoted))
    }

    pub fn feed(&mut self, text: &str) -> Result<(), PipelineError> {
        for c in text.chars() {
            self.handle(c)?;
        }
        Ok(())
    }

    pub fn handle(&mut self, c: char) -> Result<(), PipelineError> {
        let action = self
            .mode
            .rules()
            .iter()
            .find(|rule| (rule.matches)(c))
            .map(|rule| rule.action)
            .ok_or(PipelineError::IllegalInputCharacter {
                character: c,
                field: self.products.len(),
                position: self.position,
            })?;
        self.position += 1;

        match action {
            Action::Ignore => {}
            Action::Hold => self.pending.push(c),
            Action::Accept => {
                self.flush_pending();
                self.current.push(c);
                if let Mode::Escaped(resume) = self.mode {
                    self.mode = match resume {
                        Resume::Unquoted => Mode::Unquoted,
                        Resume::Quoted => Mode::Quoted,
                    };
                }
            }
            Action::StartUnquoted => {
                self.current.push(c);
                self.mode = Mode::Unquoted;
            }
            Action::EndField => self.end_field(),
            Action::OpenQuote => self.mode = Mode::Quoted,
            Action::CloseQuote => self.mode = Mode::AfterQuote,
            Action::Escape => {
                let resume = if self.mode == Mode::Quoted {
                    Resume::Quoted
                } else {
                    Resume::Unquoted
                };
                self.mode = Mode::Escaped(resume);
            }
        }
        Ok(())
    }

    /// Closes the last field and returns the record, leaving the pipeline reset.
    pub fn finish(&mut self) -> Result<Vec<String>, PipelineError> {
        let field = self.products.len();
        let outcome = match self.mode {
            Mode::Quoted | Mode::Escaped(Resume::Quoted) => {
                Err(PipelineError::UnterminatedQuote { field })
            }
            Mode::Escaped(Resume::Unquoted) => Err(PipelineError::DanglingEscape { field }),
            Mode::FieldStart | Mode::Unquoted | Mode::AfterQuote => {
                self.end_field();
                Ok(mem::take(&mut self.products))
            }
        };
        self.reset();
        outcome
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            self.current.push_str(&self.pending);
            self.pending.clear();
        }
    }

    fn end_field(&mut self) {
        self.pending.clear();
        self.products.push(mem::take(&mut self.current));
        self.mode = Mode::FieldStart;
    }
}

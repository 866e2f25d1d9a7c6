//! I/O helpers shared by the loaders, writers and commands.
//!
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **RFC CSV output**: `open_csv_writer` emits standard (double-quote
//!   escaped) CSV for consumers that do not speak the fixture dialect.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decodes `bytes`, or `None` when they are malformed for `encoding`.
pub fn decode_lossless<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let (text, _, had_errors) = encoding.decode(bytes);
    (!had_errors).then_some(text)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    decode_lossless(bytes, encoding)
        .map(Cow::into_owned)
        .ok_or_else(|| {
            anyhow!(
                "Failed to decode text with encoding {}",
                encoding.name()
            )
        })
}

/// Reads the whole of `path`, or stdin for `-`.
pub fn read_bytes(path: &Path) -> io::Result<Vec<u8>> {
    if is_dash(path) {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path)
    }
}

pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = read_bytes(path).with_context(|| {
        if is_dash(path) {
            "Reading stdin".to_string()
        } else {
            format!("Opening input file {path:?}")
        }
    })?;
    decode_bytes(&bytes, encoding).with_context(|| format!("Decoding {path:?}"))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    })
}

pub fn open_csv_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer = open_output(path)?;
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some(" latin1 ")).unwrap().name(),
            "windows-1252"
        );
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn decode_bytes_uses_requested_encoding() {
        let latin1 = resolve_encoding(Some("latin1")).unwrap();
        assert_eq!(decode_bytes(&[0x63, 0x61, 0x66, 0xe9], latin1).unwrap(), "café");
        assert!(decode_bytes(&[0x61, 0xff, 0x62], UTF_8).is_err());
    }

    #[test]
    fn read_bytes_returns_file_contents_undecoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();
        assert_eq!(read_bytes(&path).unwrap(), vec![0x63, 0x61, 0x66, 0xe9]);
        assert!(decode_lossless(&read_bytes(&path).unwrap(), UTF_8).is_none());
        assert!(read_bytes(&dir.path().join("missing.csv")).is_err());
    }
}

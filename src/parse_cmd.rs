use std::io::Write;

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ParseArgs, io_utils, report, tokenizer::CsvParser};

pub fn execute(args: &ParseArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let records = CsvParser::new()
        .parse_path(&args.input, encoding)
        .with_context(|| format!("Tokenizing {:?}", args.input))?;
    info!(
        "Tokenized {} record(s) with {} field(s) each from {:?}",
        records.len(),
        records.first().map(Vec::len).unwrap_or_default(),
        args.input
    );

    if args.table
        && let Some((headers, rows)) = records.split_first()
    {
        let rendered = report::render_table(headers, rows);
        let mut output = io_utils::open_output(args.output.as_deref())?;
        output.write_all(rendered.as_bytes())?;
        output.flush()?;
        return Ok(());
    }

    let mut writer = io_utils::open_csv_writer(args.output.as_deref())?;
    for record in &records {
        writer
            .write_record(record)
            .context("Writing CSV record")?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

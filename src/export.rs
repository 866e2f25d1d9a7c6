use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ExportArgs,
    dataset::{self, csv_set, yaml_set},
    io_utils,
};

pub fn execute(args: &ExportArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = dataset::load_dataset(&args.input, encoding)
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;
    let written = if dataset::is_yaml_path(&args.output) {
        yaml_set::write_yaml_dataset(&dataset, &args.output)
    } else {
        csv_set::write_csv_dataset(&dataset, &args.output)
    };
    written.with_context(|| format!("Exporting dataset to {:?}", args.output))?;
    info!(
        "Exported {} table(s) from {:?} to {:?}",
        dataset.len(),
        args.input,
        args.output
    );
    Ok(())
}

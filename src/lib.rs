pub mod assertion;
pub mod cli;
pub mod compare;
pub mod config;
pub mod data;
pub mod data_type;
pub mod dataset;
pub mod export;
pub mod io_utils;
pub mod parse_cmd;
pub mod report;
pub mod tokenizer;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dataset_fixture", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Parse(args) => parse_cmd::execute(&args),
        Commands::Compare(args) => compare::execute(&args),
        Commands::Export(args) => export::execute(&args),
    }
}

pub mod cli;
pub mod data;
pub mod dataset;
pub mod ddl;
pub mod decimal;
pub mod profile;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{cli::Cli, ddl::DdlOptions};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_ddl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    execute(&cli)
}

fn execute(cli: &Cli) -> Result<()> {
    for input in &cli.inputs {
        ensure!(
            input.is_file(),
            "Input file {input:?} does not exist or is not a file"
        );
    }

    let encoding = dataset::resolve_encoding(cli.input_encoding.as_deref())?;
    let load_options = dataset::LoadOptions {
        has_headers: cli.headers,
        delimiter: cli.delimiter,
        encoding,
    };
    let data = dataset::load(&cli.inputs, &load_options)
        .with_context(|| format!("Loading {} input file(s)", cli.inputs.len()))?;
    info!(
        "Loaded {} table(s) from {} input file(s)",
        data.tables.len(),
        cli.inputs.len()
    );

    let options = DdlOptions {
        schema_name: cli.schema.clone(),
        identity_column: cli.identity,
    };
    let sql = ddl::render(&data, &options)?;

    fs::write(&cli.output, &sql)
        .with_context(|| format!("Writing DDL to {:?}", cli.output))?;
    info!(
        "Wrote {} statement(s) to {:?}",
        data.tables.len(),
        cli.output
    );
    Ok(())
}

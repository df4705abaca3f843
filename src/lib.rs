pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod discover;
pub mod encode;
pub mod error;
pub mod expand;
pub mod frame;
pub mod io_utils;
pub mod load;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod table;
pub mod vehicle_types;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, DiscoverArgs, InputArgs, LoadArgs, PreviewArgs},
    config::PipelineConfig,
    encode::encode_records,
    error::{LoadError, StoreError},
    pipeline::Pipeline,
    store::{MemoryStore, PgStore},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("trip_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {path:?}");
    }
    let cli = Cli::parse();
    match cli.command {
        Commands::Load(args) => handle_load(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Discover(args) => handle_discover(&args),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            PipelineConfig::load(path).with_context(|| format!("Loading config from {path:?}"))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn apply_input_overrides(config: &mut PipelineConfig, input: &InputArgs) {
    if let Some(delimiter) = input.delimiter {
        config.delimiter = Some(delimiter);
    }
    if let Some(encoding) = &input.input_encoding {
        config.encoding = Some(encoding.clone());
    }
}

fn handle_load(args: &LoadArgs) -> Result<()> {
    let mut config = load_config(args.input.config.as_deref())?;
    apply_input_overrides(&mut config, &args.input);
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
    if let Some(extension) = &args.extension {
        config.extension = extension.trim_start_matches('.').to_string();
    }
    let pipeline = Pipeline::new(config)?;
    info!(
        "Loading exports under {} into {}{}",
        args.root.display(),
        pipeline.config().table,
        if args.dry_run { " (dry run)" } else { "" }
    );

    let summary = if args.dry_run {
        pipeline.run(&args.root, || Ok(MemoryStore::new()))?
    } else {
        let table = pipeline.config().table.clone();
        pipeline.run(&args.root, || {
            let url = args
                .database_url
                .as_deref()
                .ok_or(LoadError::Connect(StoreError::MissingDatabaseUrl))?;
            PgStore::connect(url, &table).map_err(LoadError::Connect)
        })?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("Processed {} file(s)", summary.files_processed());
    if !summary.files.is_empty() {
        print!("{}", table::summary_table(&summary));
    }
    println!(
        "Done. Total inserted: {}. Total skipped: {}.",
        summary.total_inserted, summary.total_skipped
    );
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let mut config = load_config(args.options.config.as_deref())?;
    apply_input_overrides(&mut config, &args.options);
    let pipeline = Pipeline::new(config)?;
    let prepared = pipeline.prepare_file(&args.input)?;
    let shown = prepared.normalized.len().min(args.rows);
    let trips = encode_records(&prepared.normalized.records[..shown]);

    println!("Format: {}", prepared.format.label());
    println!(
        "Rows: {} valid, {} rejected",
        prepared.normalized.len(),
        prepared.normalized.rejected
    );
    print!("{}", table::trips_table(&trips));
    info!("Displayed {} row(s) from {:?}", trips.len(), args.input);
    Ok(())
}

fn handle_discover(args: &DiscoverArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(extension) = &args.extension {
        config.extension = extension.trim_start_matches('.').to_string();
    }
    let pipeline = Pipeline::new(config)?;
    let files = pipeline.discover(&args.root);
    for file in &files {
        println!("{}", file.display());
    }
    info!("Found {} file(s) under {}", files.len(), args.root.display());
    Ok(())
}

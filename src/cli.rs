use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load traffic-survey CSV exports into PostgreSQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Transform every survey export under a directory and load it into the trips table
    Load(LoadArgs),
    /// Show the canonical trip rows one export would produce, without loading
    Preview(PreviewArgs),
    /// List the exports a load would process, in processing order
    Discover(DiscoverArgs),
}

/// Options shared by every command that reads exports.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// YAML pipeline configuration (keywords, years, chunk size, table)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Directory searched recursively for exports
    #[arg(short, long, default_value = "data/batch")]
    pub root: PathBuf,
    /// PostgreSQL connection URL
    #[arg(long = "database-url", env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
    /// Rows per INSERT statement
    #[arg(long = "chunk-size")]
    pub chunk_size: Option<usize>,
    /// Destination table
    #[arg(long)]
    pub table: Option<String>,
    /// File extension to discover (without the dot)
    #[arg(long)]
    pub extension: Option<String>,
    /// Run the full transform against an in-memory store instead of the database
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Print the run summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Export to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of trip rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    #[command(flatten)]
    pub options: InputArgs,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Directory searched recursively for exports
    #[arg(short, long, default_value = "data/batch")]
    pub root: PathBuf,
    /// File extension to discover (without the dot)
    #[arg(long)]
    pub extension: Option<String>,
    /// YAML pipeline configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\t" => Ok('\t'),
        "comma" | "," => Ok(','),
        "|" | "pipe" => Ok('|'),
        ";" | "semicolon" => Ok(';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first)
        }
    }
}

use crate::config::load_config;
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, layout_tsv, write_layout_dump};
use crate::parser::parse_people;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "sippschaft", version, about = "Generation-row layout for family trees")]
pub struct Args {
    /// Person graph (JSON object keyed by id, or an array) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Measure labels with installed fonts instead of the built-in table
    #[arg(long = "system-fonts")]
    pub system_fonts: bool,

    /// Size every box to its own label instead of the widest one
    #[arg(long = "per-node-width")]
    pub per_node_width: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Tsv,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let mut config = load_config(args.config.as_deref())?;
    if args.system_fonts {
        config.layout.fast_text_metrics = false;
    }
    if args.per_node_width {
        config.layout.uniform_node_width = false;
    }

    let input = read_input(args.input.as_deref())?;
    let people = parse_people(&input)?;
    debug!(people = people.len(), "parsed person graph");
    let layout = compute_layout(&people, &config.layout);

    match (args.format, args.output.as_deref()) {
        (OutputFormat::Json, Some(path)) => write_layout_dump(path, &layout, &people)
            .with_context(|| format!("failed to write {}", path.display()))?,
        (OutputFormat::Json, None) => {
            let dump = LayoutDump::from_layout(&layout, &people);
            let json = serde_json::to_string_pretty(&dump)?;
            write_stdout(&json)?;
        }
        (OutputFormat::Tsv, Some(path)) => std::fs::write(path, layout_tsv(&layout))
            .with_context(|| format!("failed to write {}", path.display()))?,
        (OutputFormat::Tsv, None) => write_stdout(&layout_tsv(&layout))?,
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

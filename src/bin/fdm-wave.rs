//! Command line driver: reads a JSON run configuration, runs it and writes the
//! snapshots to stdout.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;

use fdm_wave::{run, run_final, Config, Grid, StabilityWarning};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fdm-wave")]
#[command(about = "Explicit finite difference solver for the 1D wave equation", long_about = None)]
struct Args {
    /// JSON run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: Format,

    /// Only output the last snapshot (keeps two snapshots in memory)
    #[arg(long)]
    final_only: bool,

    /// Fail instead of warning when the scheme is unstable
    #[arg(long)]
    strict: bool,

    /// Override the number of steps from the configuration
    #[arg(short, long)]
    steps: Option<usize>,
}

#[derive(Serialize)]
struct Snapshot {
    index: usize,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct Report {
    snapshots: Vec<Snapshot>,
    warnings: Vec<String>,
}

fn report<'a, I>(snapshots: I, warnings: &[StabilityWarning]) -> Report
    where I: IntoIterator<Item = (usize, &'a Grid)>
{
    Report {
        snapshots: snapshots.into_iter()
            .map(|(index, g)| Snapshot { index, values: g.to_vec() })
            .collect(),
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
    }
}

fn write_csv<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    for s in &report.snapshots {
        write!(out, "{}", s.index)?;
        for x in &s.values {
            write!(out, ",{}", x)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let mut config: Config = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", args.config.display()))?;
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    config.strict |= args.strict;

    info!("running {} steps on {} points", config.steps, config.grid_size);

    let report = if args.final_only {
        let state = run_final(&config)?;
        info!("peak amplitude {}", state.peak);
        report(Some((state.steps, &state.grid)), &state.warnings)
    } else {
        let history = run(&config)?;
        report(history.iter().enumerate(), history.warnings())
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match args.format {
        Format::Csv => write_csv(&mut out, &report)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

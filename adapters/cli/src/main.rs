#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that relaxes a sandpile and saves its states as bitmaps.

mod driver;
mod seed_file;

use std::{fs, path::PathBuf, process};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use sandpile_rendering::BitmapDirectory;
use sandpile_system_schedule::{Config, Schedule};
use sandpile_world::{query, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Relax a sandpile seeded from a TSV file and save its states as BMP images.
#[derive(Parser, Debug)]
#[command(name = "sandpile", version)]
struct Cli {
    /// Directory receiving `state_<iteration>.bmp` images; created if missing.
    #[arg(short = 'o', long = "output", env = "SANDPILE_OUTPUT")]
    output: PathBuf,

    /// Maximum number of relaxation passes.
    #[arg(short = 'm', long = "max-iter", env = "SANDPILE_MAX_ITER")]
    max_iter: u64,

    /// Save an image every this many passes; 0 saves only the final state.
    #[arg(short = 'f', long = "freq", env = "SANDPILE_FREQ")]
    freq: u64,

    /// Tab-separated seed file with `x`, `y` and `grains` columns.
    #[arg(
        short = 'i',
        long = "input",
        env = "SANDPILE_INPUT",
        default_value = "input.tsv"
    )]
    input: PathBuf,
}

/// Entry point for the sandpile command-line interface.
fn main() -> Result<()> {
    let cli = parse_cli();
    init_tracing();
    run(&cli)
}

fn parse_cli() -> Cli {
    Cli::try_parse().unwrap_or_else(|err| {
        if matches!(
            err.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        ) {
            err.exit();
        }
        println!("{}", Cli::command().render_usage());
        eprintln!("{err}");
        process::exit(1);
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run(cli: &Cli) -> Result<()> {
    fs::create_dir_all(&cli.output).with_context(|| {
        format!(
            "failed to create output directory {}",
            cli.output.display()
        )
    })?;

    let seeds = seed_file::read_seed_file(&cli.input)
        .with_context(|| format!("failed to load seeds from {}", cli.input.display()))?;
    info!(cells = seeds.len(), input = %cli.input.display(), "loaded seed cells");

    let mut world = World::from_seeds(&seeds).context("cannot build the initial lattice")?;
    let bounds = query::bounds(&world);
    info!(
        width = bounds.width(),
        height = bounds.height(),
        grains = %query::total_grains(&world),
        "lattice initialised"
    );

    let mut schedule = Schedule::new(Config::new(cli.max_iter, cli.freq));
    let mut sink = BitmapDirectory::new(&cli.output);
    let summary = driver::run(&mut world, &mut schedule, &mut sink);

    if summary.skipped > 0 {
        warn!(skipped = summary.skipped, "some images could not be saved");
    }
    info!(
        iterations = summary.iterations,
        halt = ?summary.halt,
        images = summary.saved.len(),
        "simulation finished"
    );
    Ok(())
}

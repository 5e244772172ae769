//! CLI entry point: generate a market-data stream, or process one.
//!
//! Usage:
//!   mdsim generate --changes 10000 --errors > feed.txt
//!   mdsim process --input feed.txt --snapshot-every 500

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;

use clap::{Parser, Subcommand};
use log::{info, warn};

use mdsim::{Config, Generator, OutputFormat, Processor, SnapshotRenderer};

#[derive(Parser)]
#[command(name = "mdsim")]
#[command(about = "Limit order book market-data generator and processor")]
#[command(version)]
struct Cli {
    /// Path to a TOML config (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a book and emit a stream of book events
    Generate {
        /// Number of generator ticks after the initial book
        #[arg(long, default_value_t = 10_000)]
        changes: usize,

        /// Inject malformed and inconsistent events
        #[arg(long)]
        errors: bool,

        /// Strategy seed
        #[arg(long)]
        seed: Option<u64>,

        /// Selection strategy name
        #[arg(long)]
        strategy: Option<String>,

        /// Write events here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rebuild a book from an event stream and render snapshots
    Process {
        /// Read events from here instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Render a snapshot every N lines
        #[arg(long)]
        snapshot_every: Option<u64>,

        /// Levels per side in each snapshot
        #[arg(long)]
        depth: Option<usize>,

        /// Snapshot format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Stop after N lines
        #[arg(long)]
        limit: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
    let mut config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Generate {
            changes,
            errors,
            seed,
            strategy,
            output,
        } => {
            config.errors.enabled |= errors;
            if let Some(seed) = seed {
                config.strategy.seed = seed;
            }
            if let Some(name) = strategy {
                config.strategy.name = name;
            }
            config
                .validate()
                .and_then(|()| run_generate(&config, changes, output))
        }
        Command::Process {
            input,
            snapshot_every,
            depth,
            format,
            limit,
        } => {
            let p = &mut config.processor;
            if let Some(n) = snapshot_every {
                p.snapshot_interval = n;
            }
            if let Some(d) = depth {
                p.depth = d;
            }
            if let Some(f) = format {
                p.format = f;
            }
            config
                .validate()
                .and_then(|()| run_process(&config, input, limit))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_generate(config: &Config, changes: usize, output: Option<PathBuf>) -> mdsim::Result<()> {
    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut generator = Generator::from_config(config)?;
    generator.create_order_book();
    let mut written = 0u64;
    for tick in 0..=changes {
        if tick > 0 {
            generator.tick();
        }
        for emission in generator.drain_emitted() {
            writeln!(out, "{emission}")?;
            written += 1;
        }
    }
    out.flush()?;

    info!("wrote {written} line(s) from {changes} change(s)");
    eprint!("{}", generator.injector_stats());
    Ok(())
}

fn run_process(config: &Config, input: Option<PathBuf>, limit: Option<u64>) -> mdsim::Result<()> {
    let reader: Box<dyn BufRead> = match &input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let p = &config.processor;
    let renderer = SnapshotRenderer::spawn(BufWriter::new(io::stdout()), p.format)?;
    let processor = Processor::new(p, Some(renderer)).with_limit(limit);

    // Seen before the next line is processed; a blocked stdin read still
    // waits for its line or end of input.
    let stop = processor.stop_flag();
    if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Release)) {
        warn!("signal handler not installed, Ctrl-C will abort: {e}");
    }

    let summary = processor.run(reader)?;

    eprint!("{summary}");
    Ok(())
}

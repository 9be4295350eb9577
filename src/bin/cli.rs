//! Timeslicer CLI
//!
//! Offline inspection of a store: opens the files directly, so the server
//! must not be running against the same store.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use timeslicer::config::Config;
use timeslicer::{Engine, SliceStore, Store, TimeslicerError};
use tracing_subscriber::{fmt, EnvFilter};

/// Timeslicer CLI
#[derive(Parser, Debug)]
#[command(name = "timeslicer-cli")]
#[command(about = "Inspect and edit a timeslicer store")]
struct Args {
    /// Store directory (defaults to ~/.config/timeslicer)
    #[arg(short = 'd', long)]
    store_dir: Option<PathBuf>,

    /// Store name (files are <name>.db and <name>.index)
    #[arg(short, long, default_value = "timeslicer")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every key with its index entry
    Keys,

    /// Print the slices stored under a key
    Get {
        /// Day key, e.g. 2024-03-07
        key: String,
    },

    /// Set the activity of one slice
    SetSlice {
        /// Day key, e.g. 2024-03-07
        key: String,

        /// Slice label, e.g. 08h30
        slice: String,

        /// Activity to record
        activity: String,
    },

    /// Show file sizes and replay numbers
    Stats,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let mut config = Config::builder().store_name(&args.store);
    if let Some(dir) = &args.store_dir {
        config = config.store_dir(dir);
    }
    let engine = Engine::open(config.build()).context("failed to open store")?;
    let store = SliceStore::new(engine);

    match args.command {
        Commands::Keys => {
            for entry in store.engine().index_snapshot() {
                println!(
                    "{}\tdata={}+{}\tindex={}",
                    entry.key, entry.data_offset, entry.data_length, entry.index_offset
                );
            }
        }
        Commands::Get { key } => {
            let slices = store.get(&key)?.ok_or(TimeslicerError::KeyNotFound)?;
            println!("{}", serde_json::to_string_pretty(&slices)?);
        }
        Commands::SetSlice {
            key,
            slice,
            activity,
        } => {
            if !store.set_slice(&key, &slice, &activity)? {
                anyhow::bail!("no slice {:?} stored under {:?}", slice, key);
            }
            store.engine().flush()?;
            println!("{} {} = {}", key, slice, activity);
        }
        Commands::Stats => {
            let engine = store.engine();
            let summary = engine.bootstrap_summary();
            println!("directory:        {}", engine.layout().dir().display());
            println!("keys:             {}", engine.key_count());
            println!("index records:    {}", engine.index_record_count()?);
            println!("data bytes:       {}", engine.data_file_size()?);
            println!("replayed records: {}", summary.records_replayed);
            println!("truncated bytes:  {}", summary.truncated_bytes);
        }
    }

    store.close()?;
    Ok(())
}

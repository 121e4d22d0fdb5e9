//! Airport cache management CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use sporganiser::airport::{AirportCache, CacheFile, CACHE_FORMAT_VERSION};

use super::common;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show where the airport cache lives and what it holds
    Status,
    /// Delete the airport cache; the next run re-parses every pack
    Clear,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    let config = common::load_config()?;
    let path = config.organiser.cache_file;

    match action {
        CacheAction::Status => status(path),
        CacheAction::Clear => {
            let removed = AirportCache::clear(&path).map_err(|error| CliError::Cache {
                path: path.clone(),
                error,
            })?;
            if removed {
                println!("Deleted airport cache at {}", path.display());
            } else {
                println!("No airport cache at {}", path.display());
            }
            Ok(())
        }
    }
}

fn status(path: PathBuf) -> Result<(), CliError> {
    println!("Airport cache: {}", path.display());

    if !path.exists() {
        println!("  (not created yet)");
        return Ok(());
    }

    match CacheFile::load(&path) {
        Ok(file) if file.version == CACHE_FORMAT_VERSION => {
            let airports: usize = file.entries.iter().map(|(_, e)| e.airport_ids.len()).sum();
            println!("  Packs:    {}", file.entries.len());
            println!("  Airports: {}", airports);
            println!("  Saved:    {}", file.age_human());
        }
        Ok(file) => {
            println!(
                "  Format version {} (current {}), will be rebuilt on the next run",
                file.version, CACHE_FORMAT_VERSION
            );
        }
        Err(e) => {
            println!("  Unreadable ({}), will be rebuilt on the next run", e);
        }
    }

    Ok(())
}

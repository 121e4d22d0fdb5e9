//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sporganiser::config::ConfigFile;
use sporganiser::manifest::{MergeOptions, UnclassifiedPolicy};
use sporganiser::organiser::{
    Organiser, OrganiserConfig, RunReport, ScanOutcome, ScanPhase, ScanProgress,
    ScanProgressCallback,
};
use sporganiser::overlap::ConflictResolutions;

use crate::error::CliError;

/// Arguments shared by `run` and `check`. Flags override config.ini.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// X-Plane installation folder (contains "Custom Scenery")
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Scan threads, 0 = one per CPU core
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Do not read or write the airport cache
    #[arg(long)]
    pub no_cache: bool,

    /// Write unclassified packs enabled instead of disabled
    #[arg(long)]
    pub include_unclassified: bool,

    /// Ignore enabled/disabled choices from the previous scenery_packs.ini
    #[arg(long)]
    pub no_carry_over: bool,

    /// Do not add *GLOBAL_AIRPORTS* when no Global Airports pack is installed
    #[arg(long)]
    pub no_global_airports: bool,

    /// Order of a conflict group, one-based: GROUP=I,J,... (repeatable)
    #[arg(long = "order", value_name = "GROUP=I,J,...")]
    pub orders: Vec<String>,
}

impl ScanArgs {
    /// Installation folder from the flag or config.ini.
    pub fn install_dir(&self, config: &ConfigFile) -> Result<PathBuf, CliError> {
        self.install_dir
            .clone()
            .or_else(|| config.xplane.install_dir.clone())
            .ok_or(CliError::NoInstallDir)
    }

    /// Organiser configuration; flags take precedence over config.ini.
    pub fn organiser_config(&self, config: &ConfigFile) -> Result<OrganiserConfig, CliError> {
        let settings = &config.organiser;
        let mut organiser = OrganiserConfig::new(self.install_dir(config)?)
            .with_workers(self.workers.unwrap_or(settings.workers));
        if !self.no_cache {
            organiser = organiser.with_cache_file(&settings.cache_file);
        }
        Ok(organiser)
    }

    /// Orders given with `--order`.
    pub fn resolutions(&self) -> Result<ConflictResolutions, CliError> {
        let mut resolutions = ConflictResolutions::new();
        for order in &self.orders {
            resolutions.parse_arg(order)?;
        }
        Ok(resolutions)
    }

    /// Whether unclassified packs are enabled unless the user is asked.
    pub fn include_unclassified(&self, config: &ConfigFile) -> bool {
        self.include_unclassified || config.organiser.include_unclassified
    }

    /// Merge options for a chosen unclassified policy.
    pub fn merge_options(&self, config: &ConfigFile, include_unclassified: bool) -> MergeOptions {
        let policy = if include_unclassified {
            UnclassifiedPolicy::IncludeEnabled
        } else {
            UnclassifiedPolicy::Disable
        };
        MergeOptions::new(policy)
            .with_carry_over(config.organiser.carry_over && !self.no_carry_over)
            .with_global_airports_placeholder(
                config.organiser.global_airports_placeholder && !self.no_global_airports,
            )
    }
}

/// Load config.ini, failing on malformed values.
pub fn load_config() -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load()?)
}

/// Scan with an optional terminal progress bar.
///
/// Returns the organiser too so the caller can finalize and write with the
/// same cache and configuration.
pub fn scan(
    config: OrganiserConfig,
    show_progress: bool,
) -> Result<(Organiser, ScanOutcome), CliError> {
    let mut organiser = Organiser::new(config);
    let bar = show_progress.then(scan_progress_bar);
    if let Some((_, callback)) = &bar {
        organiser = organiser.with_progress(Arc::clone(callback));
    }

    let outcome = organiser.scan();
    if let Some((bar, _)) = bar {
        bar.finish_and_clear();
    }
    Ok((organiser, outcome?))
}

/// Progress bar wired to scan progress updates.
fn scan_progress_bar() -> (ProgressBar, ScanProgressCallback) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let handle = bar.clone();
    let callback: ScanProgressCallback = Arc::new(move |progress: ScanProgress| match progress.phase {
        ScanPhase::Discovering => handle.set_message("listing Custom Scenery"),
        ScanPhase::Scanning => {
            handle.set_length(progress.packs_total as u64);
            handle.set_position(progress.packs_complete as u64);
            if let Some(pack) = progress.current_pack {
                handle.set_message(pack);
            }
        }
        ScanPhase::DetectingOverlaps => handle.set_message("detecting overlaps"),
        ScanPhase::Complete => handle.set_message("done"),
    });

    (bar, callback)
}

/// Print the per-pack problems of a scan.
pub fn print_report(report: &RunReport) {
    println!(
        "Found {} entries, classified {} packs",
        report.entries_found, report.packs_classified
    );
    for (tier, count) in &report.tier_counts {
        println!("  {:<20} {}", tier.label(), count);
    }
    println!(
        "Airport cache: {} hits, {} misses",
        report.cache_hits, report.cache_misses
    );

    let sections = [
        ("Unresolvable entries", &report.unresolved),
        ("Excluded packs", &report.build_failures),
        ("Malformed airport files", &report.extraction_failures),
        ("Unclassified packs", &report.unclassified),
        ("Structural warnings", &report.structural_warnings),
    ];
    for (title, issues) in sections {
        if issues.is_empty() {
            continue;
        }
        println!();
        println!("{} ({}):", title, issues.len());
        for issue in issues {
            println!("  {}", issue);
        }
    }

    if !report.missing_prior.is_empty() {
        println!();
        println!(
            "No longer installed ({}), dropped from the manifest:",
            report.missing_prior.len()
        );
        for target in &report.missing_prior {
            println!("  {}", target);
        }
    }
}

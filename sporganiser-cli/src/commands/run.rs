//! `sporganiser run`: scan, resolve, write.

use clap::Args;
use console::style;
use sporganiser::manifest::{MergeOptions, PriorManifest};
use tracing::info;

use super::common::{self, ScanArgs};
use super::prompt;
use crate::error::CliError;

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Never prompt; unordered conflict groups stay alphabetical
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(args: RunArgs) -> Result<(), CliError> {
    let config = common::load_config()?;
    let interactive = !args.yes && prompt::interactive();

    let organiser_config = args.scan.organiser_config(&config)?;
    let install_dir = organiser_config.install_dir.clone();
    println!("Scanning {}", organiser_config.scenery_dir().display());

    let (organiser, outcome) = common::scan(organiser_config, interactive)?;
    common::print_report(&outcome.report);

    let mut resolutions = args.scan.resolutions()?;
    resolutions.validate(&outcome.conflict_groups)?;
    if interactive && outcome.has_conflicts() {
        prompt::order_groups(&outcome.conflict_groups, &mut resolutions)?;
    }

    let mut include_unclassified = args.scan.include_unclassified(&config);
    if interactive && !args.scan.include_unclassified && !outcome.report.unclassified.is_empty() {
        include_unclassified =
            prompt::confirm_unclassified(&outcome.report.unclassified, include_unclassified)?;
    }

    let mut options = args.scan.merge_options(&config, include_unclassified);
    if interactive {
        if let Some(disabled) = carry_over_question(&options, &outcome.prior) {
            let keep = prompt::confirm_carry_over(disabled)?;
            options = options.with_carry_over(keep);
        }
    }
    let manifest = organiser.finalize(&outcome, &resolutions, &options)?;
    let written = organiser.write(&manifest)?;

    info!(
        install_dir = %install_dir.display(),
        entries = written.entries,
        groups = outcome.conflict_groups.len(),
        "Run complete"
    );

    println!();
    println!(
        "{} {} ({} entries, {} enabled)",
        style("Wrote").green().bold(),
        written.manifest_path.display(),
        written.entries,
        manifest.enabled_count()
    );
    if let Some(backup) = &written.backup_path {
        println!("Previous manifest saved as {}", backup.display());
    }
    let unclassified = manifest.unclassified().count();
    if unclassified > 0 {
        println!(
            "{} unclassified pack(s) listed in {}",
            unclassified,
            written.unsorted_path.display()
        );
    }

    Ok(())
}

/// Number of disabled prior entries worth asking about, if carry-over is on.
fn carry_over_question(options: &MergeOptions, prior: &PriorManifest) -> Option<usize> {
    let disabled = prior.disabled_count();
    (options.carry_over && disabled > 0).then_some(disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sporganiser::manifest::UnclassifiedPolicy;
    use std::collections::HashSet;
    use std::path::Path;

    fn prior(text: &str) -> PriorManifest {
        PriorManifest::from_text(text, Path::new("/xp"), &HashSet::new())
    }

    #[test]
    fn test_carry_over_asked_only_for_disabled_entries() {
        let options = MergeOptions::new(UnclassifiedPolicy::Disable);
        let with_disabled = prior(
            "SCENERY_PACK Custom Scenery/A/\nSCENERY_PACK_DISABLED Custom Scenery/B/\n",
        );

        assert_eq!(carry_over_question(&options, &with_disabled), Some(1));
        assert_eq!(
            carry_over_question(&options, &prior("SCENERY_PACK Custom Scenery/A/\n")),
            None
        );
        assert_eq!(carry_over_question(&options, &PriorManifest::empty()), None);
    }

    #[test]
    fn test_carry_over_not_asked_when_disabled_by_flag() {
        let options = MergeOptions::new(UnclassifiedPolicy::Disable).with_carry_over(false);
        let with_disabled = prior("SCENERY_PACK_DISABLED Custom Scenery/B/\n");
        assert_eq!(carry_over_question(&options, &with_disabled), None);
    }
}

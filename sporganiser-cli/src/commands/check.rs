//! `sporganiser check`: dry run that prints the report and the manifest
//! `run` would write.

use clap::Args;
use serde_json::json;
use sporganiser::manifest::FinalManifest;
use sporganiser::overlap::ConflictGroup;

use super::common::{self, ScanArgs};
use super::prompt;
use crate::error::CliError;

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Print a machine-readable JSON document instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let config = common::load_config()?;
    let organiser_config = args.scan.organiser_config(&config)?;
    let scenery_dir = organiser_config.scenery_dir();

    let (organiser, outcome) =
        common::scan(organiser_config, !args.json && prompt::interactive())?;

    let resolutions = args.scan.resolutions()?;
    let options = args
        .scan
        .merge_options(&config, args.scan.include_unclassified(&config));
    let manifest = organiser.finalize(&outcome, &resolutions, &options)?;
    let text = organiser.writer().preview(&manifest);

    if args.json {
        let document = json!({
            "scenery_dir": &scenery_dir,
            "report": &outcome.report,
            "conflict_groups": groups_json(&outcome.conflict_groups),
            "manifest": manifest_json(&manifest),
            "text": text,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    common::print_report(&outcome.report);

    if outcome.has_conflicts() {
        println!();
        println!("Conflict groups ({}):", outcome.conflict_groups.len());
        for (index, group) in outcome.conflict_groups.iter().enumerate() {
            println!("  Group {}:", index + 1);
            for (position, name) in group.member_names().iter().enumerate() {
                println!("    {}. {}", position + 1, name);
            }
        }
        println!("Reorder with: sporganiser run --order <group>=<i>,<j>,...");
    }

    println!();
    println!("scenery_packs.ini preview:");
    print!("{}", text);

    Ok(())
}

fn groups_json(groups: &[ConflictGroup]) -> serde_json::Value {
    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            json!({
                "group": index + 1,
                "members": group.member_names(),
                "shared_ids": group.shared_ids,
                "resolution_source": group.resolution_source,
            })
        })
        .collect()
}

fn manifest_json(manifest: &FinalManifest) -> serde_json::Value {
    manifest
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "name": entry.label(),
                "tier": entry.tier,
                "enabled": entry.enabled,
            })
        })
        .collect()
}

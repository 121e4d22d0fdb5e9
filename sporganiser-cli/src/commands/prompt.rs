//! Interactive prompts for decisions the organiser leaves to the user.
//!
//! Only the presentation lives here; validation of the answers is done by
//! the library (`ConflictResolutions`, `MergeOptions`).

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Sort};
use sporganiser::organiser::PackIssue;
use sporganiser::overlap::{ConflictGroup, ConflictResolutions};

use crate::error::CliError;

/// Whether prompts can be shown.
pub fn interactive() -> bool {
    console::user_attended()
}

/// Ask for the order of every group not already ordered by `--order`.
pub fn order_groups(
    groups: &[ConflictGroup],
    resolutions: &mut ConflictResolutions,
) -> Result<(), CliError> {
    let theme = ColorfulTheme::default();

    for (index, group) in groups.iter().enumerate() {
        if resolutions.get(index).is_some() {
            continue;
        }

        println!();
        println!(
            "{} {} packs declare the same airports: {}",
            style(format!("Conflict group {}:", index + 1)).bold(),
            group.members.len(),
            shared_ids(group)
        );
        println!("The first pack listed wins in X-Plane.");

        let order = Sort::with_theme(&theme)
            .with_prompt("Arrange by priority (space to pick up, enter to confirm)")
            .items(&group.member_names())
            .interact()?;
        resolutions.set(index, order);
    }

    Ok(())
}

/// Ask whether unclassified packs should be written enabled.
pub fn confirm_unclassified(packs: &[PackIssue], default: bool) -> Result<bool, CliError> {
    println!();
    println!(
        "{}",
        style(format!("{} pack(s) could not be classified:", packs.len())).yellow()
    );
    for pack in packs {
        println!("  {}", pack);
    }
    println!("They will be placed at the end of scenery_packs.ini.");

    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Enable them?")
        .default(default)
        .interact()?)
}

/// Ask whether packs disabled in the previous manifest stay disabled.
pub fn confirm_carry_over(disabled: usize) -> Result<bool, CliError> {
    println!();
    println!(
        "{}",
        style(format!(
            "The current scenery_packs.ini disables {} pack(s).",
            disabled
        ))
        .yellow()
    );

    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Keep them disabled?")
        .default(true)
        .interact()?)
}

fn shared_ids(group: &ConflictGroup) -> String {
    const SHOWN: usize = 8;
    let mut ids: Vec<&str> = group.shared_ids.iter().take(SHOWN).map(|id| id.as_str()).collect();
    if group.shared_ids.len() > SHOWN {
        ids.push("...");
    }
    ids.join(", ")
}

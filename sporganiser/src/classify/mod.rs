//! Tier classification.
//!
//! A [`TierClassifier`] runs a prioritised [`RuleTable`] over a descriptor
//! whose airport identifiers and hints have been filled in. Stages, highest
//! precedence first:
//!
//! 1. Vendor quirks (AutoOrtho, simHeaven naming)
//! 2. Airport packs (prefab / default / global / custom)
//! 3. Directory-name cues for the other tiers
//! 4. Airport guard (airport file present, no identifiers)
//! 5. Folder structure and DSF hints
//!
//! Adding a vendor quirk is one [`RuleTable::insert_into_stage`] call.

mod classifier;
mod rules;

pub use classifier::{ClassificationAmbiguous, RuleMatch, TierClassifier};
pub use rules::{
    RuleInput, RuleOutcome, RuleStage, RuleTable, TierRule, AUTOORTHO_REGIONS,
    DEFAULT_AIRPORT_CUES, GLOBAL_AIRPORTS_NAME,
};

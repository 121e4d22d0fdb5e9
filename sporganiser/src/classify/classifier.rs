//! Tier classification.

use thiserror::Error;
use tracing::{debug, warn};

use super::rules::{RuleInput, RuleOutcome, RuleStage, RuleTable};
use crate::pack::{PackDescriptor, Tier};

/// No tier could be assigned with confidence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationAmbiguous {
    /// A guard rule explicitly refused to classify the pack.
    #[error("rule '{rule}' marked the pack unclassifiable")]
    Rejected { rule: String },

    /// Every rule declined.
    #[error("no classification rule matched")]
    NoRuleMatched,
}

/// A successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub tier: Tier,
    /// Name of the rule that decided.
    pub rule: String,
    pub stage: RuleStage,
}

/// Assigns packs to tiers using a [`RuleTable`].
///
/// `classify` is a pure function of the descriptor; it performs no I/O.
#[derive(Debug, Clone)]
pub struct TierClassifier {
    table: RuleTable,
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self::new(RuleTable::standard())
    }
}

impl TierClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Decide the tier of a descriptor whose airport data is already filled in.
    pub fn classify(
        &self,
        descriptor: &PackDescriptor,
    ) -> Result<RuleMatch, ClassificationAmbiguous> {
        let input = RuleInput::from_descriptor(descriptor);

        match self.table.evaluate(&input) {
            Some((rule, RuleOutcome::Tier(tier))) => Ok(RuleMatch {
                tier,
                rule: rule.name().to_string(),
                stage: rule.stage(),
            }),
            Some((rule, RuleOutcome::Unclassifiable)) => Err(ClassificationAmbiguous::Rejected {
                rule: rule.name().to_string(),
            }),
            None => Err(ClassificationAmbiguous::NoRuleMatched),
        }
    }

    /// Classify and record the result on the descriptor.
    ///
    /// On success sets `tier` and clears `airport_ids` for non-airport tiers.
    /// On failure sets `classification_failed` and leaves `tier` unset.
    pub fn apply(
        &self,
        descriptor: &mut PackDescriptor,
    ) -> Result<RuleMatch, ClassificationAmbiguous> {
        let result = self.classify(descriptor);

        match &result {
            Ok(matched) => {
                descriptor.tier = Some(matched.tier);
                descriptor.classification_failed = false;
                if !matched.tier.is_airport() {
                    descriptor.airport_ids.clear();
                }
                debug!(
                    pack = %descriptor.display_name,
                    tier = %matched.tier,
                    rule = %matched.rule,
                    stage = %matched.stage,
                    "Classified pack"
                );
            }
            Err(reason) => {
                descriptor.tier = None;
                descriptor.classification_failed = true;
                descriptor.airport_ids.clear();
                warn!(pack = %descriptor.display_name, %reason, "Could not classify pack");
            }
        }

        result
    }
}

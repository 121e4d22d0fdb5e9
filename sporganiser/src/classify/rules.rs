//! Prioritised tier rule table.
//!
//! Rules are evaluated top to bottom and the first one that returns an
//! outcome wins. Each rule carries the [`RuleStage`] it belongs to; the
//! standard table keeps stages contiguous and in declaration order, and
//! [`RuleTable::insert_into_stage`] preserves that.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::pack::{AirportId, ContentLayout, PackDescriptor, Tier, TierHints};

/// AutoOrtho region pack suffixes (`z_ao_<region>`).
pub const AUTOORTHO_REGIONS: [&str; 6] = ["na", "sa", "eur", "afr", "asi", "aus_pac"];

/// Name fragments of packs shipped with the simulator.
pub const DEFAULT_AIRPORT_CUES: [&str; 4] =
    ["Demo Area", "X-Plane Airports", "X-Plane Landmarks", "Aerosoft"];

/// Exact name of the simulator's global airports pack.
pub const GLOBAL_AIRPORTS_NAME: &str = "Global Airports";

/// Rule precedence groups, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleStage {
    /// Known vendor naming conventions, ahead of any content inspection.
    VendorQuirk,
    /// Packs declaring airport identifiers.
    Airport,
    /// Directory-name cues for non-airport tiers.
    NameCue,
    /// Folder structure and DSF hints.
    Structure,
    /// Airport file present but empty, and nothing else placed the pack.
    AirportGuard,
}

impl fmt::Display for RuleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleStage::VendorQuirk => "vendor-quirk",
            RuleStage::Airport => "airport",
            RuleStage::NameCue => "name-cue",
            RuleStage::Structure => "structure",
            RuleStage::AirportGuard => "airport-guard",
        };
        f.write_str(s)
    }
}

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Tier(Tier),
    /// Stop evaluating and flag the pack as unclassifiable.
    Unclassifiable,
}

/// Everything a rule may look at.
#[derive(Debug)]
pub struct RuleInput<'a> {
    pub name: &'a str,
    pub lower_name: String,
    pub airport_ids: &'a BTreeSet<AirportId>,
    pub content: &'a ContentLayout,
    pub hints: TierHints,
}

impl<'a> RuleInput<'a> {
    pub fn from_descriptor(descriptor: &'a PackDescriptor) -> Self {
        Self {
            name: &descriptor.display_name,
            lower_name: descriptor.display_name.to_lowercase(),
            airport_ids: &descriptor.airport_ids,
            content: &descriptor.content,
            hints: descriptor.hints,
        }
    }

    /// Case-sensitive substring test against any needle.
    pub fn name_contains_any<S: AsRef<str>>(&self, needles: &[S]) -> bool {
        needles.iter().any(|n| self.name.contains(n.as_ref()))
    }

    /// Case-insensitive substring test; needles must be lower case.
    pub fn lower_name_contains_any<S: AsRef<str>>(&self, needles: &[S]) -> bool {
        needles.iter().any(|n| self.lower_name.contains(n.as_ref()))
    }

    pub fn has_airports(&self) -> bool {
        !self.airport_ids.is_empty()
    }
}

type Matcher = Arc<dyn Fn(&RuleInput<'_>) -> Option<RuleOutcome> + Send + Sync>;

/// One named classification rule.
#[derive(Clone)]
pub struct TierRule {
    name: String,
    stage: RuleStage,
    matcher: Matcher,
}

impl fmt::Debug for TierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierRule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl TierRule {
    /// A rule backed by an arbitrary matcher.
    pub fn new<F>(name: impl Into<String>, stage: RuleStage, matcher: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> Option<RuleOutcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            stage,
            matcher: Arc::new(matcher),
        }
    }

    /// A rule that fires when the predicate holds.
    pub fn when<F>(name: impl Into<String>, stage: RuleStage, tier: Tier, predicate: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(name, stage, move |input| {
            predicate(input).then_some(RuleOutcome::Tier(tier))
        })
    }

    /// A case-sensitive name-fragment rule.
    pub fn name_contains(
        name: impl Into<String>,
        stage: RuleStage,
        needles: &[&str],
        tier: Tier,
    ) -> Self {
        let needles: Vec<String> = needles.iter().map(|s| s.to_string()).collect();
        Self::when(name, stage, tier, move |input| input.name_contains_any(&needles))
    }

    /// A case-insensitive name-fragment rule.
    pub fn name_contains_ignore_case(
        name: impl Into<String>,
        stage: RuleStage,
        needles: &[&str],
        tier: Tier,
    ) -> Self {
        let needles: Vec<String> = needles.iter().map(|s| s.to_lowercase()).collect();
        Self::when(name, stage, tier, move |input| {
            input.lower_name_contains_any(&needles)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> RuleStage {
        self.stage
    }

    /// Run the rule.
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Option<RuleOutcome> {
        (self.matcher)(input)
    }
}

/// Ordered rule list; first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<TierRule>,
}

impl RuleTable {
    /// A table with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rule set.
    pub fn standard() -> Self {
        use RuleStage::*;

        let ao_regions: Vec<String> = AUTOORTHO_REGIONS
            .iter()
            .map(|r| format!("z_ao_{}", r))
            .collect();

        let rules = vec![
            TierRule::name_contains(
                "autoortho-overlays",
                VendorQuirk,
                &["yAutoOrtho_Overlays"],
                Tier::AutoOrthoOverlay,
            ),
            TierRule::when(
                "autoortho-regions",
                VendorQuirk,
                Tier::AutoOrthoRegion,
                move |input| input.name_contains_any(&ao_regions),
            ),
            TierRule::name_contains(
                "autoortho-root",
                VendorQuirk,
                &["z_autoortho"],
                Tier::AutoOrthoRegion,
            ),
            TierRule::name_contains_ignore_case(
                "simheaven",
                VendorQuirk,
                &["simheaven"],
                Tier::SimHeavenOverlay,
            ),
            TierRule::when("prefab-airport", Airport, Tier::PrefabAirport, |input| {
                input.has_airports() && input.lower_name.contains("prefab")
            }),
            TierRule::when("default-airport", Airport, Tier::DefaultAirport, |input| {
                input.has_airports() && input.name_contains_any(&DEFAULT_AIRPORT_CUES)
            }),
            TierRule::when("global-airports", Airport, Tier::GlobalAirport, |input| {
                input.has_airports() && input.name == GLOBAL_AIRPORTS_NAME
            }),
            TierRule::when("custom-airport", Airport, Tier::CustomAirport, |input| {
                input.has_airports()
            }),
            TierRule::name_contains_ignore_case(
                "ortho-name",
                NameCue,
                &["ortho4xp", "zortho"],
                Tier::Orthophoto,
            ),
            TierRule::name_contains_ignore_case(
                "landmarks-name",
                NameCue,
                &["x-plane landmarks"],
                Tier::DefaultOverlay,
            ),
            TierRule::name_contains_ignore_case(
                "overlay-name",
                NameCue,
                &["overlay"],
                Tier::CustomOverlay,
            ),
            TierRule::name_contains_ignore_case(
                "mesh-name",
                NameCue,
                &["mesh", "terrain"],
                Tier::TerrainMesh,
            ),
            TierRule::name_contains_ignore_case(
                "library-name",
                NameCue,
                &["library"],
                Tier::SceneryLibrary,
            ),
            TierRule::name_contains_ignore_case(
                "plugin-name",
                NameCue,
                &["plugin"],
                Tier::SceneryPlugin,
            ),
            TierRule::when("plugins-folder", Structure, Tier::SceneryPlugin, |input| {
                input.content.has_plugins
            }),
            TierRule::when("library-txt", Structure, Tier::SceneryLibrary, |input| {
                input.content.has_library_txt
            }),
            TierRule::when("dsf-overlay", Structure, Tier::CustomOverlay, |input| {
                input.hints.dsf_overlay == Some(true)
            }),
            TierRule::when("dsf-ortho", Structure, Tier::Orthophoto, |input| {
                input.hints.dsf_overlay == Some(false) && input.content.has_ortho_layout()
            }),
            TierRule::when("dsf-mesh", Structure, Tier::TerrainMesh, |input| {
                input.hints.dsf_overlay == Some(false)
            }),
            TierRule::when("ortho-layout", Structure, Tier::Orthophoto, |input| {
                input.content.has_ortho_layout()
            }),
            TierRule::new("empty-airport-file", AirportGuard, |input| {
                (input.content.airport_file.is_some() && !input.has_airports())
                    .then_some(RuleOutcome::Unclassifiable)
            }),
        ];

        Self { rules }
    }

    pub fn rules(&self) -> &[TierRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append a rule at the lowest precedence.
    pub fn push(&mut self, rule: TierRule) {
        self.rules.push(rule);
    }

    /// Insert a rule at an explicit position (clamped to the table length).
    pub fn insert(&mut self, index: usize, rule: TierRule) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    /// Insert a rule after the last rule of its own stage, or before the
    /// first rule of a later stage.
    pub fn insert_into_stage(&mut self, rule: TierRule) {
        let index = self
            .rules
            .iter()
            .position(|r| r.stage > rule.stage)
            .unwrap_or(self.rules.len());
        self.rules.insert(index, rule);
    }

    /// Insert a rule directly before the named one. Returns false if no rule
    /// has that name.
    pub fn insert_before(&mut self, existing: &str, rule: TierRule) -> bool {
        match self.rules.iter().position(|r| r.name == existing) {
            Some(index) => {
                self.rules.insert(index, rule);
                true
            }
            None => false,
        }
    }

    /// Remove a rule by name.
    pub fn remove(&mut self, name: &str) -> Option<TierRule> {
        let index = self.rules.iter().position(|r| r.name == name)?;
        Some(self.rules.remove(index))
    }

    /// First matching rule and its outcome.
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Option<(&TierRule, RuleOutcome)> {
        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(input).map(|outcome| (rule, outcome)))
    }
}

//! Final manifest ordering.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::format::{self, IniLine, GLOBAL_AIRPORTS_TOKEN};
use super::prior::PriorManifest;
use crate::overlap::ConflictGroup;
use crate::pack::{PackDescriptor, Tier};

/// What to do with packs no rule could classify.
///
/// Deliberately has no `Default`: enabling an unclassified pack can put it
/// anywhere in X-Plane's load order, so callers must choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnclassifiedPolicy {
    /// Append them disabled.
    Disable,
    /// Append them enabled.
    IncludeEnabled,
}

/// Merge parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub unclassified: UnclassifiedPolicy,
    /// Keep enabled/disabled flags from the previous manifest.
    pub carry_over: bool,
    /// Emit `*GLOBAL_AIRPORTS*` when no Global Airports pack exists.
    pub global_airports_placeholder: bool,
}

impl MergeOptions {
    /// Carry-over on, placeholder off.
    pub fn new(unclassified: UnclassifiedPolicy) -> Self {
        Self {
            unclassified,
            carry_over: true,
            global_airports_placeholder: false,
        }
    }

    pub fn with_carry_over(mut self, carry_over: bool) -> Self {
        self.carry_over = carry_over;
        self
    }

    pub fn with_global_airports_placeholder(mut self, enabled: bool) -> Self {
        self.global_airports_placeholder = enabled;
        self
    }
}

/// What a manifest line points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ManifestTarget {
    Pack(PackDescriptor),
    /// The simulator's built-in global airports.
    GlobalAirports,
}

/// One ordered manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub target: ManifestTarget,
    pub enabled: bool,
    /// `None` for unclassified packs.
    pub tier: Option<Tier>,
}

impl ManifestEntry {
    /// Entry for a pack; the embedded descriptor carries the same flag.
    fn pack(descriptor: &PackDescriptor, enabled: bool, tier: Option<Tier>) -> Self {
        let mut descriptor = descriptor.clone();
        descriptor.enabled = enabled;
        Self {
            target: ManifestTarget::Pack(descriptor),
            enabled,
            tier,
        }
    }

    pub fn descriptor(&self) -> Option<&PackDescriptor> {
        match &self.target {
            ManifestTarget::Pack(d) => Some(d),
            ManifestTarget::GlobalAirports => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.tier.is_none() && self.descriptor().is_some()
    }

    /// Directive line for this entry.
    pub fn ini_line(&self, scenery_dir: &Path) -> IniLine {
        let target = match &self.target {
            ManifestTarget::Pack(d) => format::target_text(&d.path, scenery_dir),
            ManifestTarget::GlobalAirports => GLOBAL_AIRPORTS_TOKEN.to_string(),
        };
        IniLine {
            enabled: self.enabled,
            target,
        }
    }

    pub fn label(&self) -> &str {
        match &self.target {
            ManifestTarget::Pack(d) => &d.display_name,
            ManifestTarget::GlobalAirports => GLOBAL_AIRPORTS_TOKEN,
        }
    }
}

/// The ordered, immutable result of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinalManifest {
    entries: Vec<ManifestEntry>,
}

impl FinalManifest {
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.enabled).count()
    }

    pub fn unclassified(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter(|e| e.is_unclassified())
    }

    /// Full `scenery_packs.ini` text.
    pub fn render(&self, scenery_dir: &Path) -> String {
        render_lines(self.entries.iter(), scenery_dir)
    }

    /// `scenery_packs_unsorted.ini` text: the unclassified packs only.
    pub fn render_unsorted(&self, scenery_dir: &Path) -> String {
        render_lines(self.unclassified(), scenery_dir)
    }
}

fn render_lines<'a>(entries: impl Iterator<Item = &'a ManifestEntry>, scenery_dir: &Path) -> String {
    let mut out = String::from(format::HEADER);
    for entry in entries {
        out.push_str(&entry.ini_line(scenery_dir).render());
    }
    out
}

/// One position in the CustomAirport tier before expansion.
enum Slot<'a> {
    Single(&'a PackDescriptor),
    Group(&'a ConflictGroup),
}

/// Combines classified packs, conflict resolutions and prior state.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine;

impl MergeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce the final ordering.
    ///
    /// 1. Tiers in [`Tier`] order.
    /// 2. Inside CustomAirport, each conflict group is one slot keyed by its
    ///    alphabetically first member and expands to its resolved order;
    ///    other packs interleave alphabetically. Other tiers are alphabetical.
    /// 3. Prior flags carry over by path; new packs are enabled.
    /// 4. Unclassified packs go last, enabled per [`UnclassifiedPolicy`].
    pub fn merge(
        &self,
        descriptors: &[PackDescriptor],
        groups: &[ConflictGroup],
        prior: &PriorManifest,
        options: &MergeOptions,
    ) -> FinalManifest {
        let mut by_tier: HashMap<Tier, Vec<&PackDescriptor>> = HashMap::new();
        let mut unclassified: Vec<&PackDescriptor> = Vec::new();

        for descriptor in descriptors {
            match descriptor.tier {
                Some(tier) if !descriptor.classification_failed => {
                    by_tier.entry(tier).or_default().push(descriptor)
                }
                _ => unclassified.push(descriptor),
            }
        }

        let carried = |d: &PackDescriptor| {
            if options.carry_over {
                prior.enabled(&d.path).unwrap_or(true)
            } else {
                true
            }
        };

        let mut entries = Vec::with_capacity(descriptors.len() + 1);

        for tier in Tier::ALL {
            let mut packs = by_tier.remove(&tier).unwrap_or_default();

            if tier == Tier::CustomAirport {
                packs = order_custom_airports(packs, groups);
            } else {
                packs.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            }

            if tier == Tier::GlobalAirport && packs.is_empty() && options.global_airports_placeholder {
                let enabled = if options.carry_over {
                    prior.global_airports().unwrap_or(true)
                } else {
                    true
                };
                debug!("No Global Airports pack, emitting placeholder");
                entries.push(ManifestEntry {
                    target: ManifestTarget::GlobalAirports,
                    enabled,
                    tier: Some(Tier::GlobalAirport),
                });
            }

            for pack in packs {
                entries.push(ManifestEntry::pack(pack, carried(pack), Some(tier)));
            }
        }

        unclassified.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let include = options.unclassified == UnclassifiedPolicy::IncludeEnabled;
        for pack in &unclassified {
            entries.push(ManifestEntry::pack(pack, include, None));
        }

        let manifest = FinalManifest { entries };
        info!(
            entries = manifest.len(),
            enabled = manifest.enabled_count(),
            unclassified = unclassified.len(),
            groups = groups.len(),
            "Merged scenery manifest"
        );
        manifest
    }
}

/// Order CustomAirport packs: groups contiguous at their anchor's position,
/// everything else alphabetical.
fn order_custom_airports<'a>(
    packs: Vec<&'a PackDescriptor>,
    groups: &'a [ConflictGroup],
) -> Vec<&'a PackDescriptor> {
    let present: HashMap<&Path, &'a PackDescriptor> =
        packs.iter().map(|d| (d.path.as_path(), *d)).collect();

    let mut grouped: HashMap<&Path, usize> = HashMap::new();
    for (index, group) in groups.iter().enumerate() {
        for member in &group.members {
            grouped.insert(member.path.as_path(), index);
        }
    }

    let mut slots: Vec<(&'a PackDescriptor, Slot<'a>)> = Vec::new();
    let mut seen_groups = vec![false; groups.len()];

    for pack in &packs {
        match grouped.get(pack.path.as_path()) {
            Some(&index) => {
                if !seen_groups[index] {
                    seen_groups[index] = true;
                    let group = &groups[index];
                    let anchor = group.anchor().unwrap_or(*pack);
                    slots.push((anchor, Slot::Group(group)));
                }
            }
            None => slots.push((*pack, Slot::Single(*pack))),
        }
    }

    slots.sort_by(|a, b| a.0.sort_key().cmp(&b.0.sort_key()));

    let mut ordered = Vec::with_capacity(packs.len());
    for (_, slot) in slots {
        match slot {
            Slot::Single(pack) => ordered.push(pack),
            Slot::Group(group) => ordered.extend(
                group
                    .members
                    .iter()
                    .filter_map(|m| present.get(m.path.as_path()).copied()),
            ),
        }
    }
    ordered
}

//! Airport identifier overlap detection.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use super::resolver::ResolutionSource;
use super::union_find::UnionFind;
use crate::pack::{AirportId, PackDescriptor, Tier};

/// Custom airport packs competing for the same identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictGroup {
    /// Members in final relative priority, highest first.
    pub members: Vec<PackDescriptor>,

    /// Identifiers declared by two or more members.
    pub shared_ids: BTreeSet<AirportId>,

    pub resolution_source: ResolutionSource,
}

impl ConflictGroup {
    pub fn member_names(&self) -> Vec<&str> {
        self.members
            .iter()
            .map(|m| m.display_name.as_str())
            .collect()
    }

    pub fn contains(&self, descriptor: &PackDescriptor) -> bool {
        self.members.iter().any(|m| m.path == descriptor.path)
    }

    /// Alphabetically first member, which anchors the group's position.
    pub fn anchor(&self) -> Option<&PackDescriptor> {
        self.members.iter().min_by(|a, b| a.sort_key().cmp(&b.sort_key()))
    }
}

/// Groups custom airport packs whose identifier sets intersect.
#[derive(Debug, Clone, Default)]
pub struct OverlapDetector;

impl OverlapDetector {
    pub fn new() -> Self {
        Self
    }

    /// Find conflict groups among the CustomAirport descriptors.
    ///
    /// Connectivity is transitive: if A shares with B and B with C, all three
    /// form one group even when A and C share nothing. Groups come back
    /// ordered by their alphabetically first member, members sorted
    /// alphabetically.
    pub fn detect(&self, descriptors: &[PackDescriptor]) -> Vec<ConflictGroup> {
        let candidates: Vec<&PackDescriptor> = descriptors
            .iter()
            .filter(|d| d.tier == Some(Tier::CustomAirport))
            .collect();

        let mut sets = UnionFind::new(candidates.len());
        let mut first_claim: HashMap<&AirportId, usize> = HashMap::new();

        for (index, descriptor) in candidates.iter().enumerate() {
            for id in &descriptor.airport_ids {
                match first_claim.get(id) {
                    Some(&owner) => {
                        sets.union(owner, index);
                    }
                    None => {
                        first_claim.insert(id, index);
                    }
                }
            }
        }

        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for index in 0..candidates.len() {
            components.entry(sets.find(index)).or_default().push(index);
        }

        let mut groups: Vec<ConflictGroup> = components
            .into_values()
            .filter(|members| members.len() >= 2)
            .map(|indices| {
                let mut members: Vec<PackDescriptor> =
                    indices.iter().map(|&i| candidates[i].clone()).collect();
                members.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

                ConflictGroup {
                    shared_ids: shared_ids(&members),
                    members,
                    resolution_source: ResolutionSource::AlphabeticalDefault,
                }
            })
            .collect();

        groups.sort_by(|a, b| a.members[0].sort_key().cmp(&b.members[0].sort_key()));

        for (index, group) in groups.iter().enumerate() {
            debug!(
                group = index + 1,
                members = ?group.member_names(),
                shared = group.shared_ids.len(),
                "Conflict group"
            );
        }
        if !groups.is_empty() {
            info!(
                groups = groups.len(),
                custom_airports = candidates.len(),
                "Detected airport conflicts"
            );
        }

        groups
    }
}

/// Identifiers claimed by at least two members.
fn shared_ids(members: &[PackDescriptor]) -> BTreeSet<AirportId> {
    let mut counts: HashMap<&AirportId, usize> = HashMap::new();
    for member in members {
        for id in &member.airport_ids {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n >= 2)
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::ContentLayout;

    fn pack(name: &str, tier: Tier, ids: &[&str]) -> PackDescriptor {
        PackDescriptor::new(format!("/cs/{}", name), ContentLayout::default())
            .with_tier(tier)
            .with_airports(ids.iter().copied())
    }

    fn custom(name: &str, ids: &[&str]) -> PackDescriptor {
        pack(name, Tier::CustomAirport, ids)
    }

    fn ids(list: &[&str]) -> BTreeSet<AirportId> {
        list.iter().map(|s| AirportId::new(*s)).collect()
    }

    #[test]
    fn test_three_way_ksea_conflict() {
        let groups = OverlapDetector::new().detect(&[
            custom("ZZZZ_Overlay_A", &["KSEA"]),
            custom("ZZZZ_Overlay_B", &["KSEA"]),
            custom("Generic_KSEA", &["KSEA"]),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].member_names(),
            vec!["Generic_KSEA", "ZZZZ_Overlay_A", "ZZZZ_Overlay_B"]
        );
        assert_eq!(groups[0].shared_ids, ids(&["KSEA"]));
        assert_eq!(groups[0].resolution_source, ResolutionSource::AlphabeticalDefault);
    }

    #[test]
    fn test_transitive_overlap_is_one_group() {
        let groups = OverlapDetector::new().detect(&[
            custom("A", &["KAAA", "KBBB"]),
            custom("B", &["KBBB", "KCCC"]),
            custom("C", &["KCCC", "KDDD"]),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 3);
        assert_eq!(groups[0].shared_ids, ids(&["KBBB", "KCCC"]));
    }

    #[test]
    fn test_disjoint_packs_have_no_group() {
        let groups = OverlapDetector::new().detect(&[
            custom("A", &["KAAA"]),
            custom("B", &["KBBB"]),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_only_custom_airports_considered() {
        let groups = OverlapDetector::new().detect(&[
            custom("A", &["KSEA"]),
            pack("Global Airports", Tier::GlobalAirport, &["KSEA"]),
            pack("X-Plane Airports", Tier::DefaultAirport, &["KSEA"]),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_groups_ordered_by_first_member() {
        let groups = OverlapDetector::new().detect(&[
            custom("Zulu_1", &["EGLL"]),
            custom("Zulu_2", &["EGLL"]),
            custom("alpha_1", &["KSEA"]),
            custom("Alpha_2", &["KSEA"]),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].member_names(), vec!["alpha_1", "Alpha_2"]);
        assert_eq!(groups[1].member_names(), vec!["Zulu_1", "Zulu_2"]);
    }

    #[test]
    fn test_membership_partitions() {
        let descriptors = vec![
            custom("A", &["K1"]),
            custom("B", &["K1", "K2"]),
            custom("C", &["K3"]),
            custom("D", &["K3"]),
            custom("E", &["K9"]),
        ];
        let groups = OverlapDetector::new().detect(&descriptors);

        for d in &descriptors {
            let count = groups.iter().filter(|g| g.contains(d)).count();
            assert!(count <= 1, "{} in {} groups", d.display_name, count);
        }
        assert_eq!(groups.iter().map(|g| g.members.len()).sum::<usize>(), 4);
    }
}

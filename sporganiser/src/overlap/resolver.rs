//! Conflict group ordering.
//!
//! Groups start in alphabetical order. A caller (usually the interactive
//! CLI) may supply a permutation per group; every permutation is validated
//! before any is applied.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::detector::ConflictGroup;

/// Where a group's member order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionSource {
    UserSupplied,
    AlphabeticalDefault,
}

/// Invalid conflict resolution input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("No conflict group {group} (there are {count})")]
    UnknownGroup { group: usize, count: usize },

    #[error("Group {group} has {expected} members but the order lists {got}")]
    WrongLength {
        group: usize,
        expected: usize,
        got: usize,
    },

    #[error("Group {group}: position {index} is out of range")]
    IndexOutOfRange { group: usize, index: usize },

    #[error("Group {group}: position {index} is listed twice")]
    DuplicateIndex { group: usize, index: usize },

    #[error("Invalid order '{0}', expected <group>=<i>,<j>,...")]
    Syntax(String),
}

/// Caller-supplied member orders, keyed by group index.
///
/// Indices are zero-based. The textual form accepted by [`FromStr`] and
/// [`ConflictResolutions::parse_arg`] is one-based, matching what users see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictResolutions {
    orders: BTreeMap<usize, Vec<usize>>,
}

impl ConflictResolutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the member order of a group (zero-based indices).
    pub fn set(&mut self, group: usize, order: Vec<usize>) {
        self.orders.insert(group, order);
    }

    pub fn get(&self, group: usize) -> Option<&[usize]> {
        self.orders.get(&group).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Parse one `<group>=<i>,<j>,...` argument (one-based) and add it.
    pub fn parse_arg(&mut self, arg: &str) -> Result<(), ResolutionError> {
        let (group, order) = parse_order(arg)?;
        self.set(group, order);
        Ok(())
    }

    /// Check every order against the detected groups.
    pub fn validate(&self, groups: &[ConflictGroup]) -> Result<(), ResolutionError> {
        for (&group, order) in &self.orders {
            let members = groups
                .get(group)
                .ok_or(ResolutionError::UnknownGroup {
                    group: group + 1,
                    count: groups.len(),
                })?
                .members
                .len();
            validate_permutation(group, order, members)?;
        }
        Ok(())
    }
}

impl FromStr for ConflictResolutions {
    type Err = ResolutionError;

    /// Parse whitespace- or `;`-separated `<group>=<i>,<j>,...` items.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut resolutions = Self::new();
        for item in s.split(|c: char| c == ';' || c.is_whitespace()) {
            if !item.is_empty() {
                resolutions.parse_arg(item)?;
            }
        }
        Ok(resolutions)
    }
}

/// Parse `<group>=<i>,<j>,...` (one-based) into zero-based indices.
fn parse_order(arg: &str) -> Result<(usize, Vec<usize>), ResolutionError> {
    let syntax = || ResolutionError::Syntax(arg.to_string());

    let (group, list) = arg.split_once('=').ok_or_else(syntax)?;
    let group = parse_one_based(group).ok_or_else(syntax)?;
    let order = list
        .split(',')
        .map(parse_one_based)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(syntax)?;

    Ok((group, order))
}

fn parse_one_based(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok()?.checked_sub(1)
}

fn validate_permutation(group: usize, order: &[usize], len: usize) -> Result<(), ResolutionError> {
    if order.len() != len {
        return Err(ResolutionError::WrongLength {
            group: group + 1,
            expected: len,
            got: order.len(),
        });
    }

    let mut seen = vec![false; len];
    for &index in order {
        let slot = seen.get_mut(index).ok_or(ResolutionError::IndexOutOfRange {
            group: group + 1,
            index: index + 1,
        })?;
        if *slot {
            return Err(ResolutionError::DuplicateIndex {
                group: group + 1,
                index: index + 1,
            });
        }
        *slot = true;
    }
    Ok(())
}

/// Apply caller orders to detected groups.
///
/// Groups without an entry keep their alphabetical order. Nothing is changed
/// unless every supplied order is valid.
pub fn resolve_groups(
    mut groups: Vec<ConflictGroup>,
    resolutions: &ConflictResolutions,
) -> Result<Vec<ConflictGroup>, ResolutionError> {
    resolutions.validate(&groups)?;

    for (index, group) in groups.iter_mut().enumerate() {
        if let Some(order) = resolutions.get(index) {
            group.members = order.iter().map(|&i| group.members[i].clone()).collect();
            group.resolution_source = ResolutionSource::UserSupplied;
            info!(
                group = index + 1,
                order = ?group.member_names(),
                "Applied user conflict order"
            );
        }
    }

    Ok(groups)
}

//! Custom airport overlap detection and resolution.
//!
//! Two CustomAirport packs conflict when they declare a common airport
//! identifier. Conflicts are transitive, so groups are the connected
//! components of the "shares an identifier" graph, computed with a
//! [`UnionFind`]. Each group is then ordered alphabetically or by a
//! caller-supplied permutation ([`ConflictResolutions`]).

mod detector;
mod resolver;
mod union_find;

pub use detector::{ConflictGroup, OverlapDetector};
pub use resolver::{resolve_groups, ConflictResolutions, ResolutionError, ResolutionSource};
pub use union_find::UnionFind;

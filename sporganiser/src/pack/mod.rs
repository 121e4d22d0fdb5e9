//! Scenery pack descriptors.
//!
//! A [`PackDescriptor`] is built once per directory found in X-Plane's
//! `Custom Scenery` folder. The [`DescriptorBuilder`] inspects the pack's
//! immediate structure; classification fields (`tier`, `airport_ids`) are
//! filled in later by the airport extractor and the tier classifier.
//!
//! # Layout
//!
//! ```text
//! Custom Scenery/
//! └── KSEA_Demo/                  # pack root (descriptor path)
//!     ├── Earth nav data/         # matched case-insensitively
//!     │   ├── apt.dat             # or apt.dat.gz
//!     │   └── +40-130/+47-123.dsf
//!     ├── objects/
//!     └── library.txt
//! ```
//!
//! A pack whose only entry is a near-identical copy of itself
//! (`KSEA_Demo/KSEA_Demo/...`) is flagged with
//! [`StructuralWarning::NestedDuplicate`] but keeps the outer path.

mod builder;
mod error;
mod types;

pub use builder::{DescriptorBuilder, AIRPORT_FILE, AIRPORT_FILE_GZ, EARTH_NAV_DATA};
pub use error::DescriptorBuildError;
pub use types::{AirportId, ContentLayout, PackDescriptor, StructuralWarning, Tier, TierHints};
pub(crate) use types::display_name_of;

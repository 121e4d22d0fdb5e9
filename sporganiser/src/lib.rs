//! SPOrganiser - Scenery pack ordering for X-Plane
//!
//! This library turns the unordered contents of X-Plane's `Custom Scenery`
//! folder into a strictly ordered, conflict-resolved `scenery_packs.ini`.
//!
//! # Pipeline
//!
//! ```text
//! Custom Scenery/*  ──► resolve ──► pack::DescriptorBuilder
//!                                        │
//!                                        ▼
//!                               airport::AirportExtractor  (cached)
//!                                        │
//!                                        ▼
//!                                classify::TierClassifier
//!                                        │          (parallel, per pack)
//! ───────────────────────────────────────┼──────────────────────────────
//!                                        ▼          (global barrier)
//!                                overlap::OverlapDetector
//!                                        │
//!                                        ▼
//!                           manifest::MergeEngine ──► ManifestWriter
//! ```
//!
//! [`organiser::Organiser`] wires these stages together; each stage is also
//! usable on its own.

pub mod airport;
pub mod classify;
pub mod config;
pub mod dsf;
pub mod logging;
pub mod manifest;
pub mod organiser;
pub mod overlap;
pub mod pack;
pub mod resolve;

/// Library version, used to invalidate persisted caches across releases.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! End-to-end pipeline over one X-Plane installation.
//!
//! [`Organiser::scan`] runs the per-pack phase (resolve, build, extract,
//! classify) on a bounded worker pool, then the overlap detector once over
//! the full set. The caller inspects the [`ScanOutcome`], supplies conflict
//! orderings and an unclassified policy, and calls
//! [`Organiser::finalize`] and [`Organiser::write`].

mod config;
mod error;
mod progress;
mod report;
mod runner;

pub use config::OrganiserConfig;
pub use error::{OrganiserError, OrganiserResult};
pub use progress::{ScanPhase, ScanProgress, ScanProgressCallback};
pub use report::{PackIssue, RunReport};
pub use runner::{Organiser, ScanOutcome};

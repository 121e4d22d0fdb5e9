//! Core pack types: tiers, airport identifiers, and the pack descriptor.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Ordering tier of a scenery pack.
///
/// Variants are declared highest priority first; the derived `Ord` is the
/// load order X-Plane must see. Every pack of an earlier tier precedes every
/// pack of a later tier in the written manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    CustomAirport,
    DefaultAirport,
    PrefabAirport,
    GlobalAirport,
    SceneryPlugin,
    SceneryLibrary,
    SimHeavenOverlay,
    CustomOverlay,
    DefaultOverlay,
    AutoOrthoOverlay,
    Orthophoto,
    AutoOrthoRegion,
    TerrainMesh,
}

impl Tier {
    /// All tiers in load order.
    pub const ALL: [Tier; 13] = [
        Tier::CustomAirport,
        Tier::DefaultAirport,
        Tier::PrefabAirport,
        Tier::GlobalAirport,
        Tier::SceneryPlugin,
        Tier::SceneryLibrary,
        Tier::SimHeavenOverlay,
        Tier::CustomOverlay,
        Tier::DefaultOverlay,
        Tier::AutoOrthoOverlay,
        Tier::Orthophoto,
        Tier::AutoOrthoRegion,
        Tier::TerrainMesh,
    ];

    /// Whether packs of this tier carry airport identifiers.
    pub fn is_airport(&self) -> bool {
        matches!(
            self,
            Tier::CustomAirport | Tier::DefaultAirport | Tier::PrefabAirport | Tier::GlobalAirport
        )
    }

    /// Human-readable tier label.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::CustomAirport => "Custom Airport",
            Tier::DefaultAirport => "Default Airport",
            Tier::PrefabAirport => "Prefab Airport",
            Tier::GlobalAirport => "Global Airport",
            Tier::SceneryPlugin => "Scenery Plugin",
            Tier::SceneryLibrary => "Scenery Library",
            Tier::SimHeavenOverlay => "SimHeaven Overlay",
            Tier::CustomOverlay => "Custom Overlay",
            Tier::DefaultOverlay => "Default Overlay",
            Tier::AutoOrthoOverlay => "AutoOrtho Overlay",
            Tier::Orthophoto => "Orthophoto",
            Tier::AutoOrthoRegion => "AutoOrtho Region",
            Tier::TerrainMesh => "Terrain Mesh",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An airport identifier as declared in an `apt.dat` header row.
///
/// Usually an ICAO code (`KSEA`), but X-Plane allows any token, so no
/// length or alphabet validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportId(String);

impl AirportId {
    /// Create an identifier from a raw token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AirportId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Detected structural anomaly of a pack root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuralWarning {
    /// The root's only entry is a near-identical copy of the root itself,
    /// typically from extracting an archive into a folder of the same name.
    NestedDuplicate {
        /// The inner directory holding the actual content.
        inner: PathBuf,
    },
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralWarning::NestedDuplicate { inner } => {
                write!(f, "folder-in-folder: content lives in {}", inner.display())
            }
        }
    }
}

/// Well-known entries found in a pack's content root.
///
/// Names are matched case-insensitively; stored paths keep the on-disk case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLayout {
    /// Directory whose entries were inspected. Equals the pack path unless
    /// a folder-in-folder was detected.
    pub content_root: PathBuf,

    /// `Earth nav data/` directory.
    pub earth_nav_data: Option<PathBuf>,

    /// `apt.dat` or `apt.dat.gz` inside `Earth nav data/`.
    pub airport_file: Option<PathBuf>,

    /// A `library.txt` file is present.
    pub has_library_txt: bool,

    /// A `plugins/` directory is present.
    pub has_plugins: bool,

    /// A `textures/` directory is present.
    pub has_textures: bool,

    /// A `terrain/` directory is present.
    pub has_terrain: bool,

    /// An `objects/` directory is present.
    pub has_objects: bool,
}

impl ContentLayout {
    /// Whether anything X-Plane loads was found.
    pub fn is_recognizable(&self) -> bool {
        self.earth_nav_data.is_some()
            || self.has_library_txt
            || self.has_plugins
            || self.has_textures
            || self.has_terrain
            || self.has_objects
    }

    /// Ortho4XP-style layout: textures and terrain side by side.
    pub fn has_ortho_layout(&self) -> bool {
        self.has_textures && self.has_terrain
    }
}

/// Classification hints derived from pack content and cached alongside
/// airport identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierHints {
    /// `Some(true)` if a DSF tile declares `sim/overlay 1`, `Some(false)` if
    /// a DSF tile was decoded without it, `None` if no tile was readable.
    pub dsf_overlay: Option<bool>,
}

/// Everything known about one scenery pack root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDescriptor {
    /// Canonical filesystem path of the pack root.
    pub path: PathBuf,

    /// Leaf directory name, used for listings and alphabetical tie-breaks.
    pub display_name: String,

    /// Ordering tier; `None` until classification succeeds.
    pub tier: Option<Tier>,

    /// Airport identifiers declared by the pack. Empty unless `tier` is an
    /// airport tier.
    pub airport_ids: BTreeSet<AirportId>,

    /// Whether the pack is written as `SCENERY_PACK` (vs `_DISABLED`).
    /// Defaults to true; the merge sets it from the prior manifest or the
    /// unclassified policy.
    pub enabled: bool,

    /// Set when no tier rule matched.
    pub classification_failed: bool,

    /// Detected structural anomaly, if any.
    pub structural_warning: Option<StructuralWarning>,

    /// Well-known entries found in the pack.
    pub content: ContentLayout,

    /// Content-derived classification hints.
    pub hints: TierHints,
}

impl PackDescriptor {
    /// Create an unclassified descriptor.
    pub fn new(path: impl Into<PathBuf>, content: ContentLayout) -> Self {
        let path = path.into();
        let display_name = display_name_of(&path);
        Self {
            path,
            display_name,
            tier: None,
            airport_ids: BTreeSet::new(),
            enabled: true,
            classification_failed: false,
            structural_warning: None,
            content,
            hints: TierHints::default(),
        }
    }

    /// Set the tier (builder style, mostly for tests and fixtures).
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Add airport identifiers (builder style).
    pub fn with_airports<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.airport_ids.extend(ids.into_iter().map(AirportId::new));
        self
    }

    /// Alphabetical ordering key: case-insensitive name, then exact name,
    /// then path so that equal names still order deterministically.
    pub fn sort_key(&self) -> (String, &str, &Path) {
        (
            self.display_name.to_lowercase(),
            self.display_name.as_str(),
            self.path.as_path(),
        )
    }
}

/// Leaf name of a path, falling back to the full path for roots.
pub(crate) fn display_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

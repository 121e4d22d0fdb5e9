//! Integration tests for the organiser pipeline.
//!
//! Each test builds a synthetic X-Plane install in a temp directory and runs
//! scan → finalize → write end to end.
//!
//! Run with: `cargo test --test organiser_integration`

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use sporganiser::manifest::{
    MergeOptions, UnclassifiedPolicy, CUSTOM_SCENERY_DIR, MANIFEST_FILE, UNSORTED_FILE,
};
use sporganiser::organiser::{Organiser, OrganiserConfig, ScanOutcome};
use sporganiser::overlap::{ConflictResolutions, ResolutionSource};
use sporganiser::pack::{StructuralWarning, Tier};

// ============================================================================
// Helper Functions
// ============================================================================

struct Install {
    _temp: TempDir,
    root: PathBuf,
    scenery: PathBuf,
}

impl Install {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let scenery = root.join(CUSTOM_SCENERY_DIR);
        fs::create_dir_all(&scenery).unwrap();
        Self {
            _temp: temp,
            root,
            scenery,
        }
    }

    fn airport(&self, name: &str, ids: &[&str]) -> &Self {
        write_apt(&self.scenery.join(name), ids);
        self
    }

    fn library(&self, name: &str) -> &Self {
        let root = self.scenery.join(name);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("library.txt"), "A\n800\nLIBRARY\n").unwrap();
        self
    }

    fn ortho(&self, name: &str) -> &Self {
        let root = self.scenery.join(name);
        fs::create_dir_all(root.join("textures")).unwrap();
        fs::create_dir_all(root.join("terrain")).unwrap();
        fs::create_dir_all(root.join("Earth nav data")).unwrap();
        self
    }

    fn plain(&self, name: &str, subdir: &str) -> &Self {
        fs::create_dir_all(self.scenery.join(name).join(subdir)).unwrap();
        self
    }

    fn prior(&self, text: &str) -> &Self {
        fs::write(self.scenery.join(MANIFEST_FILE), text).unwrap();
        self
    }

    fn organiser(&self) -> Organiser {
        Organiser::new(OrganiserConfig::new(&self.root).with_workers(4))
    }

    fn manifest(&self) -> String {
        fs::read_to_string(self.scenery.join(MANIFEST_FILE)).unwrap()
    }

    fn run(&self, resolutions: &ConflictResolutions, options: &MergeOptions) -> String {
        let organiser = self.organiser();
        let outcome = organiser.scan().unwrap();
        let manifest = organiser.finalize(&outcome, resolutions, options).unwrap();
        organiser.write(&manifest).unwrap();
        self.manifest()
    }
}

fn write_apt(root: &Path, ids: &[&str]) {
    let end = root.join("Earth nav data");
    fs::create_dir_all(&end).unwrap();
    let mut text = String::from("I\n1100 Generated by WorldEditor\n\n");
    for id in ids {
        text.push_str(&format!("1 433 0 0 {} Test Airport\n", id));
        text.push_str("100 45.72 1 0 0.25 0 2 1 16L 47.46 -122.31\n");
    }
    text.push_str("99\n");
    fs::write(end.join("apt.dat"), text).unwrap();
}

fn disable() -> MergeOptions {
    MergeOptions::new(UnclassifiedPolicy::Disable)
}

fn pack_lines(manifest: &str) -> Vec<&str> {
    manifest
        .lines()
        .filter(|l| l.starts_with("SCENERY_PACK"))
        .collect()
}

fn tier_of(outcome: &ScanOutcome, name: &str) -> Option<Tier> {
    outcome
        .descriptors
        .iter()
        .find(|d| d.display_name == name)
        .and_then(|d| d.tier)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_overlapping_airports_default_to_alphabetical() {
    let install = Install::new();
    install
        .airport("ZZZZ_Overlay_A", &["KSEA"])
        .airport("ZZZZ_Overlay_B", &["KSEA"])
        .airport("Generic_KSEA", &["KSEA"]);

    let outcome = install.organiser().scan().unwrap();
    assert_eq!(outcome.conflict_groups.len(), 1);
    assert_eq!(
        outcome.conflict_groups[0].member_names(),
        vec!["Generic_KSEA", "ZZZZ_Overlay_A", "ZZZZ_Overlay_B"]
    );

    let text = install.run(&ConflictResolutions::new(), &disable());
    assert_eq!(
        pack_lines(&text),
        vec![
            "SCENERY_PACK Custom Scenery/Generic_KSEA/",
            "SCENERY_PACK Custom Scenery/ZZZZ_Overlay_A/",
            "SCENERY_PACK Custom Scenery/ZZZZ_Overlay_B/",
        ]
    );
}

#[test]
fn test_user_ordering_is_applied() {
    let install = Install::new();
    install
        .airport("ZZZZ_Overlay_A", &["KSEA"])
        .airport("ZZZZ_Overlay_B", &["KSEA"])
        .airport("Generic_KSEA", &["KSEA"])
        .airport("Aaa_EGLL", &["EGLL"]);

    let resolutions: ConflictResolutions = "1=3,1,2".parse().unwrap();

    let organiser = install.organiser();
    let outcome = organiser.scan().unwrap();
    let manifest = organiser
        .finalize(&outcome, &resolutions, &disable())
        .unwrap();
    let names: Vec<&str> = manifest.entries().iter().map(|e| e.label()).collect();
    assert_eq!(
        names,
        vec!["Aaa_EGLL", "ZZZZ_Overlay_B", "Generic_KSEA", "ZZZZ_Overlay_A"]
    );

    let groups = sporganiser::overlap::resolve_groups(outcome.conflict_groups, &resolutions)
        .unwrap();
    assert_eq!(groups[0].resolution_source, ResolutionSource::UserSupplied);
}

#[test]
fn test_mesh_named_pack_without_airports_is_mesh() {
    let install = Install::new();
    install.plain("zzz_HD_Mesh_v4_Europe", "Earth nav data");
    // An empty airport file under a mesh-named pack
    fs::write(
        install
            .scenery
            .join("zzz_HD_Mesh_v4_Europe/Earth nav data/apt.dat"),
        "I\n1100 Version\n\n99\n",
    )
    .unwrap();

    let outcome = install.organiser().scan().unwrap();
    assert_eq!(
        tier_of(&outcome, "zzz_HD_Mesh_v4_Europe"),
        Some(Tier::TerrainMesh)
    );
}

#[test]
fn test_folder_in_folder_keeps_outer_path() {
    let install = Install::new();
    let outer = install.scenery.join("KBOS_Boston");
    write_apt(&outer.join("KBOS_Boston"), &["KBOS"]);

    let outcome = install.organiser().scan().unwrap();
    let descriptor = &outcome.descriptors[0];

    assert_eq!(descriptor.path, fs::canonicalize(&outer).unwrap());
    assert!(matches!(
        descriptor.structural_warning,
        Some(StructuralWarning::NestedDuplicate { .. })
    ));
    assert_eq!(descriptor.tier, Some(Tier::CustomAirport));
    assert_eq!(outcome.report.structural_warnings.len(), 1);

    let text = install.run(&ConflictResolutions::new(), &disable());
    assert_eq!(
        pack_lines(&text),
        vec!["SCENERY_PACK Custom Scenery/KBOS_Boston/"]
    );
}

#[test]
fn test_five_packs_three_tiers_empty_prior() {
    let install = Install::new();
    install
        .airport("KSEA_Airport", &["KSEA"])
        .airport("EGLL_Airport", &["EGLL"])
        .library("OpenSceneryX")
        .library("R2_Library")
        .ortho("zOrtho4XP_+47-123");

    let text = install.run(&ConflictResolutions::new(), &disable());
    assert_eq!(
        text,
        "I\n1000 Version\nSCENERY\n\n\
         SCENERY_PACK Custom Scenery/EGLL_Airport/\n\
         SCENERY_PACK Custom Scenery/KSEA_Airport/\n\
         SCENERY_PACK Custom Scenery/OpenSceneryX/\n\
         SCENERY_PACK Custom Scenery/R2_Library/\n\
         SCENERY_PACK Custom Scenery/zOrtho4XP_+47-123/\n"
    );
}

#[test]
fn test_prior_flags_carry_over_and_rerun_is_identical() {
    let install = Install::new();
    install
        .airport("KSEA_Airport", &["KSEA"])
        .library("OpenSceneryX")
        .prior(
            "I\n1000 Version\nSCENERY\n\n\
             SCENERY_PACK_DISABLED Custom Scenery/OpenSceneryX/\n\
             SCENERY_PACK Custom Scenery/KSEA_Airport/\n",
        );

    let first = install.run(&ConflictResolutions::new(), &disable());
    assert_eq!(
        pack_lines(&first),
        vec![
            "SCENERY_PACK Custom Scenery/KSEA_Airport/",
            "SCENERY_PACK_DISABLED Custom Scenery/OpenSceneryX/",
        ]
    );

    let second = install.run(&ConflictResolutions::new(), &disable());
    assert_eq!(first, second);
}

#[test]
fn test_unclassified_packs_disabled_and_listed() {
    let install = Install::new();
    install
        .library("OpenSceneryX")
        .plain("Mystery_Folder", "objects");

    let text = install.run(&ConflictResolutions::new(), &disable());
    assert_eq!(
        pack_lines(&text),
        vec![
            "SCENERY_PACK Custom Scenery/OpenSceneryX/",
            "SCENERY_PACK_DISABLED Custom Scenery/Mystery_Folder/",
        ]
    );

    let unsorted = fs::read_to_string(install.scenery.join(UNSORTED_FILE)).unwrap();
    assert_eq!(
        pack_lines(&unsorted),
        vec!["SCENERY_PACK_DISABLED Custom Scenery/Mystery_Folder/"]
    );
}

#[test]
fn test_policy_disabled_pack_is_enabled_when_policy_changes() {
    let install = Install::new();
    install.plain("Mystery_Folder", "objects");

    install.run(&ConflictResolutions::new(), &disable());
    let text = install.run(
        &ConflictResolutions::new(),
        &MergeOptions::new(UnclassifiedPolicy::IncludeEnabled),
    );
    assert_eq!(
        pack_lines(&text),
        vec!["SCENERY_PACK Custom Scenery/Mystery_Folder/"]
    );
}

#[test]
fn test_global_airports_placeholder_and_vendor_quirks() {
    let install = Install::new();
    install
        .ortho("yAutoOrtho_Overlays")
        .ortho("z_ao_eur")
        .plain("simHeaven_X-World_Europe-1-vfr", "objects")
        .airport("KSEA_Airport", &["KSEA"]);

    let outcome = install.organiser().scan().unwrap();
    assert_eq!(
        tier_of(&outcome, "yAutoOrtho_Overlays"),
        Some(Tier::AutoOrthoOverlay)
    );
    assert_eq!(tier_of(&outcome, "z_ao_eur"), Some(Tier::AutoOrthoRegion));
    assert_eq!(
        tier_of(&outcome, "simHeaven_X-World_Europe-1-vfr"),
        Some(Tier::SimHeavenOverlay)
    );

    let options = disable().with_global_airports_placeholder(true);
    let text = install.run(&ConflictResolutions::new(), &options);
    assert_eq!(
        pack_lines(&text),
        vec![
            "SCENERY_PACK Custom Scenery/KSEA_Airport/",
            "SCENERY_PACK *GLOBAL_AIRPORTS*",
            "SCENERY_PACK Custom Scenery/simHeaven_X-World_Europe-1-vfr/",
            "SCENERY_PACK Custom Scenery/yAutoOrtho_Overlays/",
            "SCENERY_PACK Custom Scenery/z_ao_eur/",
        ]
    );
}

#[test]
fn test_rewrite_keeps_single_backup() {
    let install = Install::new();
    install.library("OpenSceneryX").prior("I\n1000 Version\nSCENERY\n\n");

    install.run(&ConflictResolutions::new(), &disable());
    install.run(&ConflictResolutions::new(), &disable());

    let backups: Vec<_> = fs::read_dir(&install.scenery)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlinked_pack_outside_scenery_is_absolute() {
    let install = Install::new();
    let external = install.root.join("external").join("LFPG_Paris");
    write_apt(&external, &["LFPG"]);
    std::os::unix::fs::symlink(&external, install.scenery.join("LFPG_Paris")).unwrap();

    let text = install.run(&ConflictResolutions::new(), &disable());
    let expected = format!(
        "SCENERY_PACK {}/",
        fs::canonicalize(&external).unwrap().display()
    );
    assert_eq!(pack_lines(&text), vec![expected.as_str()]);
}

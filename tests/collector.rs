//! End-to-end collector tests against a simulated sysfs block tree.

use mdraid_telemetry::{ArrayStats, MdraidCollector};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn make_device(base: &Path, device: &str) -> PathBuf {
    let dir = base.join(device);
    fs::create_dir_all(dir.join("md")).expect("create device dirs");
    dir
}

fn write_attr(dir: &Path, name: &str, value: &str) {
    fs::write(dir.join(name), format!("{value}\n")).expect("write attribute file");
}

#[test]
fn discovery_lists_each_matching_device_once() {
    let tmp = TempDir::new().expect("tempdir");
    for name in ["md0", "md1", "md10", "mdx", "raid0", "loop0"] {
        fs::create_dir(tmp.path().join(name)).expect("create dir");
    }

    let collector = MdraidCollector::new(tmp.path());
    let discovered = collector.discover().expect("discovery should succeed");

    let mut names: Vec<&str> = discovered.iter().map(|d| d.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["md0", "md1", "md10"]);
}

#[test]
fn stats_round_trip_of_known_values() {
    // Scenario: md0 carries capability=0, size=1048576 at the array level
    // and level=raid1, array_state=clean, raid_disks=2 under md/. Every
    // unset attribute must come back as its zero value.
    let tmp = TempDir::new().expect("tempdir");
    let dir = make_device(tmp.path(), "md0");
    write_attr(&dir, "capability", "0");
    write_attr(&dir, "size", "1048576");
    let md_dir = dir.join("md");
    write_attr(&md_dir, "level", "raid1");
    write_attr(&md_dir, "array_state", "clean");
    write_attr(&md_dir, "raid_disks", "2");

    let collector = MdraidCollector::new(tmp.path());
    let stats = collector
        .stats("md0")
        .expect("stats should succeed")
        .expect("md0 is present");

    let json: serde_json::Value =
        serde_json::from_str(&stats.to_json().expect("serialize")).expect("valid json");

    assert_eq!(json["Capability"], 0);
    assert_eq!(json["Size"], 1048576);
    assert_eq!(json["MD"]["Level"], "raid1");
    assert_eq!(json["MD"]["ArrayState"], "clean");
    assert_eq!(json["MD"]["RaidDisks"], 2);

    // Unset fields serialize as their type's zero value.
    assert_eq!(json["Dev"], "");
    assert_eq!(json["DiscardAlignment"], 0);
    assert_eq!(json["ExtRange"], 0);
    assert_eq!(json["Range"], 0);
    assert_eq!(json["Removable"], 0);
    assert_eq!(json["RO"], 0);
    assert_eq!(json["MD"]["Degraded"], 0);
    assert_eq!(json["MD"]["MaxReadErrors"], 0);
    assert_eq!(json["MD"]["MetadataVersion"], "");
    assert_eq!(json["MD"]["MismatchCnt"], 0);
    assert_eq!(json["MD"]["PrereadBypassThreshold"], 0);
    assert_eq!(json["MD"]["SyncAction"], "");
}

#[test]
fn stats_record_survives_json_round_trip() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = make_device(tmp.path(), "md2");
    write_attr(&dir, "ro", "1");
    write_attr(&dir, "dev", "9:2");
    let md_dir = dir.join("md");
    write_attr(&md_dir, "sync_action", "idle");
    write_attr(&md_dir, "degraded", "1");

    let collector = MdraidCollector::new(tmp.path());
    let stats = collector
        .stats("md2")
        .expect("stats should succeed")
        .expect("md2 is present");

    let decoded: ArrayStats =
        serde_json::from_str(&stats.to_json().expect("serialize")).expect("deserialize");
    assert_eq!(decoded, stats);
    assert_eq!(decoded.ro, 1);
    assert_eq!(decoded.dev, "9:2");
    assert_eq!(decoded.md.sync_action, "idle");
    assert_eq!(decoded.md.degraded, 1);
}

#[test]
fn unknown_device_yields_no_record() {
    let tmp = TempDir::new().expect("tempdir");
    make_device(tmp.path(), "md0");

    let collector = MdraidCollector::new(tmp.path());
    assert!(collector
        .stats("md42")
        .expect("lookup should succeed")
        .is_none());
}

#[test]
fn empty_base_dir_discovers_nothing() {
    let tmp = TempDir::new().expect("tempdir");

    let collector = MdraidCollector::new(tmp.path());
    let discovered = collector.discover().expect("discovery should succeed");
    assert!(discovered.is_empty());
    assert_eq!(
        serde_json::to_string(&discovered).expect("serialize"),
        "[]"
    );
}

//! md array discovery and attribute collection from /sys/block.
//!
//! Each md array shows up as `/sys/block/md<N>` with scalar attribute files
//! at the device level (`size`, `ro`, ...) and one directory deeper under
//! `md/` (`level`, `array_state`, ...). Attribute files hold a single line;
//! surrounding whitespace is insignificant.
//!
//! Records are built fresh per query. An attribute file that is absent from
//! the directory listing leaves its field at the zero value; any read or
//! parse failure aborts the whole device query.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default base directory for block device attribute trees.
pub const DEFAULT_SYS_BLOCK: &str = "/sys/block";

/// Errors that can occur while enumerating or reading md devices.
#[derive(Error, Debug)]
pub enum MdraidError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected integer in {}, found {value:?}: {source}", path.display())]
    Parse {
        path: PathBuf,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

impl MdraidError {
    fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One discovered md device, serialized in the monitoring system's
/// low-level-discovery key format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    #[serde(rename = "{#MD.NAME}")]
    pub name: String,
}

/// Array-level attributes of one md device, plus the embedded md-level
/// block. JSON field names match the monitoring template keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArrayStats {
    /// `capability`
    pub capability: i64,
    /// `dev` (major:minor identifier)
    pub dev: String,
    /// `discard_alignment`
    pub discard_alignment: i64,
    /// `ext_range`
    pub ext_range: i64,
    /// `range`
    pub range: i64,
    /// `removable`
    pub removable: i64,
    /// `ro`
    #[serde(rename = "RO")]
    pub ro: i64,
    /// `size` (in 512-byte sectors)
    pub size: i64,
    /// Attributes read from the nested `md/` directory.
    #[serde(rename = "MD")]
    pub md: MdStats,
}

/// Attributes read from a device's nested `md/` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MdStats {
    /// `level` (e.g. "raid1")
    pub level: String,
    /// `array_state` (e.g. "clean", "degraded")
    pub array_state: String,
    /// `degraded`
    pub degraded: i64,
    /// `max_read_errors`
    pub max_read_errors: i64,
    /// `metadata_version`
    pub metadata_version: String,
    /// `mismatch_cnt`
    pub mismatch_cnt: i64,
    /// `preread_bypass_threshold`
    pub preread_bypass_threshold: i64,
    /// `raid_disks`
    pub raid_disks: i64,
    /// `sync_action` (e.g. "idle", "resync")
    pub sync_action: String,
}

/// Destination for one attribute value, tagging the expected content kind.
enum Slot<'a> {
    Str(&'a mut String),
    Int(&'a mut i64),
}

impl ArrayStats {
    /// Filename-to-field table for the device-level attribute directory.
    fn attr_table(&mut self) -> [(&'static str, Slot<'_>); 8] {
        [
            ("capability", Slot::Int(&mut self.capability)),
            ("dev", Slot::Str(&mut self.dev)),
            ("discard_alignment", Slot::Int(&mut self.discard_alignment)),
            ("ext_range", Slot::Int(&mut self.ext_range)),
            ("range", Slot::Int(&mut self.range)),
            ("removable", Slot::Int(&mut self.removable)),
            ("ro", Slot::Int(&mut self.ro)),
            ("size", Slot::Int(&mut self.size)),
        ]
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl MdStats {
    /// Filename-to-field table for the nested `md/` attribute directory.
    fn attr_table(&mut self) -> [(&'static str, Slot<'_>); 9] {
        [
            ("level", Slot::Str(&mut self.level)),
            ("array_state", Slot::Str(&mut self.array_state)),
            ("degraded", Slot::Int(&mut self.degraded)),
            ("max_read_errors", Slot::Int(&mut self.max_read_errors)),
            ("metadata_version", Slot::Str(&mut self.metadata_version)),
            ("mismatch_cnt", Slot::Int(&mut self.mismatch_cnt)),
            (
                "preread_bypass_threshold",
                Slot::Int(&mut self.preread_bypass_threshold),
            ),
            ("raid_disks", Slot::Int(&mut self.raid_disks)),
            ("sync_action", Slot::Str(&mut self.sync_action)),
        ]
    }
}

/// Reads md device names and attributes from a sysfs-style block tree.
#[derive(Debug, Clone)]
pub struct MdraidCollector {
    sys_path: PathBuf,
}

impl Default for MdraidCollector {
    fn default() -> Self {
        Self::new(DEFAULT_SYS_BLOCK)
    }
}

impl MdraidCollector {
    /// Create a collector rooted at `sys_path` (normally [`DEFAULT_SYS_BLOCK`],
    /// overridable for testing).
    pub fn new(sys_path: impl Into<PathBuf>) -> Self {
        Self {
            sys_path: sys_path.into(),
        }
    }

    /// The base directory this collector reads from.
    pub fn sys_path(&self) -> &Path {
        &self.sys_path
    }

    /// List md device names under the base directory, in filesystem
    /// enumeration order.
    ///
    /// A name matches when it starts with `md` followed by at least one
    /// ASCII digit (`md0`, `md127`; not `mdx`). Failure to list the base
    /// directory is the only error.
    pub fn devices(&self) -> Result<Vec<String>, MdraidError> {
        let entries =
            fs::read_dir(&self.sys_path).map_err(|e| MdraidError::read(&self.sys_path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MdraidError::read(&self.sys_path, e))?;
            if let Some(name) = entry.file_name().to_str() {
                if is_md_device(name) {
                    names.push(name.to_string());
                }
            }
        }

        debug!(count = names.len(), path = %self.sys_path.display(), "enumerated md devices");
        Ok(names)
    }

    /// List md devices in the monitoring system's discovery format.
    pub fn discover(&self) -> Result<Vec<DiscoveredDevice>, MdraidError> {
        Ok(self
            .devices()?
            .into_iter()
            .map(|name| DiscoveredDevice { name })
            .collect())
    }

    /// Read the merged array-level and md-level attributes for `name`.
    ///
    /// Returns `Ok(None)` when `name` is not among the enumerated devices;
    /// the caller decides whether that warrants output. Any read or parse
    /// failure below an enumerated device is an error.
    pub fn stats(&self, name: &str) -> Result<Option<ArrayStats>, MdraidError> {
        if !self.devices()?.iter().any(|d| d == name) {
            debug!(device = name, "device not present, skipping");
            return Ok(None);
        }

        let dir = self.sys_path.join(name);
        let mut stats = ArrayStats::default();
        scan_attr_dir(&dir, &mut stats.attr_table())?;
        scan_attr_dir(&dir.join("md"), &mut stats.md.attr_table())?;
        Ok(Some(stats))
    }
}

/// True when `name` looks like an md array device (`md` + digits prefix).
fn is_md_device(name: &str) -> bool {
    name.strip_prefix("md")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Populate `table` fields from the attribute files present in `dir`.
///
/// Directory entries without a table row are ignored; table rows without a
/// directory entry keep their current (zero) value. Each matched file is
/// read fully, trimmed, and stored as-is or parsed as a signed base-10
/// 64-bit integer according to its slot.
fn scan_attr_dir(dir: &Path, table: &mut [(&'static str, Slot<'_>)]) -> Result<(), MdraidError> {
    let entries = fs::read_dir(dir).map_err(|e| MdraidError::read(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| MdraidError::read(dir, e))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some((_, slot)) = table.iter_mut().find(|(attr, _)| *attr == name) else {
            continue;
        };

        let path = entry.path();
        let raw = fs::read_to_string(&path).map_err(|e| MdraidError::read(&path, e))?;
        let value = raw.trim();

        match slot {
            Slot::Str(dst) => **dst = value.to_string(),
            Slot::Int(dst) => {
                **dst = value.parse().map_err(|source| MdraidError::Parse {
                    path,
                    value: value.to_string(),
                    source,
                })?;
            }
        }
    }

    Ok(())
}

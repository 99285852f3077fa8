//! Partition metadata and sidecar parsing

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata describing one tick partition file
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMeta {
    /// Path of the partition file
    pub file_path: PathBuf,
    /// Trading day parsed from the partition path
    pub trading_day: String,
    /// Instrument parsed from the partition path
    pub instrument_id: String,
    /// Smallest tick timestamp in the partition (0 = unknown)
    pub min_ts_ns: i64,
    /// Largest tick timestamp in the partition (0 = unknown)
    pub max_ts_ns: i64,
    /// Number of rows in the partition (0 = unknown)
    pub row_count: u64,
}

impl PartitionMeta {
    /// Whether the partition's time bounds intersect `[start_ns, end_ns]`.
    ///
    /// Partitions with both bounds zero have an unknown range and are
    /// always considered overlapping.
    #[must_use]
    pub fn overlaps(&self, start_ns: i64, end_ns: i64) -> bool {
        if self.min_ts_ns == 0 && self.max_ts_ns == 0 {
            return true;
        }
        self.max_ts_ns >= start_ns && self.min_ts_ns <= end_ns
    }

    /// Path of a sidecar derived by appending `suffix` to the file path
    #[must_use]
    pub fn sidecar_path(&self, suffix: &str) -> PathBuf {
        let mut os: OsString = self.file_path.clone().into_os_string();
        os.push(suffix);
        PathBuf::from(os)
    }
}

/// Extract the value of a `key=value` path segment, if it carries `key`
pub(crate) fn partition_key_value<'a>(segment: &'a str, key: &str) -> Option<&'a str> {
    let (seg_key, value) = segment.split_once('=')?;
    if seg_key == key && !value.is_empty() {
        Some(value)
    } else {
        None
    }
}

/// Fold the `.meta` sidecar into `meta`; malformed lines are skipped
pub(crate) fn read_sidecar_meta(path: &Path, meta: &mut PartitionMeta) {
    let Ok(text) = fs::read_to_string(path) else {
        return;
    };
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "min_ts_ns" => {
                if let Ok(parsed) = value.trim().parse() {
                    meta.min_ts_ns = parsed;
                }
            }
            "max_ts_ns" => {
                if let Ok(parsed) = value.trim().parse() {
                    meta.max_ts_ns = parsed;
                }
            }
            "row_count" => {
                if let Ok(parsed) = value.trim().parse() {
                    meta.row_count = parsed;
                }
            }
            other => debug!(key = other, "ignoring unknown sidecar meta key"),
        }
    }
}

/// Sort partitions by `(min_ts_ns, file_path)`
pub(crate) fn sort_partitions(partitions: &mut [PartitionMeta]) {
    partitions.sort_by(|left, right| {
        left.min_ts_ns
            .cmp(&right.min_ts_ns)
            .then_with(|| left.file_path.cmp(&right.file_path))
    });
}

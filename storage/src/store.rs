//! Partition registry with pruning and ordered tick materialization

use crate::partition::{self, PartitionMeta};
use crate::reader::{ColumnarReader, PartitionReader, SidecarCsvReader};
use common::{Tick, Ts};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Registry of tick partitions under a root directory
#[derive(Debug, Default)]
pub struct PartitionedTickStore {
    root: PathBuf,
    partitions: Vec<PartitionMeta>,
}

impl PartitionedTickStore {
    /// Create a store over `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            partitions: Vec::new(),
        }
    }

    /// Point the store at a different root directory
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Number of registered partitions
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Register a partition. Refuses (returns `false`) an empty file path
    /// or inverted time bounds.
    pub fn register(&mut self, meta: PartitionMeta) -> bool {
        if meta.file_path.as_os_str().is_empty() {
            warn!("refusing partition with empty file path");
            return false;
        }
        if meta.min_ts_ns > 0 && meta.max_ts_ns > 0 && meta.min_ts_ns > meta.max_ts_ns {
            warn!(
                file = %meta.file_path.display(),
                min_ts_ns = meta.min_ts_ns,
                max_ts_ns = meta.max_ts_ns,
                "refusing partition with inverted time bounds"
            );
            return false;
        }
        self.partitions.push(meta);
        true
    }

    /// Scan `root` recursively for `*.parquet` partitions, parsing
    /// `trading_day=`/`instrument_id=` path segments and the `.meta`
    /// sidecar. Returns partitions sorted by `(min_ts_ns, file_path)`.
    #[must_use]
    pub fn discover(&self, root: &Path) -> Vec<PartitionMeta> {
        let mut found = Vec::new();
        if root.as_os_str().is_empty() || !root.exists() {
            return found;
        }
        walk(root, &mut found);
        partition::sort_partitions(&mut found);
        info!(
            root = %root.display(),
            partitions = found.len(),
            "discovered tick partitions"
        );
        found
    }

    /// Registered partitions intersecting `[start, end]`, optionally
    /// filtered by instrument; sorted by `(min_ts_ns, file_path)`.
    #[must_use]
    pub fn query(&self, start: Ts, end: Ts, instrument: Option<&str>) -> Vec<PartitionMeta> {
        let mut filtered = Vec::new();
        if start > end {
            return filtered;
        }
        for meta in &self.partitions {
            if let Some(wanted) = instrument {
                if meta.instrument_id != wanted {
                    continue;
                }
            }
            if !meta.overlaps(start.as_nanos(), end.as_nanos()) {
                continue;
            }
            filtered.push(meta.clone());
        }
        partition::sort_partitions(&mut filtered);
        filtered
    }

    /// Materialize the ticks of every matching partition, ascending by
    /// `ts_ns` (stable across partitions). With no registered partitions
    /// the root directory is discovered first. An unreadable partition is
    /// skipped; `start > end` yields nothing.
    #[must_use]
    pub fn load_ticks(&self, symbol: Option<&str>, start: Ts, end: Ts) -> Vec<Tick> {
        let mut ticks = Vec::new();
        if start > end {
            return ticks;
        }

        let source = if self.partitions.is_empty() {
            self.discover(&self.root)
        } else {
            self.partitions.clone()
        };

        let readers: [&dyn PartitionReader; 2] = [&ColumnarReader, &SidecarCsvReader];
        for meta in &source {
            if let Some(wanted) = symbol {
                if meta.instrument_id != wanted {
                    continue;
                }
            }
            if !meta.overlaps(start.as_nanos(), end.as_nanos()) {
                continue;
            }

            let mut loaded = false;
            for reader in readers {
                match reader.read(meta, start.as_nanos(), end.as_nanos()) {
                    Ok(mut rows) => {
                        debug!(
                            file = %meta.file_path.display(),
                            rows = rows.len(),
                            "loaded partition"
                        );
                        ticks.append(&mut rows);
                        loaded = true;
                        break;
                    }
                    Err(error) => {
                        debug!(
                            file = %meta.file_path.display(),
                            %error,
                            "partition reader failed"
                        );
                    }
                }
            }
            if !loaded {
                warn!(file = %meta.file_path.display(), "skipping unreadable partition");
            }
        }

        ticks.sort_by_key(|tick| tick.ts_ns);
        ticks
    }
}

fn walk(dir: &Path, found: &mut Vec<PartitionMeta>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found);
            continue;
        }
        if path.extension().is_none_or(|extension| extension != "parquet") {
            continue;
        }

        let mut meta = PartitionMeta {
            file_path: path.clone(),
            ..PartitionMeta::default()
        };
        for segment in path.iter().filter_map(|part| part.to_str()) {
            if let Some(day) = partition::partition_key_value(segment, "trading_day") {
                meta.trading_day = day.to_string();
            }
            if let Some(instrument) = partition::partition_key_value(segment, "instrument_id") {
                meta.instrument_id = instrument.to_string();
            }
        }
        partition::read_sidecar_meta(&meta.sidecar_path(".meta"), &mut meta);
        found.push(meta);
    }
}

//! Partitioned columnar tick store with time-window pruning
//!
//! Partitions are parquet files filed under `key=value` path segments
//! (`source`, `trading_day`, `instrument_id`), annotated by optional
//! `.meta` and `.ticks.csv` sidecars. The store registers or discovers
//! partition metadata, prunes by time window and instrument, and
//! materializes ticks in ascending timestamp order.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod partition;
pub mod reader;
pub mod store;

pub use partition::PartitionMeta;
pub use store::PartitionedTickStore;

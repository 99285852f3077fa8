//! Per-partition tick readers
//!
//! Two implementations sit behind [`PartitionReader`]: a columnar reader
//! over the parquet file itself (compiled in with the `parquet` feature)
//! and a fallback over the `.ticks.csv` sidecar. The store tries them in
//! that order and keeps the first that succeeds.

use crate::partition::PartitionMeta;
use anyhow::Result;
use common::Tick;

/// Reads the ticks of one partition intersecting a closed time window
pub trait PartitionReader {
    /// Materialize rows with `start_ns <= ts_ns <= end_ns`; rows that fail
    /// to parse are dropped silently, a failure to read the partition at
    /// all is an error
    fn read(&self, partition: &PartitionMeta, start_ns: i64, end_ns: i64) -> Result<Vec<Tick>>;
}

/// Columnar reader over the partition's parquet file
#[derive(Debug, Default)]
pub struct ColumnarReader;

/// Fallback reader over the `.ticks.csv` sidecar
#[derive(Debug, Default)]
pub struct SidecarCsvReader;

#[cfg(feature = "parquet")]
impl PartitionReader for ColumnarReader {
    fn read(&self, partition: &PartitionMeta, start_ns: i64, end_ns: i64) -> Result<Vec<Tick>> {
        use anyhow::bail;
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = std::fs::File::open(&partition.file_path)?;
        let reader = SerializedFileReader::new(file)?;

        let schema = reader.metadata().file_metadata().schema();
        if !schema.get_fields().iter().any(|field| field.name() == "ts_ns") {
            bail!(
                "partition {} has no ts_ns column",
                partition.file_path.display()
            );
        }

        let mut ticks = Vec::new();
        for row in reader.get_row_iter(None)? {
            let Ok(row) = row else { continue };
            let mut tick = Tick {
                symbol: partition.instrument_id.clone(),
                ..Tick::default()
            };
            for (name, field) in row.get_column_iter() {
                columnar::assign(&mut tick, name, field);
            }
            if tick.ts_ns < start_ns || tick.ts_ns > end_ns {
                continue;
            }
            ticks.push(tick);
        }
        Ok(ticks)
    }
}

#[cfg(not(feature = "parquet"))]
impl PartitionReader for ColumnarReader {
    fn read(&self, partition: &PartitionMeta, _start_ns: i64, _end_ns: i64) -> Result<Vec<Tick>> {
        anyhow::bail!(
            "columnar reader disabled, cannot read {}",
            partition.file_path.display()
        )
    }
}

#[cfg(feature = "parquet")]
mod columnar {
    use common::Tick;
    use parquet::record::Field;

    #[allow(clippy::cast_possible_truncation)]
    pub(super) fn assign(tick: &mut Tick, name: &str, field: &Field) {
        match name {
            "symbol" => {
                if let Some(symbol) = as_str(field) {
                    if !symbol.is_empty() {
                        tick.symbol = symbol;
                    }
                }
            }
            "exchange" => tick.exchange = as_str(field).unwrap_or_default(),
            "ts_ns" => tick.ts_ns = as_i64(field),
            "last_price" => tick.last_price = as_f64(field),
            "last_volume" => tick.last_volume = as_i64(field) as i32,
            "bid_price1" => tick.bid_price1 = as_f64(field),
            "bid_volume1" => tick.bid_volume1 = as_i64(field) as i32,
            "ask_price1" => tick.ask_price1 = as_f64(field),
            "ask_volume1" => tick.ask_volume1 = as_i64(field) as i32,
            "volume" => tick.volume = as_i64(field),
            "turnover" => tick.turnover = as_f64(field),
            "open_interest" => tick.open_interest = as_i64(field),
            _ => {}
        }
    }

    fn as_str(field: &Field) -> Option<String> {
        match field {
            Field::Str(value) => Some(value.clone()),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(field: &Field) -> f64 {
        match field {
            Field::Double(value) => *value,
            Field::Float(value) => f64::from(*value),
            Field::Long(value) => *value as f64,
            Field::Int(value) => f64::from(*value),
            _ => 0.0,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn as_i64(field: &Field) -> i64 {
        match field {
            Field::Long(value) => *value,
            Field::Int(value) => i64::from(*value),
            Field::Double(value) => *value as i64,
            Field::Float(value) => f64::from(*value) as i64,
            _ => 0,
        }
    }
}

impl PartitionReader for SidecarCsvReader {
    fn read(&self, partition: &PartitionMeta, start_ns: i64, end_ns: i64) -> Result<Vec<Tick>> {
        let sidecar = partition.sidecar_path(".ticks.csv");
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&sidecar)?;
        let headers = reader.headers()?.clone();

        let mut ticks = Vec::new();
        for record in reader.records() {
            let Ok(record) = record else { continue };
            let Some(tick) = tick_from_record(&headers, &record, &partition.instrument_id) else {
                continue;
            };
            if tick.ts_ns < start_ns || tick.ts_ns > end_ns {
                continue;
            }
            ticks.push(tick);
        }
        Ok(ticks)
    }
}

/// Build a tick from one CSV record, mapping fields by header name.
/// A missing or empty field takes its default; a malformed field drops
/// the whole row.
fn tick_from_record(
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
    default_symbol: &str,
) -> Option<Tick> {
    let field = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|header| header == name)
            .and_then(|index| record.get(index))
    };

    let symbol = match field("symbol") {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default_symbol.to_string(),
    };

    Some(Tick {
        symbol,
        exchange: field("exchange").unwrap_or_default().to_string(),
        ts_ns: parse_field(field("ts_ns"))?,
        last_price: parse_field(field("last_price"))?,
        last_volume: parse_field(field("last_volume"))?,
        bid_price1: parse_field(field("bid_price1"))?,
        bid_volume1: parse_field(field("bid_volume1"))?,
        ask_price1: parse_field(field("ask_price1"))?,
        ask_volume1: parse_field(field("ask_volume1"))?,
        volume: parse_field(field("volume"))?,
        turnover: parse_field(field("turnover"))?,
        open_interest: parse_field(field("open_interest"))?,
    })
}

fn parse_field<T: std::str::FromStr + Default>(value: Option<&str>) -> Option<T> {
    match value {
        None => Some(T::default()),
        Some(text) if text.trim().is_empty() => Some(T::default()),
        Some(text) => text.trim().parse().ok(),
    }
}

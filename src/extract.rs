use crate::error::{DashboardError, Result};
use crate::structs::{Season, TemperatureRecord, TemperatureTable};
use arrow_array::{Array, Float64Array, RecordBatch, StringArray};
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

/// Row shape of the historical dataset. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    city: String,
    timestamp: String,
    season: String,
    temperature: Option<f64>,
}

/// Loads the historical dataset, choosing the reader from the file extension.
///
/// `.parquet` files go through the Arrow reader, anything else is read as CSV
/// with a header row.
///
/// # Errors
///
/// Returns `DashboardError` if the file cannot be opened, a required column is
/// missing, or a row carries an unknown season.
pub fn load_table(path: &Path) -> Result<TemperatureTable> {
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    let table = if is_parquet {
        debug!("Reading Parquet file: {}", path.display());
        read_parquet_table(path)?
    } else {
        debug!("Reading CSV file: {}", path.display());
        read_csv_table(File::open(path)?)?
    };

    debug!(
        "Loaded {} records for {} cities",
        table.len(),
        table.cities().len()
    );
    Ok(table)
}

/// Parses CSV text with a `city,timestamp,season,temperature` header.
///
/// An empty temperature cell is kept as NaN and skipped by the aggregates.
pub fn read_csv_table<R: Read>(reader: R) -> Result<TemperatureTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (row, result) in csv_reader.deserialize::<RawRow>().enumerate() {
        let raw = result?;
        let temperature = raw.temperature.unwrap_or(f64::NAN);
        records.push(into_record(raw.city, raw.timestamp, &raw.season, temperature, row)?);
    }

    Ok(TemperatureTable::new(records))
}

/// Reads the same four columns from a Parquet file.
///
/// A null temperature becomes NaN; a null city, timestamp or season is a data
/// error naming the row.
pub fn read_parquet_table(path: &Path) -> Result<TemperatureTable> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    let mut row = 0;
    for batch_result in reader {
        let batch = batch_result?;
        let city_col = get_column_str(&batch, "city")?;
        let timestamp_col = get_column_str(&batch, "timestamp")?;
        let season_col = get_column_str(&batch, "season")?;
        let temp_col = get_column_f64(&batch, "temperature")?;

        for i in 0..batch.num_rows() {
            let temperature = if temp_col.is_null(i) {
                f64::NAN
            } else {
                temp_col.value(i)
            };
            records.push(into_record(
                required_str(city_col, "city", i, row)?.to_string(),
                required_str(timestamp_col, "timestamp", i, row)?.to_string(),
                required_str(season_col, "season", i, row)?,
                temperature,
                row,
            )?);
            row += 1;
        }
    }

    Ok(TemperatureTable::new(records))
}

fn into_record(
    city: String,
    timestamp: String,
    season: &str,
    temperature: f64,
    row: usize,
) -> Result<TemperatureRecord> {
    let season: Season = season
        .parse()
        .map_err(|e| DashboardError::Data(format!("row {}: {}", row + 1, e)))?;
    Ok(TemperatureRecord {
        city,
        timestamp,
        season,
        temperature,
    })
}

fn required_str<'a>(col: &'a StringArray, name: &str, i: usize, row: usize) -> Result<&'a str> {
    if col.is_null(i) {
        return Err(DashboardError::Data(format!("row {}: {} is null", row + 1, name)));
    }
    Ok(col.value(i))
}

fn get_column_f64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DashboardError::Data(format!("Column not found: {}", name)))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| DashboardError::Data(format!("Column {} is not Float64", name)))
}

fn get_column_str<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DashboardError::Data(format!("Column not found: {}", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DashboardError::Data(format!("Column {} is not Utf8/String", name)))
}

use crate::error::Result;
use crate::structs::SeasonProfile;
use arrow_array::{Float64Array, RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use csv::Writer;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{fs::File, path::Path, sync::Arc};

/// Writes season profiles to a CSV file with formatted numeric values.
///
/// # Arguments
/// * `profiles` - Slice of SeasonProfile rows, typically from `profile_table`
/// * `output_path` - Path where the CSV file will be created
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_profiles_csv(profiles: &[SeasonProfile], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["City", "Season", "Mean_Temp", "Std_Dev", "Count"])?;

    for profile in profiles {
        writer.write_record(&[
            profile.city.to_string(),
            profile.season.to_string(),
            format!("{:.2}", profile.mean),
            format!("{:.2}", profile.std_dev),
            profile.count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes any serializable report to a pretty-formatted JSON file.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_json<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Writes season profiles to a columnar Parquet file using Arrow format.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_profiles_parquet(profiles: &[SeasonProfile], output_path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("city", DataType::Utf8, false),
        Field::new("season", DataType::Utf8, false),
        Field::new("mean_temp", DataType::Float64, false),
        Field::new("std_dev", DataType::Float64, false),
        Field::new("count", DataType::UInt32, false),
    ]));

    let cities = StringArray::from_iter_values(profiles.iter().map(|p| p.city.as_str()));
    let seasons = StringArray::from_iter_values(profiles.iter().map(|p| p.season.as_str()));
    let means: Float64Array = profiles.iter().map(|p| p.mean).collect();
    let std_devs: Float64Array = profiles.iter().map(|p| p.std_dev).collect();
    let counts: UInt32Array = profiles.iter().map(|p| p.count).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(cities),
            Arc::new(seasons),
            Arc::new(means),
            Arc::new(std_devs),
            Arc::new(counts),
        ],
    )?;

    let file = File::create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Season;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn profiles() -> Vec<SeasonProfile> {
        vec![
            SeasonProfile {
                city: "Berlin".to_string(),
                season: Season::Spring,
                mean: 9.456,
                std_dev: 2.0,
                count: 92,
            },
            SeasonProfile {
                city: "Moscow".to_string(),
                season: Season::Winter,
                mean: -7.0,
                std_dev: 5.126,
                count: 90,
            },
        ]
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("seasonal_anomaly_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_write_profiles_csv() {
        let path = temp_path("profiles.csv");
        write_profiles_csv(&profiles(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "City,Season,Mean_Temp,Std_Dev,Count");
        assert_eq!(lines[1], "Berlin,spring,9.46,2.00,92");
        assert_eq!(lines[2], "Moscow,winter,-7.00,5.13,90");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_profiles_parquet_reads_back() {
        let path = temp_path("profiles.parquet");
        write_profiles_parquet(&profiles(), &path).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|batch| batch.unwrap().num_rows()).sum();
        assert_eq!(rows, 2);
        std::fs::remove_file(&path).ok();
    }
}

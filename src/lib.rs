pub mod anomaly;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod plot;
pub mod structs;
pub mod transform;

// Re-export public API
pub use anomaly::{AnomalyVerdict, assess, classify};
pub use error::{DashboardError, Result};
pub use extract::{load_table, read_csv_table, read_parquet_table};
pub use fetch::{CurrentReading, FetchFailure, FetchOutcome, WeatherClient, interpret_response};
pub use load::{write_json, write_profiles_csv, write_profiles_parquet};
pub use pipeline::{AnalysisReport, analyze, validate_selection};
pub use plot::{TimeSeriesChart, render_season_profile, render_time_series, time_series};
pub use structs::{
    AnalysisConfig, CityDescription, ConsoleLogger, Season, SeasonProfile, SeasonalStats,
    TemperatureRecord, TemperatureTable,
};
pub use transform::{describe, mean_and_std, profile_table, season_profile, seasonal_sample, seasonal_stats};

use crate::structs::Season;
use arrow_schema::ArrowError;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parquet Error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow Error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("Data Error: {0}")]
    Data(String),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parse Error: {0}")]
    Parse(String),
    #[error("No historical records for {city} in {season}")]
    GroupNotFound { city: String, season: Season },
    #[error("City not found in dataset: {0}")]
    CityNotFound(String),
    #[error("Plot Error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

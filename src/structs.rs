use log::{Level, Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Console logger writing to stderr, so stdout stays free for the report.
///
/// Dependencies (reqwest, rustls) are capped at `Warn`; our own targets follow
/// the global max level.
pub struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let target = metadata.target();
        target.starts_with("lib")
            || target.starts_with("seasonal_anomaly")
            || metadata.level() <= Level::Warn
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Meteorological season of a historical record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    /// Exact, case-sensitive match on the lowercase season names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::ALL
            .into_iter()
            .find(|season| season.as_str() == s)
            .ok_or_else(|| format!("unknown season: {:?}", s))
    }
}

/// One historical daily temperature observation.
///
/// `timestamp` is kept verbatim; year filters match it by substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub city: String,
    pub timestamp: String,
    pub season: Season,
    pub temperature: f64,
}

/// Read-only table of historical records, in file order.
#[derive(Debug, Clone, Default)]
pub struct TemperatureTable {
    records: Vec<TemperatureRecord>,
}

impl TemperatureTable {
    pub fn new(records: Vec<TemperatureRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TemperatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows for a single city, table order preserved.
    pub fn city_rows<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a TemperatureRecord> + 'a {
        self.records.iter().filter(move |r| r.city == city)
    }

    /// Distinct cities in order of first appearance.
    pub fn cities(&self) -> Vec<String> {
        let mut cities: Vec<String> = Vec::new();
        for record in &self.records {
            if !cities.iter().any(|c| c == &record.city) {
                cities.push(record.city.clone());
            }
        }
        cities
    }

    /// Seasons with at least one record for `city`, in calendar order.
    pub fn seasons_for(&self, city: &str) -> Vec<Season> {
        Season::ALL
            .into_iter()
            .filter(|season| self.has_group(city, *season))
            .collect()
    }

    /// First `rows` records as aligned text lines, with a header and a trailer
    /// counting the rows left out.
    pub fn preview(&self, rows: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "{:<16} {:<20} {:<7} {:>11}",
            "city", "timestamp", "season", "temperature"
        )];
        for record in self.records.iter().take(rows) {
            lines.push(format!(
                "{:<16} {:<20} {:<7} {:>11}",
                record.city, record.timestamp, record.season, record.temperature
            ));
        }
        let hidden = self.records.len().saturating_sub(rows);
        if hidden > 0 {
            lines.push(format!("... {} more rows", hidden));
        }
        lines
    }

    /// True when the pair has at least one usable (non-NaN) reading.
    pub fn has_group(&self, city: &str, season: Season) -> bool {
        self.city_rows(city)
            .any(|r| r.season == season && !r.temperature.is_nan())
    }
}

/// Parameters of one dashboard run.
///
/// Defaults: season `spring`, year `"2019"`, language `"ru"`, units `"metric"`.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub season: Season,
    pub year: String,
    pub lang: String,
    pub units: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            season: Season::Spring,
            year: "2019".to_string(),
            lang: "ru".to_string(),
            units: "metric".to_string(),
        }
    }
}

/// Population mean and standard deviation of a seasonal sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl SeasonalStats {
    pub fn lower_bound(&self) -> f64 {
        self.mean - self.std_dev
    }

    pub fn upper_bound(&self) -> f64 {
        self.mean + self.std_dev
    }
}

/// Per-season aggregate for one city across all years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonProfile {
    pub city: String,
    pub season: Season,
    pub mean: f64,
    pub std_dev: f64,
    pub count: u32,
}

/// Descriptive statistics for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDescription {
    pub city: String,
    pub year: String,
    pub min_temperature: f64,
    pub min_timestamp: String,
    pub max_temperature: f64,
    pub max_timestamp: String,
    pub spring_mean: Option<f64>,
    pub days_below_zero: usize,
    pub days_above_zero: usize,
}

use crate::anomaly::{AnomalyVerdict, assess};
use crate::error::{DashboardError, Result};
use crate::fetch::CurrentReading;
use crate::plot::{TimeSeriesChart, time_series};
use crate::structs::{AnalysisConfig, CityDescription, SeasonProfile, SeasonalStats, TemperatureTable};
use crate::transform::{describe, season_profile, seasonal_stats};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything one dashboard run produces for the selected city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub reading: CurrentReading,
    pub seasonal: SeasonalStats,
    pub verdict: AnomalyVerdict,
    pub description: CityDescription,
    pub time_series: TimeSeriesChart,
    pub profile: Vec<SeasonProfile>,
}

/// Checks that `city` has history for the configured season.
///
/// # Errors
///
/// `CityNotFound` when the city is absent, `GroupNotFound` when the city
/// exists but has no rows for the season.
pub fn validate_selection(table: &TemperatureTable, city: &str, config: &AnalysisConfig) -> Result<()> {
    if table.city_rows(city).next().is_none() {
        return Err(DashboardError::CityNotFound(city.to_string()));
    }
    if !table.has_group(city, config.season) {
        return Err(DashboardError::GroupNotFound {
            city: city.to_string(),
            season: config.season,
        });
    }
    Ok(())
}

/// Runs classification, description and chart preparation for one reading.
///
/// # Errors
///
/// Propagates lookup failures from `validate_selection`.
pub fn analyze(
    table: &TemperatureTable,
    reading: CurrentReading,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    let city = reading.city.clone();
    validate_selection(table, &city, config)?;

    let seasonal = seasonal_stats(table, &city, config.season)?;
    debug!(
        "{} {}: mean={:.2} std={:.2} over {} readings",
        city, config.season, seasonal.mean, seasonal.std_dev, seasonal.count
    );

    let verdict = assess(&city, config.season, reading.temperature, &seasonal);
    info!(
        "{} current={:.1} band=[{:.2}, {:.2}] anomaly={}",
        city, reading.temperature, verdict.lower_bound, verdict.upper_bound, verdict.is_anomaly
    );

    let description = describe(table, &city, &config.year)?;
    let time_series = time_series(table, &city, config.season, &config.year, &seasonal);
    let profile = season_profile(table, &city);

    Ok(AnalysisReport {
        reading,
        seasonal,
        verdict,
        description,
        time_series,
        profile,
    })
}

impl AnalysisReport {
    /// Human-readable summary lines, in display order.
    pub fn narrative(&self) -> Vec<String> {
        let d = &self.description;
        let spring_mean = d
            .spring_mean
            .map(|m| format!("{:.2}°C", m))
            .unwrap_or_else(|| "n/a".to_string());

        vec![
            format!(
                "Current temperature in {} is {}°C.",
                self.reading.city, self.reading.temperature
            ),
            self.verdict.to_string(),
            format!("Minimum temperature: {}°C (date: {})", d.min_temperature, d.min_timestamp),
            format!("Maximum temperature: {}°C (date: {})", d.max_temperature, d.max_timestamp),
            format!("Mean spring temperature: {}", spring_mean),
            format!("Days above zero in {}: {}", d.year, d.days_above_zero),
            format!("Days below zero in {}: {}", d.year, d.days_below_zero),
        ]
    }
}

use crate::error::{DashboardError, Result};
use crate::structs::{Season, SeasonProfile, SeasonalStats, TemperatureTable};
use log::debug;
use plotters::element::ErrorBar;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1024, 640);

/// Readings of one city/season/year with the seasonal reference band.
///
/// The band (mean, lower, upper) comes from the full seasonal history, not
/// only from the plotted year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesChart {
    pub city: String,
    pub season: Season,
    pub year: String,
    pub timestamps: Vec<String>,
    pub temperatures: Vec<f64>,
    pub mean: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Selects the rows to plot: exact city and season, timestamp containing `year`.
/// Missing readings are not plotted.
pub fn time_series(
    table: &TemperatureTable,
    city: &str,
    season: Season,
    year: &str,
    stats: &SeasonalStats,
) -> TimeSeriesChart {
    let (timestamps, temperatures): (Vec<String>, Vec<f64>) = table
        .city_rows(city)
        .filter(|r| r.season == season && r.timestamp.contains(year) && !r.temperature.is_nan())
        .map(|r| (r.timestamp.clone(), r.temperature))
        .unzip();

    TimeSeriesChart {
        city: city.to_string(),
        season,
        year: year.to_string(),
        timestamps,
        temperatures,
        mean: stats.mean,
        lower_bound: stats.lower_bound(),
        upper_bound: stats.upper_bound(),
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Plot(e.to_string())
}

/// Vertical range covering `values`, padded by 10% (1 degree when flat).
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return (-1.0, 1.0);
    }
    let padding = if (max - min).abs() > 1e-6 { (max - min) * 0.1 } else { 1.0 };
    (min - padding, max + padding)
}

/// Draws the readings as a line with mean and ±1σ reference lines.
pub fn render_time_series(chart: &TimeSeriesChart, output_path: &Path) -> Result<()> {
    debug!(
        "Rendering time series ({} points) to {}",
        chart.temperatures.len(),
        output_path.display()
    );

    let root = SVGBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let x_max = chart.temperatures.len().saturating_sub(1).max(1) as f64;
    let (y_min, y_max) = padded_range(
        chart
            .temperatures
            .iter()
            .copied()
            .chain([chart.lower_bound, chart.upper_bound]),
    );

    let mut ctx = ChartBuilder::on(&root)
        .caption(
            format!("Temperature in {}, {} {}", chart.city, chart.season, chart.year),
            ("sans-serif", 24),
        )
        .margin(16)
        .x_label_area_size(70)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)
        .map_err(plot_err)?;

    let label_at = |x: &f64| {
        let index = x.round();
        if index < 0.0 {
            return String::new();
        }
        chart.timestamps.get(index as usize).cloned().unwrap_or_default()
    };
    ctx.configure_mesh()
        .x_desc("Date")
        .y_desc("Temperature, °C")
        .x_labels(8)
        .x_label_formatter(&label_at)
        .draw()
        .map_err(plot_err)?;

    ctx.draw_series(LineSeries::new(
        chart.temperatures.iter().enumerate().map(|(i, t)| (i as f64, *t)),
        BLUE.stroke_width(2),
    ))
    .map_err(plot_err)?
    .label("Temperature")
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    let reference_lines = [
        ("Mean", chart.mean, GREEN),
        ("Lower bound", chart.lower_bound, RED),
        ("Upper bound", chart.upper_bound, RED),
    ];
    for (label, value, color) in reference_lines {
        ctx.draw_series(LineSeries::new(vec![(0.0, value), (x_max, value)], &color))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Draws one bar per season with a ±std error bar.
pub fn render_season_profile(city: &str, profiles: &[SeasonProfile], output_path: &Path) -> Result<()> {
    if profiles.is_empty() {
        return Err(DashboardError::CityNotFound(city.to_string()));
    }
    debug!("Rendering season profile for {} to {}", city, output_path.display());

    let root = SVGBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let n = profiles.len() as f64;
    let (y_min, y_max) = padded_range(
        profiles
            .iter()
            .flat_map(|p| [p.mean - p.std_dev, p.mean + p.std_dev])
            .chain([0.0]),
    );

    let mut ctx = ChartBuilder::on(&root)
        .caption(format!("Seasonal temperature profile in {}", city), ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n - 0.5), y_min..y_max)
        .map_err(plot_err)?;

    let season_at = |x: &f64| {
        let index = x.round();
        if index < 0.0 || (x - index).abs() > 0.01 {
            return String::new();
        }
        profiles
            .get(index as usize)
            .map(|p| p.season.to_string())
            .unwrap_or_default()
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc("Season")
        .y_desc("Mean temperature, °C")
        .x_labels(profiles.len() * 2 + 1)
        .x_label_formatter(&season_at)
        .draw()
        .map_err(plot_err)?;

    ctx.draw_series(profiles.iter().enumerate().map(|(i, p)| {
        let x = i as f64;
        Rectangle::new([(x - 0.3, 0.0), (x + 0.3, p.mean)], BLUE.mix(0.6).filled())
    }))
    .map_err(plot_err)?;

    ctx.draw_series(profiles.iter().enumerate().map(|(i, p)| {
        ErrorBar::new_vertical(
            i as f64,
            p.mean - p.std_dev,
            p.mean,
            p.mean + p.std_dev,
            BLACK.filled(),
            12,
        )
    }))
    .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

use crate::error::{DashboardError, Result};
use crate::structs::{CityDescription, Season, SeasonProfile, SeasonalStats, TemperatureTable};
use log::debug;
use rayon::prelude::*;

/// Collects the historical temperatures of one `(city, season)` group.
///
/// Matching is exact on both keys and the returned values keep table order.
/// Missing readings (NaN) are left out.
///
/// # Errors
///
/// Returns `DashboardError::GroupNotFound` when no row matches the pair.
pub fn seasonal_sample(table: &TemperatureTable, city: &str, season: Season) -> Result<Vec<f64>> {
    let sample: Vec<f64> = table
        .city_rows(city)
        .filter(|r| r.season == season && !r.temperature.is_nan())
        .map(|r| r.temperature)
        .collect();

    if sample.is_empty() {
        return Err(DashboardError::GroupNotFound {
            city: city.to_string(),
            season,
        });
    }

    debug!("{} {} sample: {} readings", city, season, sample.len());
    Ok(sample)
}

/// Population mean and population standard deviation (N denominator).
///
/// A sample of identical values, including a single value, has a standard
/// deviation of exactly zero. The converse holds as long as the squared
/// deviations do not underflow: values differing by less than about 1e-154
/// (far below any temperature resolution) also report zero.
///
/// # Errors
///
/// Returns `DashboardError::Data` for an empty sample.
pub fn mean_and_std(sample: &[f64]) -> Result<SeasonalStats> {
    let first = *sample
        .first()
        .ok_or_else(|| DashboardError::Data("cannot summarise an empty sample".to_string()))?;
    let count = sample.len();

    if sample.iter().all(|&x| x == first) {
        return Ok(SeasonalStats {
            mean: first,
            std_dev: 0.0,
            count,
        });
    }

    let mean = sample.iter().sum::<f64>() / count as f64;
    let variance = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

    Ok(SeasonalStats {
        mean,
        std_dev: variance.sqrt(),
        count,
    })
}

/// `seasonal_sample` followed by `mean_and_std`.
pub fn seasonal_stats(table: &TemperatureTable, city: &str, season: Season) -> Result<SeasonalStats> {
    mean_and_std(&seasonal_sample(table, city, season)?)
}

/// Summarises a city's history.
///
/// Extremes report the timestamp of the first row holding the value. The
/// spring mean always uses the `spring` season. Day counts only consider rows
/// whose timestamp contains `year`: strictly below zero and strictly above
/// zero, so zero readings fall in neither count.
///
/// # Errors
///
/// Returns `DashboardError::CityNotFound` if the city has no usable rows.
pub fn describe(table: &TemperatureTable, city: &str, year: &str) -> Result<CityDescription> {
    let mut min: Option<(f64, &str)> = None;
    let mut max: Option<(f64, &str)> = None;
    let mut spring_sum = 0.0;
    let mut spring_count = 0usize;
    let mut days_below_zero = 0;
    let mut days_above_zero = 0;

    for record in table.city_rows(city) {
        let temp = record.temperature;
        if temp.is_nan() {
            continue;
        }

        if min.is_none_or(|(m, _)| temp < m) {
            min = Some((temp, record.timestamp.as_str()));
        }
        if max.is_none_or(|(m, _)| temp > m) {
            max = Some((temp, record.timestamp.as_str()));
        }

        if record.season == Season::Spring {
            spring_sum += temp;
            spring_count += 1;
        }

        if record.timestamp.contains(year) {
            if temp < 0.0 {
                days_below_zero += 1;
            } else if temp > 0.0 {
                days_above_zero += 1;
            }
        }
    }

    let ((min_temperature, min_timestamp), (max_temperature, max_timestamp)) = min
        .zip(max)
        .ok_or_else(|| DashboardError::CityNotFound(city.to_string()))?;

    Ok(CityDescription {
        city: city.to_string(),
        year: year.to_string(),
        min_temperature,
        min_timestamp: min_timestamp.to_string(),
        max_temperature,
        max_timestamp: max_timestamp.to_string(),
        spring_mean: (spring_count > 0).then(|| spring_sum / spring_count as f64),
        days_below_zero,
        days_above_zero,
    })
}

/// Per-season mean and spread of a city's whole history.
///
/// Only seasons present for the city are returned, in calendar order. The
/// spread is the sample standard deviation (N-1 denominator); a single-row
/// season reports 0.
pub fn season_profile(table: &TemperatureTable, city: &str) -> Vec<SeasonProfile> {
    Season::ALL
        .into_iter()
        .filter_map(|season| {
            let temps: Vec<f64> = table
                .city_rows(city)
                .filter(|r| r.season == season && !r.temperature.is_nan())
                .map(|r| r.temperature)
                .collect();
            if temps.is_empty() {
                return None;
            }
            Some(analyze_season(city, season, &temps))
        })
        .collect()
}

/// Season profiles of every city, computed in parallel and sorted by city
/// then season.
pub fn profile_table(table: &TemperatureTable) -> Vec<SeasonProfile> {
    let cities = table.cities();
    debug!("Building season profiles for {} cities", cities.len());

    let mut profiles: Vec<SeasonProfile> = cities
        .par_iter()
        .flat_map_iter(|city| season_profile(table, city))
        .collect();

    profiles.sort_by(|a, b| a.city.cmp(&b.city).then_with(|| a.season.cmp(&b.season)));
    profiles
}

fn analyze_season(city: &str, season: Season, temps: &[f64]) -> SeasonProfile {
    let count = temps.len();
    let mean = temps.iter().sum::<f64>() / count as f64;
    let std_dev = if count > 1 {
        let variance = temps.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    SeasonProfile {
        city: city.to_string(),
        season,
        mean,
        std_dev,
        count: count as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::TemperatureRecord;

    fn record(city: &str, timestamp: &str, season: Season, temperature: f64) -> TemperatureRecord {
        TemperatureRecord {
            city: city.to_string(),
            timestamp: timestamp.to_string(),
            season,
            temperature,
        }
    }

    fn sample_table() -> TemperatureTable {
        TemperatureTable::new(vec![
            record("Moscow", "2019-01-10", Season::Winter, -12.0),
            record("Moscow", "2019-03-10", Season::Spring, 0.0),
            record("Moscow", "2019-04-10", Season::Spring, 2.0),
            record("Moscow", "2020-04-10", Season::Spring, 4.0),
            record("Moscow", "2019-07-10", Season::Summer, 25.0),
            record("Moscow", "2020-07-10", Season::Summer, 25.0),
            record("Moscow", "2020-01-10", Season::Winter, -12.0),
            record("Berlin", "2019-03-10", Season::Spring, 8.0),
        ])
    }

    #[test]
    fn test_seasonal_sample_keeps_table_order() {
        let sample = seasonal_sample(&sample_table(), "Moscow", Season::Spring).unwrap();
        assert_eq!(sample, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_seasonal_sample_missing_group() {
        let err = seasonal_sample(&sample_table(), "Paris", Season::Winter).unwrap_err();
        match err {
            DashboardError::GroupNotFound { city, season } => {
                assert_eq!(city, "Paris");
                assert_eq!(season, Season::Winter);
            }
            other => panic!("expected GroupNotFound, got {:?}", other),
        }
        // season exists elsewhere, but not for this city
        assert!(seasonal_sample(&sample_table(), "Berlin", Season::Winter).is_err());
        // city match is case-sensitive
        assert!(seasonal_sample(&sample_table(), "moscow", Season::Spring).is_err());
    }

    #[test]
    fn test_seasonal_sample_single_row() {
        let table = TemperatureTable::new(vec![record("Paris", "2019-01-01", Season::Winter, -3.5)]);
        assert_eq!(seasonal_sample(&table, "Paris", Season::Winter).unwrap(), vec![-3.5]);
    }

    #[test]
    fn test_mean_and_std_population() {
        let stats = mean_and_std(&[0.0, 2.0, 4.0]).unwrap();
        assert!((stats.mean - 2.0).abs() < 1e-12);
        assert!((stats.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_mean_and_std_constant_sample_has_zero_spread() {
        assert_eq!(mean_and_std(&[7.5]).unwrap().std_dev, 0.0);
        let stats = mean_and_std(&[0.1, 0.1, 0.1]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.mean, 0.1);
        assert!(mean_and_std(&[0.1, 0.1, 0.2]).unwrap().std_dev > 0.0);
    }

    #[test]
    fn test_mean_and_std_underflow_reports_zero_spread() {
        assert_eq!(mean_and_std(&[0.0, 1e-170]).unwrap().std_dev, 0.0);
        assert!(mean_and_std(&[0.0, 1e-100]).unwrap().std_dev > 0.0);
    }

    #[test]
    fn test_missing_readings_are_skipped() {
        let mut table = sample_table().records().to_vec();
        table.push(record("Moscow", "2019-05-10", Season::Spring, f64::NAN));
        table.push(record("Oslo", "2019-05-10", Season::Spring, f64::NAN));
        let table = TemperatureTable::new(table);

        assert_eq!(seasonal_sample(&table, "Moscow", Season::Spring).unwrap(), vec![0.0, 2.0, 4.0]);
        assert!(matches!(
            seasonal_sample(&table, "Oslo", Season::Spring),
            Err(DashboardError::GroupNotFound { .. })
        ));
        assert!(!table.has_group("Oslo", Season::Spring));

        let spring = &season_profile(&table, "Moscow")[1];
        assert_eq!(spring.mean, 2.0);
        assert_eq!(spring.count, 3);
        assert!(season_profile(&table, "Oslo").is_empty());
    }

    #[test]
    fn test_mean_and_std_rejects_empty() {
        assert!(matches!(mean_and_std(&[]), Err(DashboardError::Data(_))));
    }

    #[test]
    fn test_describe_extremes_use_first_occurrence() {
        let description = describe(&sample_table(), "Moscow", "2019").unwrap();
        assert_eq!(description.min_temperature, -12.0);
        assert_eq!(description.min_timestamp, "2019-01-10");
        assert_eq!(description.max_temperature, 25.0);
        assert_eq!(description.max_timestamp, "2019-07-10");
        assert_eq!(description.spring_mean, Some(2.0));
    }

    #[test]
    fn test_describe_counts_are_not_complementary() {
        let description = describe(&sample_table(), "Moscow", "2019").unwrap();
        // 2019 rows: -12, 0, 2, 25; the zero reading is in neither count
        assert_eq!(description.days_below_zero, 1);
        assert_eq!(description.days_above_zero, 2);

        let table = TemperatureTable::new(vec![
            record("X", "2019-01-01", Season::Winter, -5.0),
            record("X", "2020-06-01", Season::Summer, 3.0),
        ]);
        let description = describe(&table, "X", "2019").unwrap();
        assert_eq!(description.days_below_zero, 1);
        assert_eq!(description.days_above_zero, 0);
        assert_eq!(description.spring_mean, None);
    }

    #[test]
    fn test_describe_unknown_city() {
        assert!(matches!(
            describe(&sample_table(), "Paris", "2019"),
            Err(DashboardError::CityNotFound(_))
        ));
    }

    #[test]
    fn test_season_profile_uses_sample_std() {
        let profile = season_profile(&sample_table(), "Moscow");
        let seasons: Vec<Season> = profile.iter().map(|p| p.season).collect();
        assert_eq!(seasons, vec![Season::Winter, Season::Spring, Season::Summer]);

        let spring = &profile[1];
        assert_eq!(spring.mean, 2.0);
        assert_eq!(spring.std_dev, 2.0);
        assert_eq!(spring.count, 3);
        assert_eq!(profile[0].std_dev, 0.0);

        let berlin = season_profile(&sample_table(), "Berlin");
        assert_eq!(berlin.len(), 1);
        assert_eq!(berlin[0].std_dev, 0.0);
    }

    #[test]
    fn test_profile_table_sorted_by_city_then_season() {
        let profiles = profile_table(&sample_table());
        let keys: Vec<(&str, Season)> = profiles.iter().map(|p| (p.city.as_str(), p.season)).collect();
        assert_eq!(
            keys,
            vec![
                ("Berlin", Season::Spring),
                ("Moscow", Season::Winter),
                ("Moscow", Season::Spring),
                ("Moscow", Season::Summer),
            ]
        );
    }
}

use crate::structs::{Season, SeasonalStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns `true` when `current_temp` lies strictly outside `mean ± std`.
///
/// A reading exactly on either bound is not anomalous.
pub fn classify(current_temp: f64, mean: f64, std: f64) -> bool {
    let lower = mean - std;
    let upper = mean + std;
    current_temp < lower || current_temp > upper
}

/// Outcome of comparing a current reading against a seasonal band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub city: String,
    pub season: Season,
    pub current_temperature: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub is_anomaly: bool,
}

pub fn assess(city: &str, season: Season, current_temp: f64, stats: &SeasonalStats) -> AnomalyVerdict {
    AnomalyVerdict {
        city: city.to_string(),
        season,
        current_temperature: current_temp,
        lower_bound: stats.lower_bound(),
        upper_bound: stats.upper_bound(),
        is_anomaly: classify(current_temp, stats.mean, stats.std_dev),
    }
}

impl fmt::Display for AnomalyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Is the current temperature in {} an anomaly?\nAnswer: {}",
            self.city,
            if self.is_anomaly { "Yes" } else { "No" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_at_mean_is_normal() {
        for std in [0.0, 0.5, 3.0, 100.0] {
            assert!(!classify(10.0, 10.0, std));
        }
    }

    #[test]
    fn test_bounds_are_inclusive_to_normal() {
        let (mean, std) = (2.0, 1.5);
        assert!(!classify(mean - std, mean, std));
        assert!(!classify(mean + std, mean, std));
        assert!(classify(mean - std - 1e-9, mean, std));
        assert!(classify(mean + std + 1e-9, mean, std));
    }

    #[test]
    fn test_zero_spread_flags_any_deviation() {
        assert!(!classify(4.0, 4.0, 0.0));
        assert!(classify(4.1, 4.0, 0.0));
        assert!(classify(3.9, 4.0, 0.0));
    }

    #[test]
    fn test_reference_sample() {
        assert!(classify(0.3, 2.0, 1.633));
        assert!(!classify(1.0, 2.0, 1.633));
    }

    #[test]
    fn test_assess_message() {
        let stats = SeasonalStats {
            mean: 2.0,
            std_dev: 1.0,
            count: 3,
        };
        let verdict = assess("Moscow", Season::Spring, 5.0, &stats);
        assert!(verdict.is_anomaly);
        assert_eq!(verdict.lower_bound, 1.0);
        assert_eq!(verdict.upper_bound, 3.0);
        assert_eq!(
            verdict.to_string(),
            "Is the current temperature in Moscow an anomaly?\nAnswer: Yes"
        );

        let verdict = assess("Moscow", Season::Spring, 2.5, &stats);
        assert!(verdict.to_string().ends_with("Answer: No"));
    }
}

//! Summary statistics over measured samples.
//!
//! The error margin is the half width of a Student-t confidence interval on
//! the mean. Critical values come from a table; between tabulated degrees of
//! freedom the next lower entry is used, which widens the interval slightly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Confidence level of the reported error margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// 95% two-sided interval.
    #[serde(rename = "95")]
    P95,
    /// 99% two-sided interval.
    #[serde(rename = "99")]
    P99,
    /// 99.9% two-sided interval.
    #[default]
    #[serde(rename = "99.9")]
    P999,
}

// Degrees of freedom covered beyond 30, then the normal limit.
const SPARSE_DF: [u64; 5] = [40, 60, 80, 100, 120];

const T_95: [f64; 36] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042, 2.021, 2.000, 1.990, 1.984, 1.980, 1.960,
];

const T_99: [f64; 36] = [
    63.657, 9.925, 5.841, 4.604, 4.032, 3.707, 3.499, 3.355, 3.250, 3.169, 3.106, 3.055, 3.012,
    2.977, 2.947, 2.921, 2.898, 2.878, 2.861, 2.845, 2.831, 2.819, 2.807, 2.797, 2.787, 2.779,
    2.771, 2.763, 2.756, 2.750, 2.704, 2.660, 2.639, 2.626, 2.617, 2.576,
];

const T_999: [f64; 36] = [
    636.619, 31.599, 12.924, 8.610, 6.869, 5.959, 5.408, 5.041, 4.781, 4.587, 4.437, 4.318, 4.221,
    4.140, 4.073, 4.015, 3.965, 3.922, 3.883, 3.850, 3.819, 3.792, 3.768, 3.745, 3.725, 3.707,
    3.690, 3.674, 3.659, 3.646, 3.551, 3.460, 3.416, 3.390, 3.373, 3.291,
];

impl ConfidenceLevel {
    /// Two-sided Student-t critical value for the given degrees of freedom.
    ///
    /// Returns `None` for zero degrees of freedom.
    pub fn t_critical(self, degrees_of_freedom: u64) -> Option<f64> {
        let table = match self {
            Self::P95 => &T_95,
            Self::P99 => &T_99,
            Self::P999 => &T_999,
        };

        let index = match degrees_of_freedom {
            0 => return None,
            df @ 1..=30 => (df - 1) as usize,
            df => match SPARSE_DF.iter().rposition(|&d| d <= df) {
                Some(i) if df < 1_000 => 30 + i,
                // Below the first sparse entry: stay with df = 30.
                None => 29,
                Some(_) => table.len() - 1,
            },
        };
        table.get(index).copied()
    }

    /// Level as a fraction, e.g. `0.999`.
    pub fn as_fraction(self) -> f64 {
        match self {
            Self::P95 => 0.95,
            Self::P99 => 0.99,
            Self::P999 => 0.999,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P95 => write!(f, "95%"),
            Self::P99 => write!(f, "99%"),
            Self::P999 => write!(f, "99.9%"),
        }
    }
}

impl FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('%') {
            "95" => Ok(Self::P95),
            "99" => Ok(Self::P99),
            "99.9" => Ok(Self::P999),
            other => Err(format!(
                "unsupported confidence level '{other}' (expected 95, 99 or 99.9)"
            )),
        }
    }
}

/// Aggregated statistics of one operation's measured samples, in nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleStats {
    /// Number of measured samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean_ns: f64,
    /// Sample standard deviation (n - 1). Zero for a single sample.
    pub std_dev_ns: f64,
    /// Half width of the confidence interval. Zero below two samples.
    pub error_ns: f64,
    /// Fastest sample.
    pub min_ns: f64,
    /// Slowest sample.
    pub max_ns: f64,
    /// Median sample.
    pub median_ns: f64,
    /// Level used for `error_ns`.
    pub confidence: ConfidenceLevel,
}

impl SampleStats {
    /// Compute statistics over durations. Returns `None` for no samples.
    pub fn from_durations(samples: &[Duration], confidence: ConfidenceLevel) -> Option<Self> {
        let nanos: Vec<f64> = samples.iter().map(|d| d.as_nanos() as f64).collect();
        Self::from_nanos(&nanos, confidence)
    }

    /// Compute statistics over raw nanosecond samples. Returns `None` for no
    /// samples or when any sample is negative or not finite.
    pub fn from_nanos(samples: &[f64], confidence: ConfidenceLevel) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let min_ns = sorted[0];
        let max_ns = sorted[count - 1];
        let median_ns = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };

        // Rounding may push the mean an ulp past the extremes.
        let mean_ns = (sorted.iter().sum::<f64>() / count as f64).clamp(min_ns, max_ns);

        let (std_dev_ns, error_ns) = if count > 1 {
            let variance = sorted
                .iter()
                .map(|s| (s - mean_ns).powi(2))
                .sum::<f64>()
                / (count - 1) as f64;
            let std_dev = variance.sqrt();
            let std_err = std_dev / (count as f64).sqrt();
            let t = confidence.t_critical(count as u64 - 1).unwrap_or(0.0);
            (std_dev, t * std_err)
        } else {
            (0.0, 0.0)
        };

        Some(Self {
            count,
            mean_ns,
            std_dev_ns,
            error_ns,
            min_ns,
            max_ns,
            median_ns,
            confidence,
        })
    }

    /// Mean as a [`Duration`].
    pub fn mean(&self) -> Duration {
        Duration::from_nanos(self.mean_ns.round() as u64)
    }

    /// Lower and upper bound of the confidence interval.
    pub fn interval(&self) -> (f64, f64) {
        ((self.mean_ns - self.error_ns).max(0.0), self.mean_ns + self.error_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_statistics() {
        let stats = SampleStats::from_nanos(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], ConfidenceLevel::P95)
            .unwrap();

        assert_eq!(stats.count, 8);
        assert!((stats.mean_ns - 5.0).abs() < 1e-9);
        assert!((stats.median_ns - 4.5).abs() < 1e-9);
        assert_eq!(stats.min_ns, 2.0);
        assert_eq!(stats.max_ns, 9.0);
        // Sample variance = 32 / 7.
        assert!((stats.std_dev_ns - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
        let expected_error = 2.365 * stats.std_dev_ns / 8f64.sqrt();
        assert!((stats.error_ns - expected_error).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample() {
        let stats = SampleStats::from_nanos(&[42.0], ConfidenceLevel::P999).unwrap();
        assert_eq!(stats.mean_ns, 42.0);
        assert_eq!(stats.std_dev_ns, 0.0);
        assert_eq!(stats.error_ns, 0.0);
    }

    #[test]
    fn test_rejects_empty_and_negative() {
        assert!(SampleStats::from_nanos(&[], ConfidenceLevel::P95).is_none());
        assert!(SampleStats::from_nanos(&[1.0, -1.0], ConfidenceLevel::P95).is_none());
        assert!(SampleStats::from_nanos(&[f64::NAN], ConfidenceLevel::P95).is_none());
    }

    #[test]
    fn test_from_durations() {
        let samples = [Duration::from_micros(1), Duration::from_micros(3)];
        let stats = SampleStats::from_durations(&samples, ConfidenceLevel::P99).unwrap();
        assert_eq!(stats.mean(), Duration::from_micros(2));
    }

    #[test]
    fn test_t_critical_lookup() {
        assert_eq!(ConfidenceLevel::P95.t_critical(0), None);
        assert_eq!(ConfidenceLevel::P95.t_critical(1), Some(12.706));
        assert_eq!(ConfidenceLevel::P999.t_critical(30), Some(3.646));
        // Between 30 and 40 the df = 30 entry is kept.
        assert_eq!(ConfidenceLevel::P95.t_critical(35), Some(2.042));
        assert_eq!(ConfidenceLevel::P95.t_critical(59), Some(2.021));
        assert_eq!(ConfidenceLevel::P95.t_critical(500), Some(1.980));
        assert_eq!(ConfidenceLevel::P95.t_critical(10_000), Some(1.960));
    }

    #[test]
    fn test_t_critical_decreases_with_df() {
        for level in [ConfidenceLevel::P95, ConfidenceLevel::P99, ConfidenceLevel::P999] {
            let mut previous = f64::INFINITY;
            for df in 1..2_000 {
                let t = level.t_critical(df).unwrap();
                assert!(t <= previous, "{level} df={df}");
                previous = t;
            }
        }
    }

    #[test]
    fn test_confidence_parse() {
        assert_eq!("95".parse::<ConfidenceLevel>().unwrap(), ConfidenceLevel::P95);
        assert_eq!("99.9%".parse::<ConfidenceLevel>().unwrap(), ConfidenceLevel::P999);
        assert!("90".parse::<ConfidenceLevel>().is_err());
    }

    #[test]
    fn test_interval_is_non_negative() {
        let stats = SampleStats::from_nanos(&[1.0, 100.0], ConfidenceLevel::P999).unwrap();
        let (low, high) = stats.interval();
        assert_eq!(low, 0.0);
        assert!(high > stats.mean_ns);
    }
}

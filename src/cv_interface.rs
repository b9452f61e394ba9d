use serde::{Deserialize, Serialize};
use std::fmt;

// weeks since March 1, 2020
pub type Week = usize;
pub type AgeGroupIndex = usize;

/// Multiplier converting a "per 100,000 population" figure to a rate
pub const PER_100K: f64 = 0.00001;
/// Multiplier converting a percentage to a fraction
pub const PERCENT: f64 = 0.01;

pub const WEEKS_PER_YEAR: f64 = 52.0;

// ============================================================================
// Observed Data
// ============================================================================

/// One row of a reference table: `[week, mean, lower, upper]`.
///
/// In YAML a record is written as a sequence. The bounds may be left out for
/// indicators that only report a point estimate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordRow", into = "RecordRow")]
pub struct ObservedRecord {
    pub week: Week,
    pub mean: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Sequence form of a record
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecordRow {
    Full(Week, f64, f64, f64),
    Point(Week, f64),
}

impl From<RecordRow> for ObservedRecord {
    fn from(row: RecordRow) -> Self {
        match row {
            RecordRow::Full(week, mean, lower, upper) => ObservedRecord::new(week, mean, lower, upper),
            RecordRow::Point(week, mean) => ObservedRecord::point(week, mean),
        }
    }
}

impl From<ObservedRecord> for RecordRow {
    fn from(record: ObservedRecord) -> Self {
        match record.bounds() {
            Some((lower, upper)) => RecordRow::Full(record.week, record.mean, lower, upper),
            None => RecordRow::Point(record.week, record.mean),
        }
    }
}

impl ObservedRecord {
    pub fn new(week: Week, mean: f64, lower: f64, upper: f64) -> Self {
        Self {
            week,
            mean,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Record with a point estimate only
    pub fn point(week: Week, mean: f64) -> Self {
        Self {
            week,
            mean,
            lower: None,
            upper: None,
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => Some((l, u)),
            _ => None,
        }
    }
}

/// Sparse observations of one indicator, sorted by week
pub type ObservedSeries = Vec<ObservedRecord>;

// ============================================================================
// Aligned Tracks
// ============================================================================

/// Per-week calibration target for one indicator.
///
/// All three vectors have one entry per week of the calibration horizon;
/// `None` marks a week without an observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignedTargetTrack {
    pub mean: Vec<Option<f64>>,
    pub variance: Vec<Option<f64>>,
    pub sample_size: Vec<Option<u64>>,
}

impl AlignedTargetTrack {
    /// Track with every week absent
    pub fn absent(horizon_weeks: usize) -> Self {
        Self {
            mean: vec![None; horizon_weeks],
            variance: vec![None; horizon_weeks],
            sample_size: vec![None; horizon_weeks],
        }
    }

    pub fn horizon(&self) -> usize {
        self.mean.len()
    }

    /// Weeks that carry an observed mean
    pub fn present_weeks(&self) -> Vec<Week> {
        self.mean
            .iter()
            .enumerate()
            .filter_map(|(w, m)| m.map(|_| w))
            .collect()
    }

    pub fn is_all_absent(&self) -> bool {
        self.mean.iter().all(Option::is_none)
    }
}

// ============================================================================
// Alignment Strategy
// ============================================================================

/// Which record(s) of a series designate the calibration week(s)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSelector {
    FirstRecord,
    LastRecord,
    /// Record at a fixed position from the start
    NthRecord(usize),
    /// Record at a fixed position from the end (0 = last)
    NthFromLast(usize),
    /// Any record inside `records[low..high]`; the first record with a
    /// matching week wins
    IndexRange { low: usize, high: usize },
    /// Weeks of `records[low..high]`; the k-th of those weeks takes its
    /// values from `records[k]` of the whole series
    WindowWeeksByPosition { low: usize, high: usize },
}

/// Confidence-interval bounds used by the quarter-range rule
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsSource {
    /// Bounds of the designated record itself
    OwnRecord,
    /// Bounds supplied explicitly, usually taken from another indicator
    Borrowed { lower: f64, upper: f64 },
}

/// How the variance of a calibration target is derived
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceRule {
    /// `0.25 * (upper - lower) * scale`
    QuarterRange { bounds: BoundsSource },
    /// `0.25 * relative_width * mean * scale`
    RelativeHeuristic { relative_width: f64 },
}

impl VarianceRule {
    pub const QUARTER_RANGE: VarianceRule = VarianceRule::QuarterRange {
        bounds: BoundsSource::OwnRecord,
    };
}

/// Kind of interval reported around a survey estimate
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    /// 'c': confidence interval
    Confidence,
    /// 'p': percentile interval
    Percentile,
}

impl IntervalType {
    pub fn code(&self) -> char {
        match self {
            IntervalType::Confidence => 'c',
            IntervalType::Percentile => 'p',
        }
    }
}

/// How the effective sample size of a calibration target is derived
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSizeRule {
    Survey(IntervalType),
    NotReported,
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal configuration errors raised while building calibration targets
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Horizon must cover at least one week
    InvalidHorizon(usize),

    /// Scale factor must be positive
    InvalidScale { series: String, scale: f64 },

    /// Series has no records but a single-record selector was used
    EmptySeries { series: String },

    /// Designated record index is outside the series
    IndexOutOfRange {
        series: String,
        index: usize,
        len: usize,
    },

    /// `NthFromLast` offset reaches before the first record (0 = last)
    FromLastOutOfRange {
        series: String,
        offset: usize,
        len: usize,
    },

    /// `IndexRange` window does not fit the series
    InvalidWindow {
        series: String,
        low: usize,
        high: usize,
        len: usize,
    },

    /// Designated record has no interval bounds but the rule needs them
    MissingBounds { series: String, week: Week },

    /// Survey size cannot be derived from the given interval
    InvalidInterval {
        series: String,
        mean: f64,
        lower: f64,
        upper: f64,
    },

    /// By-age table does not have one series per age group
    AgeGroupCount {
        table: String,
        expected: usize,
        found: usize,
    },

    /// Records are not sorted by week
    UnsortedSeries { series: String, position: usize },

    /// Feasible range with `min > max`
    InvalidFeasibleRange { name: String, min: f64, max: f64 },

    /// YAML could not be parsed
    Parse(String),
}

impl CalibrationError {
    /// Attach the indicator name to an error raised without one
    pub fn in_series(self, name: &str) -> Self {
        match self {
            CalibrationError::InvalidScale { scale, .. } => CalibrationError::InvalidScale {
                series: name.to_string(),
                scale,
            },
            CalibrationError::EmptySeries { .. } => CalibrationError::EmptySeries {
                series: name.to_string(),
            },
            CalibrationError::IndexOutOfRange { index, len, .. } => {
                CalibrationError::IndexOutOfRange {
                    series: name.to_string(),
                    index,
                    len,
                }
            }
            CalibrationError::FromLastOutOfRange { offset, len, .. } => {
                CalibrationError::FromLastOutOfRange {
                    series: name.to_string(),
                    offset,
                    len,
                }
            }
            CalibrationError::InvalidWindow { low, high, len, .. } => {
                CalibrationError::InvalidWindow {
                    series: name.to_string(),
                    low,
                    high,
                    len,
                }
            }
            CalibrationError::MissingBounds { week, .. } => CalibrationError::MissingBounds {
                series: name.to_string(),
                week,
            },
            CalibrationError::InvalidInterval {
                mean, lower, upper, ..
            } => CalibrationError::InvalidInterval {
                series: name.to_string(),
                mean,
                lower,
                upper,
            },
            CalibrationError::UnsortedSeries { position, .. } => {
                CalibrationError::UnsortedSeries {
                    series: name.to_string(),
                    position,
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::InvalidHorizon(h) => {
                write!(f, "calibration horizon must be > 0 weeks (got {})", h)
            }
            CalibrationError::InvalidScale { series, scale } => {
                write!(f, "{}: scale factor must be > 0 (got {})", series, scale)
            }
            CalibrationError::EmptySeries { series } => {
                write!(f, "{}: series has no records", series)
            }
            CalibrationError::IndexOutOfRange { series, index, len } => write!(
                f,
                "{}: record index {} out of range (series has {} records)",
                series, index, len
            ),
            CalibrationError::FromLastOutOfRange {
                series,
                offset,
                len,
            } => write!(
                f,
                "{}: record index -{} out of range (series has {} records)",
                series,
                offset + 1,
                len
            ),
            CalibrationError::InvalidWindow {
                series,
                low,
                high,
                len,
            } => write!(
                f,
                "{}: window [{}:{}] does not fit series of {} records",
                series, low, high, len
            ),
            CalibrationError::MissingBounds { series, week } => {
                write!(f, "{}: record at week {} has no interval bounds", series, week)
            }
            CalibrationError::InvalidInterval {
                series,
                mean,
                lower,
                upper,
            } => write!(
                f,
                "{}: cannot estimate survey size from mean={} interval=[{}, {}]",
                series, mean, lower, upper
            ),
            CalibrationError::AgeGroupCount {
                table,
                expected,
                found,
            } => write!(
                f,
                "{}: expected {} age groups, found {}",
                table, expected, found
            ),
            CalibrationError::UnsortedSeries { series, position } => {
                write!(f, "{}: records not sorted by week at position {}", series, position)
            }
            CalibrationError::InvalidFeasibleRange { name, min, max } => {
                write!(f, "{}: feasible range min {} > max {}", name, min, max)
            }
            CalibrationError::Parse(msg) => write!(f, "failed to parse YAML: {}", msg),
        }
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_yaml_sequence() {
        let full: ObservedRecord = serde_yaml::from_str("[3, 50.0, 40.0, 60.0]").unwrap();
        assert_eq!(full, ObservedRecord::new(3, 50.0, 40.0, 60.0));

        let point: ObservedRecord = serde_yaml::from_str("[70, 33.5]").unwrap();
        assert_eq!(point, ObservedRecord::point(70, 33.5));
        assert_eq!(point.bounds(), None);

        assert!(serde_yaml::from_str::<ObservedRecord>("[3]").is_err());
        assert!(serde_yaml::from_str::<ObservedRecord>("{week: 3, mean: 1.0}").is_err());
    }

    #[test]
    fn test_record_written_as_sequence() {
        let yaml = serde_yaml::to_string(&vec![
            ObservedRecord::new(52, 620.5, 588.3, 652.7),
            ObservedRecord::point(65, 41.0),
        ])
        .unwrap();
        let back: ObservedSeries = serde_yaml::from_str(&yaml).unwrap();

        assert!(!yaml.contains("week"));
        assert_eq!(back[0], ObservedRecord::new(52, 620.5, 588.3, 652.7));
        assert_eq!(back[1], ObservedRecord::point(65, 41.0));
    }

    #[test]
    fn test_absent_track_has_full_length() {
        let track = AlignedTargetTrack::absent(12);
        assert_eq!(track.horizon(), 12);
        assert_eq!(track.variance.len(), 12);
        assert_eq!(track.sample_size.len(), 12);
        assert!(track.is_all_absent());
        assert!(track.present_weeks().is_empty());
    }

    #[test]
    fn test_in_series_names_the_indicator() {
        let err = CalibrationError::IndexOutOfRange {
            series: String::new(),
            index: 4,
            len: 2,
        }
        .in_series("cum_vacc_rate");

        assert_eq!(
            err.to_string(),
            "cum_vacc_rate: record index 4 out of range (series has 2 records)"
        );
    }

    #[test]
    fn test_from_last_error_counts_from_the_end() {
        let err = CalibrationError::FromLastOutOfRange {
            series: String::new(),
            offset: 1,
            len: 1,
        }
        .in_series("cum_vacc_rate_by_age/30-49");

        assert_eq!(
            err.to_string(),
            "cum_vacc_rate_by_age/30-49: record index -2 out of range (series has 1 records)"
        );
    }

    #[test]
    fn test_interval_codes() {
        assert_eq!(IntervalType::Confidence.code(), 'c');
        assert_eq!(IntervalType::Percentile.code(), 'p');
    }
}

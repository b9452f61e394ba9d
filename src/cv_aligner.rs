//! Calibration Target Alignment
//!
//! Turns a sparse observed series into a per-week target track over the
//! calibration horizon. Matching is by exact week: a week carries a value
//! only if it equals the week of the designated record, there is no
//! interpolation between observations.

use crate::cv_interface::{
    AlignedTargetTrack, BoundsSource, CalibrationError, ObservedRecord, RecordSelector,
    SampleSizeRule, VarianceRule,
};
use crate::cv_survey::SurveySizeEstimator;

/// How one indicator is aligned
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlignmentSpec {
    pub selector: RecordSelector,
    pub scale: f64,
    pub variance: VarianceRule,
    pub sample_size: SampleSizeRule,
}

/// Records of `series` that can designate a calibration week
enum Designated<'a> {
    Single(&'a ObservedRecord),
    Window(&'a [ObservedRecord]),
    ByPosition {
        window: &'a [ObservedRecord],
        table: &'a [ObservedRecord],
    },
}

impl<'a> Designated<'a> {
    fn resolve(
        series: &'a [ObservedRecord],
        selector: RecordSelector,
    ) -> Result<Self, CalibrationError> {
        let out_of_range = |index: usize| CalibrationError::IndexOutOfRange {
            series: String::new(),
            index,
            len: series.len(),
        };

        match selector {
            RecordSelector::FirstRecord => series
                .first()
                .map(Designated::Single)
                .ok_or(CalibrationError::EmptySeries {
                    series: String::new(),
                }),
            RecordSelector::LastRecord => series
                .last()
                .map(Designated::Single)
                .ok_or(CalibrationError::EmptySeries {
                    series: String::new(),
                }),
            RecordSelector::NthRecord(index) => series
                .get(index)
                .map(Designated::Single)
                .ok_or_else(|| out_of_range(index)),
            RecordSelector::NthFromLast(offset) => series
                .len()
                .checked_sub(offset + 1)
                .and_then(|index| series.get(index))
                .map(Designated::Single)
                .ok_or_else(|| CalibrationError::FromLastOutOfRange {
                    series: String::new(),
                    offset,
                    len: series.len(),
                }),
            RecordSelector::IndexRange { low, high } => {
                Ok(Designated::Window(window(series, low, high)?))
            }
            RecordSelector::WindowWeeksByPosition { low, high } => Ok(Designated::ByPosition {
                window: window(series, low, high)?,
                table: series,
            }),
        }
    }

    fn matching(&self, week: usize) -> Option<&'a ObservedRecord> {
        match *self {
            Designated::Single(record) => (record.week == week).then_some(record),
            Designated::Window(window) => window.iter().find(|r| r.week == week),
            Designated::ByPosition { window, table } => window
                .iter()
                .position(|r| r.week == week)
                .and_then(|k| table.get(k)),
        }
    }
}

fn window(
    series: &[ObservedRecord],
    low: usize,
    high: usize,
) -> Result<&[ObservedRecord], CalibrationError> {
    if low > high || high > series.len() {
        return Err(CalibrationError::InvalidWindow {
            series: String::new(),
            low,
            high,
            len: series.len(),
        });
    }
    Ok(&series[low..high])
}

/// Variance of one designated record under `rule`
pub fn record_variance(
    record: &ObservedRecord,
    rule: VarianceRule,
    scale: f64,
) -> Result<f64, CalibrationError> {
    match rule {
        VarianceRule::QuarterRange { bounds } => {
            let (lower, upper) = match bounds {
                BoundsSource::OwnRecord => {
                    record
                        .bounds()
                        .ok_or_else(|| CalibrationError::MissingBounds {
                            series: String::new(),
                            week: record.week,
                        })?
                }
                BoundsSource::Borrowed { lower, upper } => (lower, upper),
            };
            Ok(0.25 * (upper - lower) * scale)
        }
        VarianceRule::RelativeHeuristic { relative_width } => {
            Ok(0.25 * relative_width * record.mean * scale)
        }
    }
}

/// Align `series` to weeks `0..horizon_weeks`.
///
/// The designated record is resolved before the first week is visited, so a
/// malformed table fails even when none of its weeks fall in the horizon.
pub fn align(
    series: &[ObservedRecord],
    horizon_weeks: usize,
    spec: &AlignmentSpec,
    estimator: &dyn SurveySizeEstimator,
) -> Result<AlignedTargetTrack, CalibrationError> {
    if horizon_weeks == 0 {
        return Err(CalibrationError::InvalidHorizon(horizon_weeks));
    }
    if !(spec.scale > 0.0) {
        return Err(CalibrationError::InvalidScale {
            series: String::new(),
            scale: spec.scale,
        });
    }

    let designated = Designated::resolve(series, spec.selector)?;
    let mut track = AlignedTargetTrack::absent(horizon_weeks);

    for week in 0..horizon_weeks {
        let Some(record) = designated.matching(week) else {
            continue;
        };

        track.mean[week] = Some(record.mean * spec.scale);
        track.variance[week] = Some(record_variance(record, spec.variance, spec.scale)?);
        track.sample_size[week] = match spec.sample_size {
            SampleSizeRule::Survey(interval_type) => {
                let (lower, upper) =
                    record
                        .bounds()
                        .ok_or_else(|| CalibrationError::MissingBounds {
                            series: String::new(),
                            week: record.week,
                        })?;
                Some(estimator.estimate_effective_n(
                    record.mean,
                    lower,
                    upper,
                    spec.scale,
                    interval_type,
                )?)
            }
            SampleSizeRule::NotReported => None,
        };
    }

    Ok(track)
}

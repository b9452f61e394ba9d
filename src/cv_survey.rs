//! Effective survey sample size
//!
//! Back-calculates the size of a survey that would produce the reported
//! estimate and interval. The calibration likelihood uses it to weight each
//! target; the estimator is a seam so the likelihood side can bring its own.

use crate::cv_interface::{CalibrationError, IntervalType};

/// z-value of a two-sided 95% interval
const Z_95: f64 = 1.96;

pub trait SurveySizeEstimator {
    /// Effective sample size for `mean` with interval `[lower, upper]`.
    ///
    /// All three values are multiplied by `scale` before use, so tables in
    /// percent or per-100,000 units can be passed as they are.
    fn estimate_effective_n(
        &self,
        mean: f64,
        lower: f64,
        upper: f64,
        scale: f64,
        interval_type: IntervalType,
    ) -> Result<u64, CalibrationError>;
}

/// Normal approximation of a binomial proportion.
///
/// A confidence interval gives `n = p(1-p) / sd^2`. A percentile interval is
/// read as the interval of a Beta posterior, whose variance is
/// `p(1-p) / (n + 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinomialSurveySize;

impl SurveySizeEstimator for BinomialSurveySize {
    fn estimate_effective_n(
        &self,
        mean: f64,
        lower: f64,
        upper: f64,
        scale: f64,
        interval_type: IntervalType,
    ) -> Result<u64, CalibrationError> {
        let p = mean * scale;
        let l = lower * scale;
        let u = upper * scale;

        let invalid = || CalibrationError::InvalidInterval {
            series: String::new(),
            mean,
            lower,
            upper,
        };

        if !(p > 0.0 && p < 1.0) || !(u > l) {
            return Err(invalid());
        }

        let sd = (u - l) / (2.0 * Z_95);
        let base = p * (1.0 - p) / (sd * sd);
        let n = match interval_type {
            IntervalType::Confidence => base,
            IntervalType::Percentile => base - 1.0,
        };

        if !n.is_finite() {
            return Err(invalid());
        }

        Ok(n.round().max(1.0) as u64)
    }
}

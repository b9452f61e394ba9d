//! Calibration Targets
//!
//! Declares, per indicator, which reference table feeds it and how that table
//! is aligned, then builds every track eagerly over the calibration horizon.
//! The likelihood side of the simulator reads the tracks by label.

use crate::cv_aligner::{align, AlignmentSpec};
use crate::cv_definitions::AgeGroup;
use crate::cv_interface::{
    AlignedTargetTrack, BoundsSource, CalibrationError, IntervalType, ObservedSeries,
    RecordSelector, SampleSizeRule, VarianceRule, PERCENT, PER_100K,
};
use crate::cv_reference_data::ReferenceTables;
use crate::cv_survey::SurveySizeEstimator;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Age groups without vaccination-by-age data during calibration (0-4, 5-12)
pub const VACC_BY_AGE_SKIPPED_GROUPS: usize = 2;

/// Relative interval width assumed for vaccination-by-age point estimates
pub const VACC_BY_AGE_RELATIVE_WIDTH: f64 = 0.4;

// ============================================================================
// Indicators
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetKey {
    CumHospRate,
    CumHospRateByAge(AgeGroup),
    PrevImmuneFromInf,
    CumVaccRate,
    CumVaccRateByAge(AgeGroup),
    PercInfWithNovel,
}

impl TargetKey {
    pub fn label(&self) -> String {
        match self {
            TargetKey::CumHospRate => "cum_hosp_rate".to_string(),
            TargetKey::CumHospRateByAge(age) => format!("cum_hosp_rate_by_age/{}", age),
            TargetKey::PrevImmuneFromInf => "prev_immune_from_inf".to_string(),
            TargetKey::CumVaccRate => "cum_vacc_rate".to_string(),
            TargetKey::CumVaccRateByAge(age) => format!("cum_vacc_rate_by_age/{}", age),
            TargetKey::PercInfWithNovel => "perc_inf_with_novel".to_string(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Which interval bounds the immunity-prevalence variance is computed from.
///
/// The dataset historically computed it from the first record of the overall
/// cumulative hospitalization table rather than from the immunity table
/// itself; both are kept selectable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmunityVarianceBounds {
    #[default]
    CumHospRateOverall,
    OwnRecord,
}

/// Which record supplies the values of a novel-variant calibration week.
///
/// Weeks always come from the configured window. Historically the values of
/// the k-th window week were read from the k-th record of the whole table;
/// `window_record` reads the record of that week instead.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NovelValueRecord {
    #[default]
    FullTableIndex,
    WindowRecord,
}

/// Tunable parts of the target construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetOptions {
    pub immunity_variance_bounds: ImmunityVarianceBounds,

    /// Records `[low, high)` of the novel-variant table used for calibration
    pub perc_novel_window: (usize, usize),

    pub novel_value_record: NovelValueRecord,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            immunity_variance_bounds: ImmunityVarianceBounds::default(),
            perc_novel_window: (3, 10),
            novel_value_record: NovelValueRecord::default(),
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// One indicator ready to align; `spec == None` leaves the track absent
pub struct TargetPlan<'a> {
    pub key: TargetKey,
    pub series: &'a ObservedSeries,
    pub spec: Option<AlignmentSpec>,
}

/// Alignment plan for every indicator, in output order
pub fn plan_targets<'a>(
    tables: &'a ReferenceTables,
    options: &TargetOptions,
) -> Result<Vec<TargetPlan<'a>>, CalibrationError> {
    let mut plans = Vec::new();

    plans.push(TargetPlan {
        key: TargetKey::CumHospRate,
        series: &tables.cum_hosp_rate_overall,
        spec: Some(AlignmentSpec {
            selector: RecordSelector::FirstRecord,
            scale: PER_100K,
            variance: VarianceRule::QUARTER_RANGE,
            sample_size: SampleSizeRule::Survey(IntervalType::Confidence),
        }),
    });

    for (age, series) in AgeGroup::ALL.iter().zip(tables.cum_hosp_rate_by_age.iter()) {
        plans.push(TargetPlan {
            key: TargetKey::CumHospRateByAge(*age),
            series,
            spec: Some(AlignmentSpec {
                selector: RecordSelector::FirstRecord,
                scale: PER_100K,
                variance: VarianceRule::QUARTER_RANGE,
                sample_size: SampleSizeRule::Survey(IntervalType::Percentile),
            }),
        });
    }

    let immunity_bounds = match options.immunity_variance_bounds {
        ImmunityVarianceBounds::OwnRecord => BoundsSource::OwnRecord,
        ImmunityVarianceBounds::CumHospRateOverall => {
            let name = TargetKey::CumHospRate.label();
            let first = tables
                .cum_hosp_rate_overall
                .first()
                .ok_or(CalibrationError::EmptySeries {
                    series: name.clone(),
                })?;
            let (lower, upper) = first.bounds().ok_or(CalibrationError::MissingBounds {
                series: name,
                week: first.week,
            })?;
            BoundsSource::Borrowed { lower, upper }
        }
    };
    plans.push(TargetPlan {
        key: TargetKey::PrevImmuneFromInf,
        series: &tables.prev_immune_from_inf,
        spec: Some(AlignmentSpec {
            selector: RecordSelector::FirstRecord,
            scale: PERCENT,
            variance: VarianceRule::QuarterRange {
                bounds: immunity_bounds,
            },
            sample_size: SampleSizeRule::NotReported,
        }),
    });

    plans.push(TargetPlan {
        key: TargetKey::CumVaccRate,
        series: &tables.vaccine_coverage_over_time,
        spec: Some(AlignmentSpec {
            selector: RecordSelector::LastRecord,
            scale: PERCENT,
            variance: VarianceRule::QUARTER_RANGE,
            sample_size: SampleSizeRule::Survey(IntervalType::Confidence),
        }),
    });

    for (age, series) in AgeGroup::ALL
        .iter()
        .zip(tables.vaccine_coverage_by_age.iter())
    {
        let spec = (age.index() >= VACC_BY_AGE_SKIPPED_GROUPS).then_some(AlignmentSpec {
            selector: RecordSelector::NthFromLast(1),
            scale: PERCENT,
            variance: VarianceRule::RelativeHeuristic {
                relative_width: VACC_BY_AGE_RELATIVE_WIDTH,
            },
            sample_size: SampleSizeRule::NotReported,
        });
        plans.push(TargetPlan {
            key: TargetKey::CumVaccRateByAge(*age),
            series,
            spec,
        });
    }

    let (low, high) = options.perc_novel_window;
    plans.push(TargetPlan {
        key: TargetKey::PercInfWithNovel,
        series: &tables.perc_inf_with_novel,
        spec: Some(AlignmentSpec {
            selector: match options.novel_value_record {
                NovelValueRecord::FullTableIndex => {
                    RecordSelector::WindowWeeksByPosition { low, high }
                }
                NovelValueRecord::WindowRecord => RecordSelector::IndexRange { low, high },
            },
            scale: PERCENT,
            variance: VarianceRule::QUARTER_RANGE,
            sample_size: SampleSizeRule::Survey(IntervalType::Confidence),
        }),
    });

    Ok(plans)
}

// ============================================================================
// Built Targets
// ============================================================================

/// Aligned calibration targets, keyed by indicator label in plan order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTargets {
    pub horizon_weeks: usize,
    pub tracks: IndexMap<String, AlignedTargetTrack>,
}

impl CalibrationTargets {
    pub fn build(
        tables: &ReferenceTables,
        horizon_weeks: usize,
        options: &TargetOptions,
        estimator: &dyn SurveySizeEstimator,
    ) -> Result<Self, CalibrationError> {
        if horizon_weeks == 0 {
            return Err(CalibrationError::InvalidHorizon(horizon_weeks));
        }

        let mut tracks = IndexMap::new();
        for plan in plan_targets(tables, options)? {
            let label = plan.key.label();
            let track = match plan.spec {
                Some(spec) => align(plan.series, horizon_weeks, &spec, estimator)
                    .map_err(|e| e.in_series(&label))?,
                None => AlignedTargetTrack::absent(horizon_weeks),
            };
            debug!("{}: weeks with data {:?}", label, track.present_weeks());
            tracks.insert(label, track);
        }

        let with_data = tracks.values().filter(|t| !t.is_all_absent()).count();
        info!(
            "Built {} calibration tracks over {} weeks ({} with data)",
            tracks.len(),
            horizon_weeks,
            with_data
        );

        Ok(Self {
            horizon_weeks,
            tracks,
        })
    }

    pub fn get(&self, key: &TargetKey) -> Option<&AlignedTargetTrack> {
        self.tracks.get(&key.label())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_definitions::{weeks_in_period, CALIB_PERIOD};
    use crate::cv_interface::ObservedRecord;
    use crate::cv_reference_data::ReferenceData;
    use crate::cv_survey::BinomialSurveySize;

    fn builtin() -> ReferenceTables {
        ReferenceData::builtin().unwrap().tables
    }

    fn build(tables: &ReferenceTables, options: &TargetOptions) -> CalibrationTargets {
        CalibrationTargets::build(
            tables,
            weeks_in_period(CALIB_PERIOD),
            options,
            &BinomialSurveySize,
        )
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_every_track_spans_the_horizon() {
        let targets = build(&builtin(), &TargetOptions::default());

        // overall + 8 by age + immunity + vaccination + 8 by age + novel
        assert_eq!(targets.len(), 20);
        for (label, track) in &targets.tracks {
            assert_eq!(track.mean.len(), 78, "{}", label);
            assert_eq!(track.variance.len(), 78, "{}", label);
            assert_eq!(track.sample_size.len(), 78, "{}", label);
        }
    }

    #[test]
    fn test_tracks_are_in_plan_order() {
        let targets = build(&builtin(), &TargetOptions::default());
        let labels: Vec<&String> = targets.tracks.keys().collect();

        assert_eq!(labels[0], "cum_hosp_rate");
        assert_eq!(labels[1], "cum_hosp_rate_by_age/0-4");
        assert_eq!(labels[9], "prev_immune_from_inf");
        assert_eq!(labels[10], "cum_vacc_rate");
        assert_eq!(labels[19], "perc_inf_with_novel");
    }

    #[test]
    fn test_overall_hospitalization_target() {
        let tables = builtin();
        let targets = build(&tables, &TargetOptions::default());
        let track = targets.get(&TargetKey::CumHospRate).unwrap();
        let first = tables.cum_hosp_rate_overall[0];

        assert_eq!(track.present_weeks(), vec![first.week]);
        let w = first.week;
        assert!(close(track.mean[w].unwrap(), first.mean * PER_100K));
        let (l, u) = first.bounds().unwrap();
        assert!(close(track.variance[w].unwrap(), 0.25 * (u - l) * PER_100K));
        assert!(track.sample_size[w].unwrap() > 0);
    }

    #[test]
    fn test_vaccination_by_age_skips_first_two_groups() {
        let mut tables = builtin();
        // data for the skipped groups must still be ignored
        tables.vaccine_coverage_by_age[0] = vec![
            ObservedRecord::point(10, 1.0),
            ObservedRecord::point(20, 2.0),
        ];
        tables.vaccine_coverage_by_age[1] = tables.vaccine_coverage_by_age[0].clone();

        let targets = build(&tables, &TargetOptions::default());

        for age in [AgeGroup::Age0To4, AgeGroup::Age5To12] {
            let track = targets.get(&TargetKey::CumVaccRateByAge(age)).unwrap();
            assert_eq!(track.horizon(), 78);
            assert!(track.is_all_absent());
            assert!(track.variance.iter().all(Option::is_none));
        }

        let adults = targets
            .get(&TargetKey::CumVaccRateByAge(AgeGroup::Age30To49))
            .unwrap();
        let second_to_last = tables.vaccine_coverage_by_age[4][1];
        assert_eq!(adults.present_weeks(), vec![second_to_last.week]);
        let w = second_to_last.week;
        assert!(close(
            adults.variance[w].unwrap(),
            0.25 * 0.4 * second_to_last.mean * PERCENT
        ));
        assert_eq!(adults.sample_size[w], None);
    }

    #[test]
    fn test_immunity_variance_bounds_are_selectable() {
        let tables = builtin();
        let imm = tables.prev_immune_from_inf[0];
        let hosp = tables.cum_hosp_rate_overall[0];
        let w = imm.week;

        let borrowed = build(&tables, &TargetOptions::default());
        let track = borrowed.get(&TargetKey::PrevImmuneFromInf).unwrap();
        let (hl, hu) = hosp.bounds().unwrap();
        assert!(close(track.variance[w].unwrap(), 0.25 * (hu - hl) * PERCENT));

        let own = build(
            &tables,
            &TargetOptions {
                immunity_variance_bounds: ImmunityVarianceBounds::OwnRecord,
                ..Default::default()
            },
        );
        let track = own.get(&TargetKey::PrevImmuneFromInf).unwrap();
        let (il, iu) = imm.bounds().unwrap();
        assert!(close(track.variance[w].unwrap(), 0.25 * (iu - il) * PERCENT));

        assert!(track.sample_size.iter().all(Option::is_none));
    }

    #[test]
    fn test_novel_variant_window() {
        let tables = builtin();
        let targets = build(&tables, &TargetOptions::default());
        let track = targets.get(&TargetKey::PercInfWithNovel).unwrap();

        let expected: Vec<usize> = tables.perc_inf_with_novel[3..10]
            .iter()
            .map(|r| r.week)
            .collect();
        assert_eq!(track.present_weeks(), expected);

        // the k-th window week reads the k-th record of the whole table
        let week = tables.perc_inf_with_novel[3].week;
        let first = tables.perc_inf_with_novel[0];
        assert!(close(track.mean[week].unwrap(), first.mean * PERCENT));
        let (l, u) = first.bounds().unwrap();
        assert!(close(track.variance[week].unwrap(), 0.25 * (u - l) * PERCENT));
        assert!(track.sample_size[week].is_some());

        let last_week = tables.perc_inf_with_novel[9].week;
        let seventh = tables.perc_inf_with_novel[6];
        assert!(close(track.mean[last_week].unwrap(), seventh.mean * PERCENT));
    }

    #[test]
    fn test_novel_variant_window_record_values() {
        let tables = builtin();
        let options = TargetOptions {
            novel_value_record: NovelValueRecord::WindowRecord,
            ..Default::default()
        };
        let targets = build(&tables, &options);
        let track = targets.get(&TargetKey::PercInfWithNovel).unwrap();

        assert_eq!(track.present_weeks().len(), 7);
        for r in &tables.perc_inf_with_novel[3..10] {
            assert!(close(track.mean[r.week].unwrap(), r.mean * PERCENT));
        }
    }

    #[test]
    fn test_vaccination_uses_last_record() {
        let tables = builtin();
        let targets = build(&tables, &TargetOptions::default());
        let track = targets.get(&TargetKey::CumVaccRate).unwrap();

        let last = tables.vaccine_coverage_over_time.last().unwrap();
        assert_eq!(track.present_weeks(), vec![last.week]);
    }

    #[test]
    fn test_errors_name_the_indicator() {
        let mut tables = builtin();
        tables.vaccine_coverage_by_age[5].truncate(1);

        let err = CalibrationTargets::build(
            &tables,
            78,
            &TargetOptions::default(),
            &BinomialSurveySize,
        )
        .unwrap_err();

        assert_eq!(
            err,
            CalibrationError::FromLastOutOfRange {
                series: "cum_vacc_rate_by_age/50-64".to_string(),
                offset: 1,
                len: 1,
            }
        );
    }

    #[test]
    fn test_window_outside_table_is_fatal() {
        let options = TargetOptions {
            perc_novel_window: (3, 40),
            ..Default::default()
        };
        let err = CalibrationTargets::build(&builtin(), 78, &options, &BinomialSurveySize)
            .unwrap_err();

        assert!(matches!(err, CalibrationError::InvalidWindow { high: 40, .. }));
    }
}

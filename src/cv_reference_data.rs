//! Reference Tables
//!
//! The observational dataset the calibration targets and figure overlays are
//! derived from. A copy ships embedded in the crate; other versions can be
//! loaded from YAML text. Every loaded dataset carries a blake3 fingerprint
//! of its source so a settings file records exactly which data built it.

use crate::cv_definitions::AgeGroup;
use crate::cv_interface::{CalibrationError, ObservedSeries};
use log::info;
use serde::{Deserialize, Serialize};

const BUILTIN_TABLES: &str = include_str!("../data/reference_tables.yaml");

/// Plausible value ranges used as visual sanity bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibleBounds {
    pub min_hosp_occ_rate: f64,
    pub max_hosp_occ_rate: f64,
    pub min_hosp_rate_overall: f64,
    pub max_hosp_rate_overall: f64,
    pub max_prev_immune_from_inf: f64,
    /// Upper bound of the new hospitalization rate per age group
    #[serde(default)]
    pub max_hosp_rate_by_age: Vec<f64>,
}

/// Observed indicator series, in the units of the source tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub cum_hosp_rate_overall: ObservedSeries,
    pub cum_hosp_rate_by_age: Vec<ObservedSeries>,
    pub hosp_age_dist: Vec<ObservedSeries>,
    pub prev_immune_from_inf: ObservedSeries,
    pub vaccine_coverage_over_time: ObservedSeries,
    pub vaccine_coverage_by_age: Vec<ObservedSeries>,
    pub perc_inf_with_novel: ObservedSeries,
    pub feasible: FeasibleBounds,
}

impl ReferenceTables {
    /// Check the shape of the dataset before anything is aligned to it
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let by_age = [
            ("cum_hosp_rate_by_age", &self.cum_hosp_rate_by_age),
            ("hosp_age_dist", &self.hosp_age_dist),
            ("vaccine_coverage_by_age", &self.vaccine_coverage_by_age),
        ];
        for (table, series) in by_age {
            if series.len() != AgeGroup::COUNT {
                return Err(CalibrationError::AgeGroupCount {
                    table: table.to_string(),
                    expected: AgeGroup::COUNT,
                    found: series.len(),
                });
            }
            for (age, s) in AgeGroup::ALL.iter().zip(series.iter()) {
                check_sorted(&format!("{}/{}", table, age), s)?;
            }
        }

        check_sorted("cum_hosp_rate_overall", &self.cum_hosp_rate_overall)?;
        check_sorted("prev_immune_from_inf", &self.prev_immune_from_inf)?;
        check_sorted("vaccine_coverage_over_time", &self.vaccine_coverage_over_time)?;
        check_sorted("perc_inf_with_novel", &self.perc_inf_with_novel)?;

        let f = &self.feasible;
        check_range("hosp_occ_rate", f.min_hosp_occ_rate, f.max_hosp_occ_rate)?;
        check_range(
            "hosp_rate_overall",
            f.min_hosp_rate_overall,
            f.max_hosp_rate_overall,
        )?;
        check_range("prev_immune_from_inf", 0.0, f.max_prev_immune_from_inf)?;

        if !f.max_hosp_rate_by_age.is_empty() && f.max_hosp_rate_by_age.len() != AgeGroup::COUNT {
            return Err(CalibrationError::AgeGroupCount {
                table: "feasible.max_hosp_rate_by_age".to_string(),
                expected: AgeGroup::COUNT,
                found: f.max_hosp_rate_by_age.len(),
            });
        }

        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, CalibrationError> {
        serde_yaml::to_string(self).map_err(|e| CalibrationError::Parse(e.to_string()))
    }
}

fn check_sorted(name: &str, series: &ObservedSeries) -> Result<(), CalibrationError> {
    match series.windows(2).position(|w| w[1].week < w[0].week) {
        Some(position) => Err(CalibrationError::UnsortedSeries {
            series: name.to_string(),
            position: position + 1,
        }),
        None => Ok(()),
    }
}

fn check_range(name: &str, min: f64, max: f64) -> Result<(), CalibrationError> {
    if min > max {
        return Err(CalibrationError::InvalidFeasibleRange {
            name: name.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

// ============================================================================
// Loaded Dataset
// ============================================================================

/// Validated tables plus the fingerprint of the text they came from
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub tables: ReferenceTables,
    pub fingerprint: String,
}

impl ReferenceData {
    /// Dataset embedded in the crate
    pub fn builtin() -> Result<Self, CalibrationError> {
        Self::from_yaml_str(BUILTIN_TABLES)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CalibrationError> {
        let tables: ReferenceTables =
            serde_yaml::from_str(yaml).map_err(|e| CalibrationError::Parse(e.to_string()))?;
        tables.validate()?;

        let fingerprint = fingerprint(yaml);
        info!(
            "Loaded reference tables {} ({} age groups)",
            &fingerprint[..16],
            tables.cum_hosp_rate_by_age.len()
        );

        Ok(Self {
            tables,
            fingerprint,
        })
    }
}

/// blake3 hex digest of a dataset's source text
pub fn fingerprint(source: &str) -> String {
    blake3::hash(source.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() {
        let data = ReferenceData::builtin().unwrap();
        let t = &data.tables;

        assert_eq!(t.cum_hosp_rate_by_age.len(), AgeGroup::COUNT);
        assert_eq!(t.vaccine_coverage_by_age.len(), AgeGroup::COUNT);
        assert!(t.vaccine_coverage_by_age[0].is_empty());
        assert!(t.vaccine_coverage_by_age[1].is_empty());
        // vaccination by age only reports point estimates
        assert!(t.vaccine_coverage_by_age[4].iter().all(|r| r.bounds().is_none()));
        // the novel-variant window [3, 10) must exist
        assert!(t.perc_inf_with_novel.len() >= 10);
        assert_eq!(data.fingerprint.len(), 64);
    }

    #[test]
    fn test_written_tables_load_back() {
        let data = ReferenceData::builtin().unwrap();
        let yaml = data.tables.to_yaml().unwrap();

        let reloaded = ReferenceData::from_yaml_str(&yaml).unwrap();
        assert_eq!(reloaded.tables, data.tables);
        assert_eq!(reloaded.fingerprint, fingerprint(&yaml));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        assert_eq!(fingerprint("a: 1"), fingerprint("a: 1"));
        assert_ne!(fingerprint("a: 1"), fingerprint("a: 2"));
    }

    #[test]
    fn test_rejects_wrong_age_group_count() {
        let mut tables = ReferenceData::builtin().unwrap().tables;
        tables.cum_hosp_rate_by_age.pop();

        assert_eq!(
            tables.validate(),
            Err(CalibrationError::AgeGroupCount {
                table: "cum_hosp_rate_by_age".to_string(),
                expected: 8,
                found: 7,
            })
        );
    }

    #[test]
    fn test_rejects_unsorted_series() {
        let mut tables = ReferenceData::builtin().unwrap().tables;
        tables.vaccine_coverage_over_time.swap(0, 1);

        assert!(matches!(
            tables.validate(),
            Err(CalibrationError::UnsortedSeries { position: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_feasible_range() {
        let mut tables = ReferenceData::builtin().unwrap().tables;
        tables.feasible.min_hosp_occ_rate = 100.0;

        assert!(matches!(
            tables.validate(),
            Err(CalibrationError::InvalidFeasibleRange { .. })
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ReferenceData::from_yaml_str("cum_hosp_rate_overall: 3").unwrap_err();
        assert!(matches!(err, CalibrationError::Parse(_)));
    }
}

// COVID Model Settings

use crate::cv_definitions::{weeks_in_period, CALIB_PERIOD, SIM_DURATION};
use crate::cv_interface::CalibrationError;
use crate::cv_reference_data::ReferenceData;
use crate::cv_survey::SurveySizeEstimator;
use crate::cv_targets::{CalibrationTargets, TargetOptions};
use log::info;
use serde::{Deserialize, Serialize};

/// One simulated day, in years
pub const DAY: f64 = 1.0 / 364.0;
/// One simulated week, in years
pub const WEEK: f64 = 7.0 / 364.0;

// ============================================================================
// Options
// ============================================================================

/// Choices made by whoever runs the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOptions {
    /// Build calibration targets and ask the simulator for likelihoods
    pub if_calibrating: bool,

    pub novel_variant_will_emerge: bool,

    pub mitigating_strategies_on: bool,

    /// Years of simulation
    pub simulation_duration: f64,

    /// Years of observed data used for calibration
    pub calibration_period: f64,

    /// Collect trajectories of every compartment (large output)
    pub if_collect_trajs_of_compartments: bool,

    pub targets: TargetOptions,
}

impl Default for SettingsOptions {
    fn default() -> Self {
        Self {
            if_calibrating: false,
            novel_variant_will_emerge: true,
            mitigating_strategies_on: true,
            simulation_duration: SIM_DURATION,
            calibration_period: CALIB_PERIOD,
            if_collect_trajs_of_compartments: false,
            targets: TargetOptions::default(),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Settings handed to the simulation engine.
///
/// Durations and periods are in years. Calibration targets exist only when
/// the settings are built for calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovidSettings {
    pub novel_variant_will_emerge: bool,
    pub mitigating_strategies_on: bool,

    // simulation
    pub delta_t: f64,
    pub max_sim_duration: f64,
    pub simulation_duration: f64,
    pub simulation_output_period: f64,
    pub observation_period: f64,
    pub time_to_start_decision_making: f64,

    // outputs
    pub if_collect_trajs_of_compartments: bool,
    pub store_projected_outcomes: bool,
    pub check_eradication_conditions: bool,
    pub store_parameter_values: bool,

    // economic evaluation
    pub warm_up_period: f64,
    pub collect_econ_eval: bool,
    pub annual_discount_rate: f64,

    // calibration
    pub calibration_period: f64,
    pub calc_likelihood: bool,
    pub calibration_targets: Option<CalibrationTargets>,

    /// Fingerprint of the reference tables the targets were built from
    pub reference_data_fingerprint: String,
}

impl CovidSettings {
    pub fn new(
        options: &SettingsOptions,
        data: &ReferenceData,
        estimator: &dyn SurveySizeEstimator,
    ) -> Result<Self, CalibrationError> {
        let calibration_targets = if options.if_calibrating {
            let horizon = weeks_in_period(options.calibration_period);
            Some(CalibrationTargets::build(
                &data.tables,
                horizon,
                &options.targets,
                estimator,
            )?)
        } else {
            None
        };

        info!(
            "Settings: duration {} years, calibrating: {}, reference data {}",
            options.simulation_duration,
            options.if_calibrating,
            &data.fingerprint[..16.min(data.fingerprint.len())]
        );

        Ok(Self {
            novel_variant_will_emerge: options.novel_variant_will_emerge,
            mitigating_strategies_on: options.mitigating_strategies_on,
            delta_t: DAY,
            max_sim_duration: 4.0,
            simulation_duration: options.simulation_duration,
            simulation_output_period: WEEK,
            observation_period: WEEK,
            // decisions start as soon as spread is detected
            time_to_start_decision_making: 0.0,
            if_collect_trajs_of_compartments: options.if_collect_trajs_of_compartments,
            store_projected_outcomes: true,
            check_eradication_conditions: true,
            store_parameter_values: true,
            warm_up_period: options.calibration_period,
            collect_econ_eval: false,
            annual_discount_rate: 0.0,
            calibration_period: options.calibration_period,
            calc_likelihood: options.if_calibrating,
            calibration_targets,
            reference_data_fingerprint: data.fingerprint.clone(),
        })
    }

    /// x-axis multiplier that shows prevalence outcomes in weeks
    pub fn prev_multiplier(&self) -> f64 {
        52.0
    }

    /// x-axis multiplier that shows incidence outcomes in weeks
    pub fn incd_multiplier(&self) -> f64 {
        self.simulation_output_period * 52.0
    }

    /// x-axis multiplier that shows observed incidence outcomes in weeks
    pub fn obs_incd_multiplier(&self) -> f64 {
        self.observation_period * 52.0
    }

    pub fn to_yaml(&self) -> Result<String, CalibrationError> {
        serde_yaml::to_string(self).map_err(|e| CalibrationError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_survey::BinomialSurveySize;
    use crate::cv_targets::TargetKey;

    #[test]
    fn test_default_settings_have_no_targets() {
        let data = ReferenceData::builtin().unwrap();
        let settings =
            CovidSettings::new(&SettingsOptions::default(), &data, &BinomialSurveySize).unwrap();

        assert!(settings.calibration_targets.is_none());
        assert!(!settings.calc_likelihood);
        assert_eq!(settings.delta_t, 1.0 / 364.0);
        assert_eq!(settings.warm_up_period, CALIB_PERIOD);
        assert_eq!(settings.reference_data_fingerprint, data.fingerprint);
    }

    #[test]
    fn test_calibrating_builds_targets_over_calibration_period() {
        let data = ReferenceData::builtin().unwrap();
        let options = SettingsOptions {
            if_calibrating: true,
            ..Default::default()
        };
        let settings = CovidSettings::new(&options, &data, &BinomialSurveySize).unwrap();

        assert!(settings.calc_likelihood);
        let targets = settings.calibration_targets.as_ref().unwrap();
        assert_eq!(targets.horizon_weeks, 78);
        assert!(targets.get(&TargetKey::CumHospRate).is_some());
    }

    #[test]
    fn test_multipliers_show_weeks() {
        let data = ReferenceData::builtin().unwrap();
        let settings =
            CovidSettings::new(&SettingsOptions::default(), &data, &BinomialSurveySize).unwrap();

        assert_eq!(settings.prev_multiplier(), 52.0);
        assert!((settings.incd_multiplier() - 1.0).abs() < 1e-12);
        assert!((settings.obs_incd_multiplier() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_settings_yaml_lists_tracks_by_label() {
        let data = ReferenceData::builtin().unwrap();
        let options = SettingsOptions {
            if_calibrating: true,
            ..Default::default()
        };
        let settings = CovidSettings::new(&options, &data, &BinomialSurveySize).unwrap();

        let yaml = settings.to_yaml().unwrap();
        assert!(yaml.contains("calc_likelihood: true"));
        assert!(yaml.contains("cum_hosp_rate_by_age/18-29"));
        assert!(yaml.contains(&data.fingerprint));
    }
}

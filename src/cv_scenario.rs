// Scenario Files - settings overrides loaded from YAML
//
// A scenario names itself and overrides any subset of the default settings:
//
//   meta:
//     name: calibration
//   settings:
//     if_calibrating: true
//     immunity_variance_bounds: own_record

use crate::cv_interface::CalibrationError;
use crate::cv_settings::SettingsOptions;
use crate::cv_targets::{ImmunityVarianceBounds, NovelValueRecord};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub meta: ScenarioMeta,

    #[serde(default)]
    pub settings: SettingsOverrides,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsOverrides {
    pub if_calibrating: Option<bool>,
    pub novel_variant_will_emerge: Option<bool>,
    pub mitigating_strategies_on: Option<bool>,
    pub simulation_duration: Option<f64>,
    pub calibration_period: Option<f64>,
    pub if_collect_trajs_of_compartments: Option<bool>,
    pub immunity_variance_bounds: Option<ImmunityVarianceBounds>,
    pub perc_novel_window: Option<(usize, usize)>,
    pub novel_value_record: Option<NovelValueRecord>,
}

impl ScenarioFile {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CalibrationError> {
        serde_yaml::from_str(yaml).map_err(|e| CalibrationError::Parse(e.to_string()))
    }

    /// Default options with this scenario's overrides applied
    pub fn options(&self) -> SettingsOptions {
        let mut options = SettingsOptions::default();
        self.settings.apply(&mut options);
        options
    }
}

impl SettingsOverrides {
    pub fn apply(&self, options: &mut SettingsOptions) {
        if let Some(v) = self.if_calibrating {
            options.if_calibrating = v;
        }
        if let Some(v) = self.novel_variant_will_emerge {
            options.novel_variant_will_emerge = v;
        }
        if let Some(v) = self.mitigating_strategies_on {
            options.mitigating_strategies_on = v;
        }
        if let Some(v) = self.simulation_duration {
            options.simulation_duration = v;
        }
        if let Some(v) = self.calibration_period {
            options.calibration_period = v;
        }
        if let Some(v) = self.if_collect_trajs_of_compartments {
            options.if_collect_trajs_of_compartments = v;
        }
        if let Some(v) = self.immunity_variance_bounds {
            options.targets.immunity_variance_bounds = v;
        }
        if let Some(v) = self.perc_novel_window {
            options.targets.perc_novel_window = v;
        }
        if let Some(v) = self.novel_value_record {
            options.targets.novel_value_record = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_definitions::SIM_DURATION;

    #[test]
    fn test_overrides_only_touch_given_fields() {
        let scenario = ScenarioFile::from_yaml_str(
            "meta:\n  name: calibration\nsettings:\n  if_calibrating: true\n  immunity_variance_bounds: own_record\n",
        )
        .unwrap();

        assert_eq!(scenario.meta.name.as_deref(), Some("calibration"));

        let options = scenario.options();
        assert!(options.if_calibrating);
        assert_eq!(
            options.targets.immunity_variance_bounds,
            ImmunityVarianceBounds::OwnRecord
        );
        assert!(options.novel_variant_will_emerge);
        assert_eq!(options.simulation_duration, SIM_DURATION);
        assert_eq!(options.targets.perc_novel_window, (3, 10));
    }

    #[test]
    fn test_empty_scenario_is_default() {
        let scenario = ScenarioFile::from_yaml_str("{}").unwrap();
        assert_eq!(scenario.options(), SettingsOptions::default());
    }

    #[test]
    fn test_window_override() {
        let scenario =
            ScenarioFile::from_yaml_str("settings:\n  perc_novel_window: [2, 8]\n").unwrap();
        assert_eq!(scenario.options().targets.perc_novel_window, (2, 8));
        assert_eq!(
            scenario.options().targets.novel_value_record,
            NovelValueRecord::FullTableIndex
        );
    }

    #[test]
    fn test_novel_value_record_override() {
        let scenario =
            ScenarioFile::from_yaml_str("settings:\n  novel_value_record: window_record\n")
                .unwrap();
        assert_eq!(
            scenario.options().targets.novel_value_record,
            NovelValueRecord::WindowRecord
        );
    }

    #[test]
    fn test_unknown_variance_bounds_is_a_parse_error() {
        let err = ScenarioFile::from_yaml_str("settings:\n  immunity_variance_bounds: nearest\n")
            .unwrap_err();
        assert!(matches!(err, CalibrationError::Parse(_)));
    }
}

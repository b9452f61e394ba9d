//! # cvRust - COVID model calibration plumbing
//!
//! Builds the settings of the COVID transmission model: observed indicator
//! tables are aligned onto the weekly time grid of the calibration period so
//! the simulator can score each run against them. Also plans the figures
//! that compare simulated trajectories with the observations, and the
//! sweeps of the model's time-varying parameters.
//!
//! ## Core Components
//!
//! - **align**: Places one observed record (or a window of records) on a
//!   per-week track of means, variances and effective sample sizes
//! - **CalibrationTargets**: Every indicator track the likelihood uses
//! - **CovidSettings**: Simulation, output and calibration settings handed
//!   to the simulator
//! - **FigurePlanner**: Panels and overlays of the comparison figures
//!
//! ```no_run
//! use cv_rust::{BinomialSurveySize, CovidSettings, ReferenceData, SettingsOptions};
//!
//! let data = ReferenceData::builtin().unwrap();
//! let options = SettingsOptions {
//!     if_calibrating: true,
//!     ..Default::default()
//! };
//! let settings = CovidSettings::new(&options, &data, &BinomialSurveySize).unwrap();
//! println!("{}", settings.to_yaml().unwrap());
//! ```

// Calibration targets
pub mod cv_interface;
pub mod cv_aligner;
pub mod cv_survey;
pub mod cv_targets;

// Model inputs
pub mod cv_definitions;
pub mod cv_reference_data;
pub mod cv_settings;
pub mod cv_scenario;

// Figures
pub mod cv_trajectories;
pub mod cv_plots;
pub mod cv_render;
pub mod cv_params;

// Re-export commonly used types
pub use cv_aligner::{align, AlignmentSpec};
pub use cv_interface::{
    AlignedTargetTrack, BoundsSource, CalibrationError, IntervalType, ObservedRecord,
    ObservedSeries, RecordSelector, SampleSizeRule, VarianceRule,
};
pub use cv_reference_data::ReferenceData;
pub use cv_scenario::ScenarioFile;
pub use cv_settings::{CovidSettings, SettingsOptions};
pub use cv_survey::{BinomialSurveySize, SurveySizeEstimator};
pub use cv_targets::{CalibrationTargets, TargetKey};
pub use cv_trajectories::{PlotError, SimOutcomeTrajectories};

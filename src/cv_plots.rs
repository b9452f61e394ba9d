//! Figure Plan
//!
//! Describes every figure comparing simulated trajectories with the
//! calibration data: which outcomes go in which panel, axis ranges and unit
//! multipliers, observed-data overlays and feasible regions. Styling is an
//! explicit value carried by each figure, and the set of figures to produce
//! is resolved once through [`FigureSelection`].

use crate::cv_definitions::{AgeGroup, ProfileDefiner, FEASIBILITY_PERIOD, SIM_DURATION};
use crate::cv_interface::{ObservedSeries, WEEKS_PER_YEAR};
use crate::cv_reference_data::ReferenceTables;
use crate::cv_settings::CovidSettings;
use crate::cv_trajectories::PlotError;
use std::path::{Path, PathBuf};

// ============================================================================
// Style
// ============================================================================

/// Per-figure styling handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub feasible_region_color: String,

    /// Horizontal position of y labels, in axes coordinates
    pub y_label_coord_x: f64,

    /// Width spacing between subplots
    pub subplot_w_space: f64,

    pub x_range: (f64, f64),

    /// (first tick, tick interval)
    pub x_ticks: (f64, f64),

    pub x_label: String,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            feasible_region_color: "pink".to_string(),
            y_label_coord_x: -0.15,
            subplot_w_space: 0.0,
            x_range: (0.0, SIM_DURATION * WEEKS_PER_YEAR),
            x_ticks: (0.0, WEEKS_PER_YEAR / 2.0),
            x_label: "Weeks since March 1, 2020".to_string(),
        }
    }
}

impl PlotStyle {
    pub fn with_y_label_coord_x(mut self, x: f64) -> Self {
        self.y_label_coord_x = x;
        self
    }
}

// ============================================================================
// Panels
// ============================================================================

/// Band of plausible values over a time window
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibleRange {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

/// Observed data drawn over a panel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationOverlay {
    pub rows_of_data: Option<ObservedSeries>,
    pub feasible_range: Option<FeasibleRange>,
    /// Join consecutive observations with a line
    pub connect_observations: bool,
}

impl CalibrationOverlay {
    pub fn data(rows: &ObservedSeries) -> Self {
        Self {
            rows_of_data: Some(rows.clone()),
            ..Default::default()
        }
    }

    pub fn feasible(x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            feasible_range: Some(FeasibleRange { x_range, y_range }),
            ..Default::default()
        }
    }

    pub fn with_feasible(mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        self.feasible_range = Some(FeasibleRange { x_range, y_range });
        self
    }

    pub fn connected(mut self, connect: bool) -> Self {
        self.connect_observations = connect;
        self
    }
}

/// One panel: a simulated outcome and how to draw it
#[derive(Debug, Clone, PartialEq)]
pub struct TrajPlotInfo {
    pub outcome_name: String,
    pub title: String,
    pub y_label: Option<String>,
    pub y_range: Option<(f64, f64)>,
    pub x_multiplier: f64,
    pub y_multiplier: f64,
    pub calibration: Option<CalibrationOverlay>,
}

impl TrajPlotInfo {
    pub fn new(outcome_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            outcome_name: outcome_name.into(),
            title: title.into(),
            y_label: None,
            y_range: None,
            x_multiplier: 1.0,
            y_multiplier: 1.0,
            calibration: None,
        }
    }

    pub fn y_label(mut self, label: Option<&str>) -> Self {
        self.y_label = label.map(str::to_string);
        self
    }

    pub fn y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn x_multiplier(mut self, m: f64) -> Self {
        self.x_multiplier = m;
        self
    }

    pub fn y_multiplier(mut self, m: f64) -> Self {
        self.y_multiplier = m;
        self
    }

    pub fn calibration(mut self, overlay: CalibrationOverlay) -> Self {
        self.calibration = Some(overlay);
        self
    }
}

// ============================================================================
// Figures
// ============================================================================

/// Groups of figures that can be switched on or off
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PanelGroup {
    /// Size of every compartment, one figure per age group
    CompartmentSizes,
    Summary,
    SummaryR21,
    NovelVariant,
    Calibration,
    Incidence,
}

impl PanelGroup {
    pub const STANDARD: [PanelGroup; 5] = [
        PanelGroup::Summary,
        PanelGroup::SummaryR21,
        PanelGroup::NovelVariant,
        PanelGroup::Calibration,
        PanelGroup::Incidence,
    ];
}

/// The figure groups to produce, fixed before anything is rendered
#[derive(Debug, Clone, PartialEq)]
pub struct FigureSelection {
    groups: Vec<PanelGroup>,
}

impl FigureSelection {
    pub fn new(groups: &[PanelGroup]) -> Self {
        let mut unique = Vec::new();
        for g in groups {
            if !unique.contains(g) {
                unique.push(*g);
            }
        }
        Self { groups: unique }
    }

    /// Standard figures, plus compartment sizes when the settings collect them
    pub fn for_settings(settings: &CovidSettings) -> Self {
        let mut groups = Vec::new();
        if settings.if_collect_trajs_of_compartments {
            groups.push(PanelGroup::CompartmentSizes);
        }
        groups.extend_from_slice(&PanelGroup::STANDARD);
        Self::new(&groups)
    }

    pub fn contains(&self, group: PanelGroup) -> bool {
        self.groups.contains(&group)
    }

    pub fn groups(&self) -> &[PanelGroup] {
        &self.groups
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureSpec {
    pub group: PanelGroup,
    pub file_name: PathBuf,
    pub n_rows: usize,
    pub n_cols: usize,
    /// Width and height in inches
    pub figure_size: (f64, f64),
    pub show_subplot_labels: bool,
    pub panels: Vec<TrajPlotInfo>,
    pub style: PlotStyle,
}

impl FigureSpec {
    pub fn check_layout(&self) -> Result<(), PlotError> {
        let cells = self.n_rows * self.n_cols;
        if self.panels.len() > cells {
            return Err(PlotError::LayoutOverflow {
                file_name: self.file_name.display().to_string(),
                panels: self.panels.len(),
                cells,
            });
        }
        Ok(())
    }
}

/// Converts each outcome's time axis to weeks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMultipliers {
    /// Prevalence outcomes (sampled at simulation time in years)
    pub prev: f64,
    /// Incidence outcomes (one value per simulation output period)
    pub incd: f64,
    /// Observed incidence outcomes (one value per observation period)
    pub obs_incd: f64,
}

impl AxisMultipliers {
    pub fn from_settings(settings: &CovidSettings) -> Self {
        Self {
            prev: settings.prev_multiplier(),
            incd: settings.incd_multiplier(),
            obs_incd: settings.obs_incd_multiplier(),
        }
    }
}

// ============================================================================
// Planner
// ============================================================================

pub struct FigurePlanner<'a> {
    tables: &'a ReferenceTables,
    profiles: ProfileDefiner,
    mult: AxisMultipliers,
    figures_dir: PathBuf,
}

impl<'a> FigurePlanner<'a> {
    pub fn new(tables: &'a ReferenceTables, mult: AxisMultipliers, figures_dir: &Path) -> Self {
        Self {
            tables,
            profiles: ProfileDefiner::covid(),
            mult,
            figures_dir: figures_dir.to_path_buf(),
        }
    }

    /// Every figure of the selected groups, in selection order
    pub fn plan(&self, selection: &FigureSelection) -> Result<Vec<FigureSpec>, PlotError> {
        let mut figures = Vec::new();
        for group in selection.groups() {
            match group {
                PanelGroup::CompartmentSizes => figures.extend(self.compartment_figures()),
                PanelGroup::Summary => figures.push(self.summary_figure()),
                PanelGroup::SummaryR21 => figures.push(self.summary_r21_figure()),
                PanelGroup::NovelVariant => figures.push(self.novel_variant_figure()),
                PanelGroup::Calibration => figures.push(self.calibration_figure()),
                PanelGroup::Incidence => figures.push(self.incidence_figure()),
            }
        }
        for figure in &figures {
            figure.check_layout()?;
        }
        Ok(figures)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.figures_dir.join(format!("{}.png", name))
    }

    fn feasible_window(&self) -> (f64, f64) {
        (0.0, FEASIBILITY_PERIOD * WEEKS_PER_YEAR)
    }

    // ------------------------------------------------------------------------
    // Compartment sizes by age
    // ------------------------------------------------------------------------

    fn compartment_figures(&self) -> Vec<FigureSpec> {
        let pd = &self.profiles;
        let prev = self.mult.prev;

        (0..pd.n_age_groups)
            .map(|a| {
                let str_a = &pd.str_age[a];
                let mut panels = Vec::new();

                for v in 0..pd.n_variants {
                    for vs in 0..pd.n_vacc_status {
                        let str_a_p = &pd.str_age_profile[a][v][vs];
                        let str_p = &pd.str_profile[v][vs];
                        let compartments = [
                            ("In: Exposed-", "Exposed"),
                            ("In: Infectious-", "Infectious"),
                            ("In: Hospitalized-", "Hospitalized"),
                            ("In: Recovered-", "Recovered"),
                            ("Total to: Death-", "Cumulative death"),
                        ];
                        for (prefix, title) in compartments {
                            panels.push(
                                TrajPlotInfo::new(
                                    format!("{}{}", prefix, str_a_p),
                                    format!("{}\n{}", title, str_p),
                                )
                                .x_multiplier(prev),
                            );
                        }
                    }
                }
                panels.push(
                    TrajPlotInfo::new(format!("In: Susceptible-{}", str_a), "Susceptible")
                        .x_multiplier(prev),
                );
                panels.push(
                    TrajPlotInfo::new(format!("In: Vaccinated-{}", str_a), "Vaccinated")
                        .x_multiplier(prev),
                );

                FigureSpec {
                    group: PanelGroup::CompartmentSizes,
                    file_name: self.path(str_a),
                    n_rows: pd.n_profiles + 1,
                    n_cols: 5,
                    figure_size: (2.0 * (pd.n_variants + 1) as f64, 2.0 * 5.0),
                    show_subplot_labels: false,
                    panels,
                    style: PlotStyle::default(),
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Summary
    // ------------------------------------------------------------------------

    fn obs_incidence_rate(&self) -> TrajPlotInfo {
        TrajPlotInfo::new(
            "Obs: Incidence rate",
            "Incidence rate\n(per 100,000 population)",
        )
        .y_range(0.0, 25000.0)
        .y_multiplier(100000.0)
        .x_multiplier(self.mult.obs_incd)
    }

    fn hosp_occupancy_rate(&self) -> TrajPlotInfo {
        let f = &self.tables.feasible;
        TrajPlotInfo::new(
            "Hospital occupancy rate",
            "Rate of hospital occupancy\n(per 100,000 population)",
        )
        .y_range(0.0, 150.0)
        .y_multiplier(100000.0)
        .x_multiplier(self.mult.prev)
        .calibration(CalibrationOverlay::feasible(
            self.feasible_window(),
            (f.min_hosp_occ_rate, f.max_hosp_occ_rate),
        ))
    }

    fn new_hosp_rate(&self) -> TrajPlotInfo {
        let f = &self.tables.feasible;
        TrajPlotInfo::new(
            "Obs: New hospitalization rate",
            "Rate of new hospitalizations\n(per 100,000 population)",
        )
        .y_range(0.0, 150.0)
        .y_multiplier(100000.0)
        .x_multiplier(self.mult.incd)
        .calibration(CalibrationOverlay::feasible(
            self.feasible_window(),
            (f.min_hosp_rate_overall, f.max_hosp_rate_overall),
        ))
    }

    fn cum_hosp_rate(&self) -> TrajPlotInfo {
        TrajPlotInfo::new(
            "Obs: Cumulative hospitalization rate",
            "Cumulative hospitalizations\n(per 100,000 population)",
        )
        .y_range(0.0, 3000.0)
        .y_multiplier(100000.0)
        .x_multiplier(self.mult.prev)
        .calibration(CalibrationOverlay::data(&self.tables.cum_hosp_rate_overall))
    }

    fn prev_immune_from_inf(&self) -> TrajPlotInfo {
        TrajPlotInfo::new(
            "Obs: Prevalence with immunity from infection",
            "Prevalence of population with\nimmunity from infection (%)",
        )
        .y_range(0.0, 100.0)
        .y_multiplier(100.0)
        .x_multiplier(self.mult.prev)
        .calibration(
            CalibrationOverlay::data(&self.tables.prev_immune_from_inf).with_feasible(
                self.feasible_window(),
                (0.0, self.tables.feasible.max_prev_immune_from_inf),
            ),
        )
    }

    fn cum_vacc_rate(&self) -> TrajPlotInfo {
        TrajPlotInfo::new(
            "Obs: Cumulative vaccination rate",
            "Prevalence of vaccinated\nindividuals (%)",
        )
        .y_range(0.0, 100.0)
        .y_multiplier(100.0)
        .x_multiplier(self.mult.prev)
        .calibration(CalibrationOverlay::data(&self.tables.vaccine_coverage_over_time).connected(true))
    }

    fn incidence_delta(&self, title: &str) -> TrajPlotInfo {
        TrajPlotInfo::new("Obs: % of incidence due to Delta", title)
            .y_range(0.0, 100.0)
            .y_multiplier(100.0)
            .x_multiplier(self.mult.obs_incd)
            .calibration(CalibrationOverlay::data(&self.tables.perc_inf_with_novel).connected(false))
    }

    fn percent_panel(&self, outcome: &str, title: &str) -> TrajPlotInfo {
        TrajPlotInfo::new(outcome, title)
            .y_range(0.0, 100.0)
            .y_multiplier(100.0)
            .x_multiplier(self.mult.obs_incd)
    }

    fn summary_figure(&self) -> FigureSpec {
        FigureSpec {
            group: PanelGroup::Summary,
            file_name: self.path("summary"),
            n_rows: 3,
            n_cols: 3,
            figure_size: (2.3 * 3.0, 2.4 * 3.0),
            show_subplot_labels: true,
            panels: vec![
                self.hosp_occupancy_rate(),
                self.new_hosp_rate(),
                self.prev_immune_from_inf(),
                self.cum_hosp_rate(),
                self.cum_vacc_rate(),
                self.incidence_delta("Incidence associated with\nthe delta variant (%)"),
                self.percent_panel(
                    "Obs: % of incidence due to Novel",
                    "Incidence associated\nwith a novel variant (%)",
                ),
            ],
            style: PlotStyle::default(),
        }
    }

    fn summary_r21_figure(&self) -> FigureSpec {
        FigureSpec {
            group: PanelGroup::SummaryR21,
            file_name: self.path("summary_r21"),
            n_rows: 1,
            n_cols: 3,
            figure_size: (1.8 * 3.0, 1.8),
            show_subplot_labels: true,
            panels: vec![
                self.cum_hosp_rate(),
                self.cum_vacc_rate(),
                self.incidence_delta("Incidence associated with\nthe delta variant (%)"),
            ],
            style: PlotStyle::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Novel variant
    // ------------------------------------------------------------------------

    fn novel_variant_figure(&self) -> FigureSpec {
        let panels = vec![
            self.incidence_delta("Incidence associated\nwith Delta variant (%)"),
            self.percent_panel(
                "Obs: % of incidence due to Novel",
                "Incidence associated\nwith a novel variant (%)",
            ),
            self.percent_panel(
                "Obs: % of new hospitalizations due to Delta",
                "New hospitalizations associated\nwith Delta variant (%)",
            ),
            self.percent_panel(
                "Obs: % of new hospitalizations due to Novel",
                "New hospitalizations associated\nwith a novel variant (%)",
            ),
            self.percent_panel(
                "Obs: % of incidence due to Delta-Vacc",
                "% incidence that are\nvaccinated and due to Delta variant",
            ),
            self.percent_panel(
                "Obs: % of incidence due to Novel-Vacc",
                "% incidence that are\nvaccinated and due to a novel variant",
            ),
            self.percent_panel(
                "Obs: % of new hospitalizations due to Delta-Vacc",
                "% new hospitalizations that are\nvaccinated and due to Delta variant",
            ),
            self.percent_panel(
                "Obs: % of new hospitalizations due to Novel-Vacc",
                "% new hospitalizations that are\n vaccinated and due to a novel variant",
            ),
        ];

        FigureSpec {
            group: PanelGroup::NovelVariant,
            file_name: self.path("novel_variant"),
            n_rows: 4,
            n_cols: 2,
            figure_size: (2.3 * 2.0, 2.4 * 4.0),
            show_subplot_labels: true,
            panels,
            style: PlotStyle::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Calibration by age
    // ------------------------------------------------------------------------

    fn calibration_figure(&self) -> FigureSpec {
        let t = self.tables;
        let mut hosp_rate = Vec::new();
        let mut cum_hosp_rate = Vec::new();
        let mut age_dist_cum_hosp = Vec::new();
        let mut cum_vacc_rate = Vec::new();

        for age in AgeGroup::ALL {
            let a = age.index();
            let str_a = age.label();
            let first = a == 0;

            hosp_rate.push(
                TrajPlotInfo::new(format!("New hospitalization rate-{}", str_a), str_a)
                    .y_label(first.then_some("New hospitalization rate\n(per 100,000 population)"))
                    .y_range(0.0, 1000.0)
                    .y_multiplier(100000.0)
                    .x_multiplier(self.mult.incd),
            );

            let mut cum = TrajPlotInfo::new(format!("Cumulative hospitalization rate-{}", str_a), str_a)
                .y_label(first.then_some("Cumulative hospitalization rate\n(per 100,000 population)"))
                .y_range(0.0, 5000.0)
                .y_multiplier(100000.0)
                .x_multiplier(self.mult.prev);
            if let Some(rows) = t.cum_hosp_rate_by_age.get(a) {
                cum = cum.calibration(CalibrationOverlay::data(rows));
            }
            cum_hosp_rate.push(cum);

            let mut dist = TrajPlotInfo::new(format!("Cumulative hospitalizations-{} (%)", str_a), str_a)
                .y_label(first.then_some("Age-distribution of\ncumulative hospitalizations (%)"))
                .y_range(0.0, 100.0)
                .y_multiplier(100.0)
                .x_multiplier(self.mult.prev);
            if let Some(rows) = t.hosp_age_dist.get(a) {
                dist = dist.calibration(CalibrationOverlay::data(rows));
            }
            age_dist_cum_hosp.push(dist);

            let mut vacc = TrajPlotInfo::new(format!("Cumulative vaccination rate-{}", str_a), str_a)
                .y_label(first.then_some("Cumulative vaccination rate (%)"))
                .y_range(0.0, 100.0)
                .y_multiplier(100.0)
                .x_multiplier(self.mult.prev);
            if let Some(rows) = t.vaccine_coverage_by_age.get(a) {
                vacc = vacc.calibration(CalibrationOverlay::data(rows).connected(true));
            }
            cum_vacc_rate.push(vacc);
        }

        let mut panels = hosp_rate;
        panels.extend(cum_hosp_rate);
        panels.extend(age_dist_cum_hosp);
        panels.extend(cum_vacc_rate);

        FigureSpec {
            group: PanelGroup::Calibration,
            file_name: self.path("calibration"),
            n_rows: 4,
            n_cols: AgeGroup::COUNT,
            figure_size: (11.0, 6.5),
            show_subplot_labels: false,
            panels,
            style: PlotStyle::default().with_y_label_coord_x(-0.35),
        }
    }

    // ------------------------------------------------------------------------
    // Incidence by age
    // ------------------------------------------------------------------------

    fn incidence_figure(&self) -> FigureSpec {
        let mut incd_rate = Vec::new();
        let mut age_dist_cum_incd = Vec::new();

        for age in AgeGroup::ALL {
            let str_a = age.label();
            let first = age.index() == 0;

            incd_rate.push(
                TrajPlotInfo::new(format!("Incidence rate-{}", str_a), str_a)
                    .y_label(first.then_some("Incidence rate\n(per 100,000 population)"))
                    .y_range(0.0, 20000.0)
                    .y_multiplier(100000.0)
                    .x_multiplier(self.mult.incd),
            );
            age_dist_cum_incd.push(
                TrajPlotInfo::new(format!("Cumulative incidence-{} (%)", str_a), str_a)
                    .y_label(first.then_some("Age-distribution of\ncumulative incident (%)"))
                    .y_range(0.0, 100.0)
                    .y_multiplier(100.0)
                    .x_multiplier(self.mult.prev),
            );
        }

        let mut panels = incd_rate;
        panels.extend(age_dist_cum_incd);

        FigureSpec {
            group: PanelGroup::Incidence,
            file_name: self.path("incidence"),
            n_rows: 2,
            n_cols: AgeGroup::COUNT,
            figure_size: (15.0, 4.0),
            show_subplot_labels: false,
            panels,
            style: PlotStyle::default().with_y_label_coord_x(-0.25),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_reference_data::ReferenceData;
    use crate::cv_settings::SettingsOptions;
    use crate::cv_survey::BinomialSurveySize;

    fn weekly() -> AxisMultipliers {
        AxisMultipliers {
            prev: 52.0,
            incd: 1.0,
            obs_incd: 1.0,
        }
    }

    #[test]
    fn test_selection_follows_settings() {
        let data = ReferenceData::builtin().unwrap();
        let mut options = SettingsOptions::default();

        let settings = CovidSettings::new(&options, &data, &BinomialSurveySize).unwrap();
        let selection = FigureSelection::for_settings(&settings);
        assert!(!selection.contains(PanelGroup::CompartmentSizes));
        assert_eq!(selection.groups(), &PanelGroup::STANDARD);

        options.if_collect_trajs_of_compartments = true;
        let settings = CovidSettings::new(&options, &data, &BinomialSurveySize).unwrap();
        let selection = FigureSelection::for_settings(&settings);
        assert_eq!(selection.groups()[0], PanelGroup::CompartmentSizes);
    }

    #[test]
    fn test_selection_drops_duplicates() {
        let selection = FigureSelection::new(&[
            PanelGroup::Summary,
            PanelGroup::Incidence,
            PanelGroup::Summary,
        ]);
        assert_eq!(
            selection.groups(),
            &[PanelGroup::Summary, PanelGroup::Incidence]
        );
    }

    #[test]
    fn test_standard_plan_fits_its_grids() {
        let data = ReferenceData::builtin().unwrap();
        let planner = FigurePlanner::new(&data.tables, weekly(), Path::new("outputs/figures"));
        let figures = planner
            .plan(&FigureSelection::new(&PanelGroup::STANDARD))
            .unwrap();

        let names: Vec<String> = figures
            .iter()
            .map(|f| f.file_name.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "summary.png",
                "summary_r21.png",
                "novel_variant.png",
                "calibration.png",
                "incidence.png"
            ]
        );

        let calibration = &figures[3];
        assert_eq!(calibration.panels.len(), 4 * AgeGroup::COUNT);
        assert_eq!(calibration.style.y_label_coord_x, -0.35);
        assert!(calibration.panels[0].y_label.is_some());
        assert!(calibration.panels[1].y_label.is_none());

        // style changes stay with their figure
        assert_eq!(figures[0].style.y_label_coord_x, -0.15);
        assert_eq!(figures[4].style.y_label_coord_x, -0.25);
    }

    #[test]
    fn test_compartment_figures_per_age() {
        let data = ReferenceData::builtin().unwrap();
        let planner = FigurePlanner::new(&data.tables, weekly(), Path::new("figs"));
        let figures = planner
            .plan(&FigureSelection::new(&[PanelGroup::CompartmentSizes]))
            .unwrap();

        assert_eq!(figures.len(), AgeGroup::COUNT);
        let first = &figures[0];
        assert_eq!(first.file_name, Path::new("figs").join("0-4.png"));
        // 5 compartments per profile plus susceptible and vaccinated
        assert_eq!(first.panels.len(), 6 * 5 + 2);
        assert_eq!(first.panels[0].outcome_name, "In: Exposed-0-4-Original-Unvaccinated");
        assert_eq!(first.panels[31].outcome_name, "In: Vaccinated-0-4");
    }

    #[test]
    fn test_overlays_carry_reference_rows() {
        let data = ReferenceData::builtin().unwrap();
        let planner = FigurePlanner::new(&data.tables, weekly(), Path::new("figs"));
        let summary = planner.summary_figure();

        let cum_hosp = summary
            .panels
            .iter()
            .find(|p| p.outcome_name == "Obs: Cumulative hospitalization rate")
            .unwrap();
        let overlay = cum_hosp.calibration.as_ref().unwrap();
        assert_eq!(
            overlay.rows_of_data.as_ref().unwrap(),
            &data.tables.cum_hosp_rate_overall
        );

        let occupancy = &summary.panels[0];
        let feasible = occupancy
            .calibration
            .as_ref()
            .unwrap()
            .feasible_range
            .as_ref()
            .unwrap();
        assert_eq!(feasible.x_range, (0.0, 78.0));
        assert_eq!(
            feasible.y_range,
            (
                data.tables.feasible.min_hosp_occ_rate,
                data.tables.feasible.max_hosp_occ_rate
            )
        );
    }

    #[test]
    fn test_layout_overflow_is_fatal() {
        let figure = FigureSpec {
            group: PanelGroup::Summary,
            file_name: PathBuf::from("tiny.png"),
            n_rows: 1,
            n_cols: 1,
            figure_size: (1.0, 1.0),
            show_subplot_labels: false,
            panels: vec![TrajPlotInfo::new("a", "A"), TrajPlotInfo::new("b", "B")],
            style: PlotStyle::default(),
        };

        assert_eq!(
            figure.check_layout(),
            Err(PlotError::LayoutOverflow {
                file_name: "tiny.png".to_string(),
                panels: 2,
                cells: 1,
            })
        );
    }
}

// Figure Rendering - turns a figure plan plus trajectories into drawables
//
// Drawing itself sits behind `FigureRenderer`. `LogRenderer` records what
// would be drawn, which is enough for dry runs and tests.

use crate::cv_params::ParameterFigure;
use crate::cv_plots::{FigureSpec, TrajPlotInfo};
use crate::cv_trajectories::{PlotError, RunId, SimOutcomeTrajectories};
use log::{debug, info};
use rand::Rng;
use std::path::PathBuf;

/// One run of a panel, in plotting units
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub run: RunId,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug)]
pub struct PreparedPanel<'a> {
    pub info: &'a TrajPlotInfo,
    pub series: Vec<PreparedSeries>,
}

impl PreparedPanel<'_> {
    /// Smallest and largest plotted value over every run
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.y.iter().copied())
            .fold(None, |acc, y| match acc {
                None => Some((y, y)),
                Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            })
    }
}

#[derive(Debug)]
pub struct PreparedFigure<'a> {
    pub spec: &'a FigureSpec,
    pub panels: Vec<PreparedPanel<'a>>,
}

/// Prepare a figure from all runs, or `n_random` of them picked with `rng`
pub fn prepare_figure<'a, R: Rng + ?Sized>(
    spec: &'a FigureSpec,
    store: &SimOutcomeTrajectories,
    n_random: Option<usize>,
    rng: &mut R,
) -> Result<PreparedFigure<'a>, PlotError> {
    let runs = store.select_runs(n_random, rng);
    prepare_runs(spec, store, &runs)
}

/// Scale the given runs of every panel. A panel whose outcome is not in
/// the store fails the whole figure.
pub fn prepare_runs<'a>(
    spec: &'a FigureSpec,
    store: &SimOutcomeTrajectories,
    runs: &[RunId],
) -> Result<PreparedFigure<'a>, PlotError> {
    spec.check_layout()?;

    let mut panels = Vec::with_capacity(spec.panels.len());
    for info in &spec.panels {
        let by_run = store.outcome(&info.outcome_name)?;
        let series = runs
            .iter()
            .filter_map(|run| by_run.get(run).map(|t| (*run, t)))
            .map(|(run, t)| PreparedSeries {
                run,
                x: t.times.iter().map(|x| x * info.x_multiplier).collect(),
                y: t.values.iter().map(|y| y * info.y_multiplier).collect(),
            })
            .collect();
        panels.push(PreparedPanel { info, series });
    }

    Ok(PreparedFigure { spec, panels })
}

// ============================================================================
// Renderers
// ============================================================================

pub trait FigureRenderer {
    fn render(&mut self, figure: &PreparedFigure) -> Result<(), PlotError>;

    fn render_parameters(&mut self, figure: &ParameterFigure) -> Result<(), PlotError>;
}

/// Logs each figure instead of drawing it
#[derive(Debug, Default)]
pub struct LogRenderer {
    pub rendered: Vec<PathBuf>,
}

impl FigureRenderer for LogRenderer {
    fn render(&mut self, figure: &PreparedFigure) -> Result<(), PlotError> {
        let spec = figure.spec;
        info!(
            "{}: {}x{} grid, {} panels",
            spec.file_name.display(),
            spec.n_rows,
            spec.n_cols,
            figure.panels.len()
        );
        for panel in &figure.panels {
            match panel.y_extent() {
                Some((lo, hi)) => debug!(
                    "  {}: {} runs, y in [{:.3}, {:.3}]",
                    panel.info.outcome_name,
                    panel.series.len(),
                    lo,
                    hi
                ),
                None => debug!("  {}: no runs", panel.info.outcome_name),
            }
        }
        self.rendered.push(spec.file_name.clone());
        Ok(())
    }

    fn render_parameters(&mut self, figure: &ParameterFigure) -> Result<(), PlotError> {
        let curves: usize = figure.panels.iter().map(|p| p.curves.len()).sum();
        info!(
            "{}: {} panels, {} curves",
            figure.file_name.display(),
            figure.panels.len(),
            curves
        );
        self.rendered.push(figure.file_name.clone());
        Ok(())
    }
}

/// Render every figure of a plan with the same randomly chosen runs.
///
/// Returns the number of figures rendered. Stops at the first figure that
/// cannot be prepared.
pub fn render_plan<R: Rng + ?Sized>(
    plan: &[FigureSpec],
    store: &SimOutcomeTrajectories,
    n_random: Option<usize>,
    rng: &mut R,
    renderer: &mut dyn FigureRenderer,
) -> Result<usize, PlotError> {
    let runs = store.select_runs(n_random, rng);
    info!("Rendering {} figures with {} runs", plan.len(), runs.len());

    for spec in plan {
        let figure = prepare_runs(spec, store, &runs)?;
        renderer.render(&figure)?;
    }
    Ok(plan.len())
}

//! Time-varying parameters
//!
//! Functional forms the model uses for parameters that change over
//! simulation time, plus the sweeps that show how each shape responds to its
//! arguments. Sweeps produce plain curve data; drawing is left to a
//! [`FigureRenderer`](crate::cv_render::FigureRenderer).

use crate::cv_definitions::{CALIB_PERIOD, SIM_DURATION};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Points per swept curve
pub const SWEEP_POINTS: usize = 50;

/// Logistic curve that switches on after `t_min`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDependentSigmoid {
    pub b: f64,
    pub t_min: f64,
    pub t_middle: f64,
    pub min: f64,
    pub max: f64,
}

impl TimeDependentSigmoid {
    pub fn sample(&self, t: f64) -> f64 {
        if t <= self.t_min {
            return 0.0;
        }
        let z = -self.b * (t - self.t_min - self.t_middle);
        self.min + (self.max - self.min) / (1.0 + z.exp())
    }
}

/// Seasonal oscillation `a0 + a1 cos(2π (t - phase) / scale)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDependentCosine {
    pub phase: f64,
    pub scale: f64,
    pub a0: f64,
    pub a1: f64,
}

impl TimeDependentCosine {
    pub fn sample(&self, t: f64) -> f64 {
        self.a0 + self.a1 * (2.0 * PI * (t - self.phase) / self.scale).cos()
    }
}

/// `num` evenly spaced values from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

// ============================================================================
// Sweep Output
// ============================================================================

/// One curve; `None` where the parameter is switched off
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPanel {
    pub title: String,
    pub curves: Vec<Curve>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterFigure {
    pub file_name: PathBuf,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Marks the end of the calibration period
    pub vertical_line: Option<f64>,
    pub figure_size: (f64, f64),
    pub panels: Vec<SweepPanel>,
}

fn sigmoid_curve(label: String, f: &TimeDependentSigmoid, ts: &[f64]) -> Curve {
    let points = ts
        .iter()
        .map(|&t| {
            let v = f.sample(t);
            (t, (v > 0.0).then_some(v))
        })
        .collect();
    Curve { label, points }
}

fn cosine_curve(label: String, f: &TimeDependentCosine, ts: &[f64]) -> Curve {
    Curve {
        label,
        points: ts.iter().map(|&t| (t, Some(f.sample(t)))).collect(),
    }
}

// ============================================================================
// Sweeps
// ============================================================================

/// Alternative values per sigmoid argument; `None` leaves it out
#[derive(Debug, Clone, Default)]
pub struct SigmoidSweep {
    pub base: Option<TimeDependentSigmoid>,
    pub bs: Option<Vec<f64>>,
    pub mins: Option<Vec<f64>>,
    pub maxs: Option<Vec<f64>>,
    pub t_middles: Option<Vec<f64>>,
    pub t_mins: Option<Vec<f64>>,
}

impl SigmoidSweep {
    /// One panel per swept argument, others held at the base value
    pub fn panels(&self, ts: &[f64]) -> Vec<SweepPanel> {
        let base = match self.base {
            Some(base) => base,
            None => return Vec::new(),
        };

        type Setter = fn(&mut TimeDependentSigmoid, f64);
        let sweeps: [(&str, &str, &Option<Vec<f64>>, Setter); 5] = [
            ("Varying b", "b", &self.bs, |f, v| f.b = v),
            ("Varying minimum", "min", &self.mins, |f, v| f.min = v),
            ("Varying maximum", "max", &self.maxs, |f, v| f.max = v),
            ("Varying t_middle", "t_middle", &self.t_middles, |f, v| {
                f.t_middle = v
            }),
            ("Varying t_min", "t_min", &self.t_mins, |f, v| f.t_min = v),
        ];

        sweeps
            .iter()
            .filter_map(|&(title, arg, values, set)| {
                values.as_ref().map(|values| SweepPanel {
                    title: title.to_string(),
                    curves: values
                        .iter()
                        .map(|&v| {
                            let mut f = base;
                            set(&mut f, v);
                            sigmoid_curve(format!("{}={}", arg, v), &f, ts)
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CosineSweep {
    pub base: TimeDependentCosine,
    pub phases: Vec<f64>,
    pub a0s: Vec<f64>,
    pub a1s: Vec<f64>,
}

impl CosineSweep {
    pub fn panels(&self, ts: &[f64]) -> Vec<SweepPanel> {
        type Setter = fn(&mut TimeDependentCosine, f64);
        let sweeps: [(&str, &str, &Vec<f64>, Setter); 3] = [
            ("Varying phase", "phase", &self.phases, |f, v| f.phase = v),
            ("Varying a0", "a0", &self.a0s, |f, v| f.a0 = v),
            ("Varying a1", "a1", &self.a1s, |f, v| f.a1 = v),
        ];

        sweeps
            .iter()
            .map(|&(title, arg, values, set)| SweepPanel {
                title: title.to_string(),
                curves: values
                    .iter()
                    .map(|&v| {
                        let mut f = self.base;
                        set(&mut f, v);
                        cosine_curve(format!("{}={}", arg, v), &f, ts)
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Effectiveness of control `α(h)` as a sigmoid of the hospital occupancy `h`
pub fn control_effectiveness(alpha_max: f64, h_max: f64) -> TimeDependentSigmoid {
    TimeDependentSigmoid {
        b: 4.0 / h_max,
        t_min: 0.0,
        t_middle: 0.0,
        min: 0.0,
        max: alpha_max,
    }
}

// ============================================================================
// Predefined Figures
// ============================================================================

/// Parameter figures written under `<figures_dir>/params`
pub fn parameter_figures(figures_dir: &Path) -> Vec<ParameterFigure> {
    let dir = figures_dir.join("params");
    let ts = linspace(0.0, SIM_DURATION, SWEEP_POINTS);
    let time_range = (-0.1, SIM_DURATION + 0.1);
    let time_label = "Simulation year";

    let prob_novel = SigmoidSweep {
        base: Some(TimeDependentSigmoid {
            b: 7.0,
            t_min: 0.0,
            t_middle: 2.0,
            min: 0.0,
            max: 0.5,
        }),
        bs: Some(vec![5.0, 7.0, 9.0]),
        maxs: Some(vec![0.4, 0.5, 0.6]),
        t_middles: Some(vec![1.75, 2.0, 2.25]),
        ..Default::default()
    };

    let vaccination = SigmoidSweep {
        base: Some(TimeDependentSigmoid {
            b: -7.5,
            t_min: 1.0,
            t_middle: 0.75,
            min: 0.1,
            max: 2.5,
        }),
        bs: Some(vec![-10.0, -7.5, -5.0]),
        mins: Some(vec![0.0, 0.1, 0.2]),
        maxs: Some(vec![2.0, 2.5, 3.0]),
        t_middles: Some(vec![0.5, 0.75, 1.0]),
        t_mins: Some(vec![0.8, 1.0, 1.2]),
    };

    let seasonality = CosineSweep {
        base: TimeDependentCosine {
            phase: 0.0,
            scale: 1.0,
            a0: 1.0,
            a1: 0.25,
        },
        phases: vec![-0.25, 0.0, 0.25],
        a0s: vec![0.75, 1.0, 1.25],
        a1s: vec![0.0, 0.25, 0.5],
    };

    vec![
        ParameterFigure {
            file_name: dir.join("prob_novel.png"),
            x_label: time_label.to_string(),
            y_label: "γ(t)".to_string(),
            x_range: time_range,
            y_range: (0.0, 1.0),
            vertical_line: Some(CALIB_PERIOD),
            figure_size: (6.0, 2.8),
            panels: prob_novel.panels(&ts),
        },
        ParameterFigure {
            file_name: dir.join("vaccination.png"),
            x_label: time_label.to_string(),
            y_label: "v(t)".to_string(),
            x_range: time_range,
            y_range: (0.0, 3.0),
            vertical_line: Some(CALIB_PERIOD),
            figure_size: (9.0, 2.8),
            panels: vaccination.panels(&ts),
        },
        alpha_figure(&dir),
        ParameterFigure {
            file_name: dir.join("seasonality.png"),
            x_label: time_label.to_string(),
            y_label: "σ(t)".to_string(),
            x_range: time_range,
            y_range: (0.0, 3.0),
            vertical_line: Some(CALIB_PERIOD),
            figure_size: (6.0, 2.8),
            panels: seasonality.panels(&ts),
        },
    ]
}

fn alpha_figure(dir: &Path) -> ParameterFigure {
    let hs = linspace(0.0, 30.0, SWEEP_POINTS);
    let (alpha_max, h_max) = (0.7, 15.0);

    let by_alpha = SweepPanel {
        title: "Varying maximum effectiveness".to_string(),
        curves: [0.5, 0.7, 0.9]
            .iter()
            .map(|&a| sigmoid_curve(format!("alpha_max={}", a), &control_effectiveness(a, h_max), &hs))
            .collect(),
    };
    let by_h = SweepPanel {
        title: "Varying occupancy threshold".to_string(),
        curves: [10.0, 15.0, 20.0]
            .iter()
            .map(|&h| sigmoid_curve(format!("h_max={}", h), &control_effectiveness(alpha_max, h), &hs))
            .collect(),
    };

    ParameterFigure {
        file_name: dir.join("alpha.png"),
        x_label: "Hospital occupancy (per 100,000)".to_string(),
        y_label: "α(h)".to_string(),
        x_range: (-1.0, 31.0),
        y_range: (0.0, 1.0),
        vertical_line: None,
        figure_size: (4.5, 2.8),
        panels: vec![by_alpha, by_h],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv_render::{FigureRenderer, LogRenderer};

    #[test]
    fn test_sigmoid_is_off_until_t_min() {
        let f = TimeDependentSigmoid {
            b: 7.0,
            t_min: 1.0,
            t_middle: 0.5,
            min: 0.1,
            max: 0.9,
        };
        assert_eq!(f.sample(0.5), 0.0);
        assert_eq!(f.sample(1.0), 0.0);
        // midpoint of the curve
        assert!((f.sample(1.5) - 0.5).abs() < 1e-12);
        assert!(f.sample(10.0) > 0.89);
    }

    #[test]
    fn test_cosine_peaks_at_phase() {
        let f = TimeDependentCosine {
            phase: 0.25,
            scale: 1.0,
            a0: 1.0,
            a1: 0.25,
        };
        assert!((f.sample(0.25) - 1.25).abs() < 1e-12);
        assert!((f.sample(0.75) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_linspace_includes_ends() {
        let xs = linspace(0.0, 2.25, SWEEP_POINTS);
        assert_eq!(xs.len(), 50);
        assert_eq!(xs[0], 0.0);
        assert!((xs[49] - 2.25).abs() < 1e-12);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_sweep_marks_switched_off_samples_absent() {
        let sweep = SigmoidSweep {
            base: Some(TimeDependentSigmoid {
                b: 7.0,
                t_min: 1.0,
                t_middle: 0.5,
                min: 0.0,
                max: 1.0,
            }),
            bs: Some(vec![5.0, 7.0]),
            ..Default::default()
        };
        let panels = sweep.panels(&[0.5, 2.0]);

        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].curves[0].label, "b=5");
        assert_eq!(panels[0].curves[0].points[0], (0.5, None));
        assert!(panels[0].curves[0].points[1].1.is_some());
    }

    #[test]
    fn test_empty_sweep_has_no_panels() {
        assert!(SigmoidSweep::default().panels(&[0.0, 1.0]).is_empty());
    }

    #[test]
    fn test_predefined_parameter_figures() {
        let figures = parameter_figures(Path::new("figs"));
        let names: Vec<PathBuf> = figures.iter().map(|f| f.file_name.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("figs/params/prob_novel.png"),
                PathBuf::from("figs/params/vaccination.png"),
                PathBuf::from("figs/params/alpha.png"),
                PathBuf::from("figs/params/seasonality.png"),
            ]
        );

        // vaccination sweeps every argument
        assert_eq!(figures[1].panels.len(), 5);
        assert!(figures[0]
            .panels
            .iter()
            .all(|p| p.curves.iter().all(|c| c.points.len() == SWEEP_POINTS)));

        let mut renderer = LogRenderer::default();
        for figure in &figures {
            renderer.render_parameters(figure).unwrap();
        }
        assert_eq!(renderer.rendered, names);
    }
}

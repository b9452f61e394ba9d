//! Simulated outcome trajectories
//!
//! In-memory view of the simulator's trajectory output: for every named
//! outcome (e.g. "Obs: Incidence rate"), one time series per simulation run.
//! Reading the simulator's CSV files into the store is left to the analysis
//! tooling; the figure code only needs lookups by outcome name.

use hashbrown::HashMap;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub type RunId = usize;

/// Errors raised while preparing figures
#[derive(Debug, Clone, PartialEq)]
pub enum PlotError {
    /// No trajectory has this outcome name
    MissingOutcome(String),

    /// More panels than the figure grid has cells
    LayoutOverflow {
        file_name: String,
        panels: usize,
        cells: usize,
    },

    /// Times and values of a trajectory differ in length
    RunLengthMismatch {
        outcome: String,
        run: RunId,
        times: usize,
        values: usize,
    },
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::MissingOutcome(name) => {
                write!(f, "outcome '{}' not found in trajectories", name)
            }
            PlotError::LayoutOverflow {
                file_name,
                panels,
                cells,
            } => write!(
                f,
                "{}: {} panels do not fit in {} grid cells",
                file_name, panels, cells
            ),
            PlotError::RunLengthMismatch {
                outcome,
                run,
                times,
                values,
            } => write!(
                f,
                "{} (run {}): {} times but {} values",
                outcome, run, times, values
            ),
        }
    }
}

impl std::error::Error for PlotError {}

/// One run of one outcome; `times` in simulation years
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

/// Outcome name -> run -> trajectory
#[derive(Debug, Default)]
pub struct SimOutcomeTrajectories {
    outcomes: HashMap<String, BTreeMap<RunId, Trajectory>>,
}

impl SimOutcomeTrajectories {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        outcome: &str,
        run: RunId,
        trajectory: Trajectory,
    ) -> Result<(), PlotError> {
        if trajectory.times.len() != trajectory.values.len() {
            return Err(PlotError::RunLengthMismatch {
                outcome: outcome.to_string(),
                run,
                times: trajectory.times.len(),
                values: trajectory.values.len(),
            });
        }
        self.outcomes
            .entry(outcome.to_string())
            .or_default()
            .insert(run, trajectory);
        Ok(())
    }

    /// Every run of `name`, ordered by run id
    pub fn outcome(&self, name: &str) -> Result<&BTreeMap<RunId, Trajectory>, PlotError> {
        self.outcomes
            .get(name)
            .ok_or_else(|| PlotError::MissingOutcome(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.outcomes.contains_key(name)
    }

    pub fn outcome_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.outcomes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Ids of every run seen under any outcome
    pub fn run_ids(&self) -> Vec<RunId> {
        let ids: BTreeSet<RunId> = self
            .outcomes
            .values()
            .flat_map(|runs| runs.keys().copied())
            .collect();
        ids.into_iter().collect()
    }

    /// Runs to draw: all of them, or `n` picked at random, in run order
    pub fn select_runs<R: Rng + ?Sized>(&self, n: Option<usize>, rng: &mut R) -> Vec<RunId> {
        let all = self.run_ids();
        match n {
            Some(n) if n < all.len() => {
                let mut picked = all.into_iter().choose_multiple(rng, n);
                picked.sort_unstable();
                picked
            }
            _ => all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn traj(values: &[f64]) -> Trajectory {
        Trajectory {
            times: (0..values.len()).map(|t| t as f64 / 52.0).collect(),
            values: values.to_vec(),
        }
    }

    fn store(runs: usize) -> SimOutcomeTrajectories {
        let mut store = SimOutcomeTrajectories::new();
        for run in 0..runs {
            store
                .insert("Obs: Incidence rate", run, traj(&[0.0, run as f64]))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_missing_outcome_is_an_error() {
        let store = store(2);
        assert_eq!(store.outcome("Obs: Incidence rate").unwrap().len(), 2);
        assert_eq!(
            store.outcome("Obs: Nothing"),
            Err(PlotError::MissingOutcome("Obs: Nothing".to_string()))
        );
    }

    #[test]
    fn test_rejects_ragged_trajectory() {
        let mut store = SimOutcomeTrajectories::new();
        let err = store
            .insert(
                "In: Susceptible-0-4",
                3,
                Trajectory {
                    times: vec![0.0, 1.0],
                    values: vec![5.0],
                },
            )
            .unwrap_err();

        assert!(matches!(err, PlotError::RunLengthMismatch { run: 3, .. }));
        assert!(!store.contains("In: Susceptible-0-4"));
    }

    #[test]
    fn test_select_runs_is_reproducible() {
        let store = store(20);

        let a = store.select_runs(Some(5), &mut StdRng::from_seed([7u8; 32]));
        let b = store.select_runs(Some(5), &mut StdRng::from_seed([7u8; 32]));

        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_select_runs_returns_all_when_not_limited() {
        let store = store(4);
        let mut rng = StdRng::from_seed([1u8; 32]);

        assert_eq!(store.select_runs(None, &mut rng), vec![0, 1, 2, 3]);
        assert_eq!(store.select_runs(Some(10), &mut rng), vec![0, 1, 2, 3]);
    }
}

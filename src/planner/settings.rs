use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Per-decision planning budget plus the search knobs.
///
/// - `depth`: Maximum trajectory length from the root
/// - `trajectories`: Trajectories sampled per decision
/// - `budget`: Stop early once more samples than this were drawn (0 = unlimited)
/// - `replan`: Throw the tree away before every decision
/// - `parallel`: Run each decision's trajectories on the rayon pool
/// - `search`: Sparse sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub depth: usize,
    pub trajectories: usize,
    pub budget: usize,
    pub replan: bool,
    pub parallel: bool,
    pub search: Config,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depth: PLAN_DEPTH,
            trajectories: PLAN_TRAJECTORIES,
            budget: PLAN_BUDGET,
            replan: false,
            parallel: false,
            search: Config::default(),
        }
    }
}

impl Settings {
    /// Has `expanded` overrun the sampling budget?
    pub fn exhausted(&self, expanded: usize) -> bool {
        self.budget != 0 && expanded > self.budget
    }
}

use crate::*;
use serde::Deserialize;
use serde::Serialize;

/// Knobs for the sparse sampling search.
///
/// - `width`: Successor samples drawn per action on expansion (C)
/// - `memoize`: Reuse nodes for equal `(depth, oracle)` pairs
/// - `shallow`: Store every node in depth bucket 0, so the tree survives
///   real-world time steps but can no longer be discarded level by level
/// - `max_visits`: Stop admitting trajectories into a node after this many (0 = unlimited)
/// - `early_termination`: Abandon descents whose path score falls below the last trajectory's
/// - `uncertainty_rate`: Score children by remaining slack per visit instead of raw bound width
/// - `zero_at_horizon`: Reset bounds to zero where a trajectory hits its length limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: usize,
    pub memoize: bool,
    pub shallow: bool,
    pub max_visits: usize,
    pub early_termination: bool,
    pub uncertainty_rate: bool,
    pub zero_at_horizon: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: SEARCH_WIDTH,
            memoize: true,
            shallow: false,
            max_visits: SEARCH_MAX_VISITS,
            early_termination: false,
            uncertainty_rate: false,
            zero_at_horizon: false,
        }
    }
}

impl Config {
    /// Visit cap, if one is configured.
    pub fn cap(&self) -> Option<usize> {
        match self.max_visits {
            0 => None,
            n => Some(n),
        }
    }
}

/// Problem-level scalars the searcher needs besides its [`Config`].
///
/// `vmin` and `vmax` initialize the bounds of every fresh non-terminal node,
/// so they must bracket every achievable discounted return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub actions: usize,
    pub gamma: Utility,
    pub vmin: Utility,
    pub vmax: Utility,
}

impl Problem {
    /// Panics on scalars no search could be correct under.
    pub fn validate(&self) {
        assert!(self.actions > 0, "problem needs at least one action");
        assert!(
            self.gamma > 0. && self.gamma <= 1.,
            "discount {} outside (0, 1]",
            self.gamma
        );
        assert!(
            self.vmin <= self.vmax,
            "value bounds inverted: vmin {} > vmax {}",
            self.vmin,
            self.vmax
        );
    }
    /// Total slack between the global value bounds.
    pub fn range(&self) -> Utility {
        self.vmax - self.vmin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = Config::default();
        assert_eq!(config.width, SEARCH_WIDTH);
        assert!(config.memoize);
        assert!(!config.shallow);
        assert_eq!(config.cap(), None);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = serde_json::from_str::<Config>(r#"{ "width": 2, "max_visits": 7 }"#)
            .expect("valid config json");
        assert_eq!(config.width, 2);
        assert_eq!(config.cap(), Some(7));
        assert!(config.memoize);
        assert!(!config.early_termination);
    }

    #[test]
    #[should_panic(expected = "discount")]
    fn zero_discount_is_rejected() {
        Problem {
            actions: 2,
            gamma: 0.,
            vmin: 0.,
            vmax: 1.,
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "inverted")]
    fn inverted_bounds_are_rejected() {
        Problem {
            actions: 2,
            gamma: 0.9,
            vmin: 1.,
            vmax: 0.,
        }
        .validate();
    }
}

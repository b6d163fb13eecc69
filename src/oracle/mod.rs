//! Generative model capabilities consumed by the search.
//!
//! The planner never inspects states directly. Everything it knows about
//! the world comes through an [`Oracle`]: a handle that can sample one
//! successor per action, report whether it is absorbing, and be compared
//! and hashed so that equal handles share a search node.
//!
//! # Capabilities
//!
//! - **Required**: [`Oracle::next`], [`Oracle::terminal`], `Eq + Hash`
//! - **Optional**: [`ActionFilter`], exposed through [`Oracle::filter`]
//!
//! The optional capability is queried once, when a node is created. The
//! returned filter is retained by the node and consulted on every expansion
//! and backup, so a filter backed by shared state may change its answers
//! over the lifetime of the node and the node follows its latest answer.
use crate::Action;
use crate::Utility;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// A state (or belief) the planner can ask about.
///
/// Equality and hashing define when two reachable states are "the same"
/// for memoization. That is a modeling choice of the implementor: a belief
/// oracle may compare by posterior parameters, a tabular oracle by state index.
///
/// # Requirements
///
/// Types implementing this trait must be:
/// - `Clone`: Stored in the memo table and in each node until expansion
/// - `Hash` + `Eq`: Usable as memo table keys
/// - `Debug`: Printable in trace dumps
/// - `Send` + `Sync`: Safe for parallel trajectories
pub trait Oracle
where
    Self: Send + Sync + 'static,
    Self: Clone,
    Self: PartialEq + Eq,
    Self: std::fmt::Debug,
    Self: std::hash::Hash,
{
    /// Draw one successor and its immediate reward for taking `action`.
    ///
    /// `None` means the model has no successor to offer, which violates the
    /// modeling contract and aborts the search.
    fn next(&self, action: Action, rng: &mut SmallRng) -> Option<(Self, Utility)>;

    /// Is this an absorbing state? Terminal nodes are never expanded and
    /// contribute a value of exactly zero.
    fn terminal(&self) -> bool;

    /// Runtime capability query for action legality.
    /// `None` means every action is always legal.
    fn filter(&self) -> Option<Arc<dyn ActionFilter>> {
        None
    }
}

/// Restricts which actions are legal in a state.
pub trait ActionFilter: Send + Sync {
    fn available(&self, action: Action) -> bool;
}

/// Legality of `action` under an optional filter.
pub fn available(filter: Option<&Arc<dyn ActionFilter>>, action: Action) -> bool {
    filter.map_or(true, |f| f.available(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    struct Toggle(AtomicBool);
    impl ActionFilter for Toggle {
        fn available(&self, action: Action) -> bool {
            action == 0 || self.0.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn missing_filter_allows_everything() {
        assert!((0..16).all(|a| available(None, a)));
    }

    #[test]
    fn filter_answers_track_shared_state() {
        let toggle = Arc::new(Toggle(AtomicBool::new(false)));
        let filter: Arc<dyn ActionFilter> = toggle.clone();
        assert!(available(Some(&filter), 0));
        assert!(!available(Some(&filter), 1));
        toggle.0.store(true, Ordering::Relaxed);
        assert!(available(Some(&filter), 1));
    }
}

use super::node::Node;
use crate::Oracle;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A sampled outcome of one action: the child it led to and how many of
/// the `C` samples landed there.
#[derive(Debug)]
pub struct Branch<O>
where
    O: Oracle,
{
    pub child: Arc<Node<O>>,
    pub count: usize,
}

impl<O> From<Arc<Node<O>>> for Branch<O>
where
    O: Oracle,
{
    fn from(child: Arc<Node<O>>) -> Self {
        Self { child, count: 0 }
    }
}

impl<O> Branch<O>
where
    O: Oracle,
{
    /// Fraction of the action's samples that produced this child.
    pub fn weight(&self, width: usize) -> crate::Probability {
        self.count as crate::Probability / width as crate::Probability
    }
}

/// Outcome distribution of one action, keyed by child id so iteration
/// order (and therefore tie-breaking) is reproducible.
pub type Branches<O> = BTreeMap<usize, Branch<O>>;

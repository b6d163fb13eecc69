use crate::Utility;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// A value bound readable without taking the owning node's lock.
///
/// Writers still hold the node lock, so a bound only ever changes inside
/// `expand`, `backup`, or a horizon reset. Parents read their children's
/// bounds through this cell and never lock a child.
#[derive(Debug)]
pub struct Bound(AtomicU64);

impl Bound {
    pub fn new(value: Utility) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }
    pub fn get(&self) -> Utility {
        Utility::from_bits(self.0.load(Ordering::Acquire))
    }
    pub fn set(&self, value: Utility) {
        self.0.store(value.to_bits(), Ordering::Release)
    }
}

impl From<Utility> for Bound {
    fn from(value: Utility) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_exact_bits() {
        let bound = Bound::from(-0.1);
        assert_eq!(bound.get(), -0.1);
        bound.set(Utility::MAX);
        assert_eq!(bound.get(), Utility::MAX);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation for a single `solve` call. Checked by the
/// search driver after every conflict/propagation; once either counter is
/// exceeded (or the interrupt flag is set from another thread) `solve`
/// returns `Undetermined` at a clean, resumable state.
pub struct Budget {
    conflict_budget: i64,
    propagation_budget: i64,
    asynch_interrupt: AtomicBool,
}

impl Budget {
    pub fn new() -> Budget {
        Budget { conflict_budget: -1, propagation_budget: -1, asynch_interrupt: AtomicBool::new(false) }
    }

    pub fn with_limits(conf_limit: u64, prop_limit: u64) -> Budget {
        Budget {
            conflict_budget: if conf_limit == 0 { -1 } else { conf_limit as i64 },
            propagation_budget: if prop_limit == 0 { -1 } else { prop_limit as i64 },
            asynch_interrupt: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn within(&self, conflicts: u64, propagations: u64) -> bool {
        if self.asynch_interrupt.load(Ordering::Relaxed) {
            return false;
        }
        if self.conflict_budget >= 0 && conflicts as i64 >= self.conflict_budget {
            return false;
        }
        if self.propagation_budget >= 0 && propagations as i64 >= self.propagation_budget {
            return false;
        }
        true
    }

    pub fn interrupt(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    pub fn off(&self) -> bool {
        self.conflict_budget < 0 && self.propagation_budget < 0
    }
}

impl Default for Budget {
    fn default() -> Budget {
        Budget::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_budget_is_always_within() {
        let b = Budget::new();
        assert!(b.within(1_000_000, 1_000_000));
    }

    #[test]
    fn conflict_limit_is_enforced() {
        let b = Budget::with_limits(10, 0);
        assert!(b.within(9, 0));
        assert!(!b.within(10, 0));
    }

    #[test]
    fn interrupt_stops_immediately() {
        let b = Budget::new();
        b.interrupt();
        assert!(!b.within(0, 0));
    }
}

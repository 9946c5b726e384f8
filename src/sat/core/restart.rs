/// A fixed-capacity ring buffer tracking a running sum, so the moving
/// average of the last `capacity` samples is available in O(1)
/// (spec.md §4.8, `bq_lbd`/`bq_trail`).
pub struct BoundedQueue {
    buffer: Vec<f64>,
    capacity: usize,
    next: usize,
    sum: f64,
    full: bool,
}

impl BoundedQueue {
    pub fn new(capacity: usize) -> BoundedQueue {
        BoundedQueue { buffer: vec![0.0; capacity], capacity, next: 0, sum: 0.0, full: false }
    }

    pub fn push(&mut self, value: f64) {
        if self.full {
            self.sum -= self.buffer[self.next];
        }
        self.buffer[self.next] = value;
        self.sum += value;
        self.next += 1;
        if self.next == self.capacity {
            self.next = 0;
            self.full = true;
        }
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn average(&self) -> f64 {
        let n = if self.full { self.capacity } else { self.next };
        if n == 0 {
            0.0
        } else {
            self.sum / (n as f64)
        }
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.sum = 0.0;
        self.full = false;
    }
}

#[derive(Clone)]
pub struct RestartSettings {
    /// Fast/slow LBD-window restart factor (`f_rst`, `K` in spec.md §4.8).
    pub f_rst: f64,
    /// Trail-window restart factor (`b_rst`, `R` in spec.md §4.8).
    pub b_rst: f64,
    pub sz_lbd_bqueue: usize,
    pub sz_trail_bqueue: usize,
    /// Minimum conflicts before block restarts engage (`fst_block_rst`).
    pub fst_block_rst: u64,
}

impl Default for RestartSettings {
    fn default() -> RestartSettings {
        RestartSettings { f_rst: 0.8, b_rst: 1.4, sz_lbd_bqueue: 50, sz_trail_bqueue: 5000, fst_block_rst: 10000 }
    }
}

/// Glucose-style restart gate (spec.md §4.8): restarts when the recent
/// (fast) LBD average runs well above the slow global LBD average *and*
/// the trail stays comparatively deep, which is the signal that search is
/// thrashing rather than making real progress.
pub struct RestartPolicy {
    settings: RestartSettings,
    lbd_fast: BoundedQueue,
    lbd_slow_sum: f64,
    lbd_slow_count: u64,
    trail_queue: BoundedQueue,
}

impl RestartPolicy {
    pub fn new(settings: RestartSettings) -> RestartPolicy {
        let lbd_fast = BoundedQueue::new(settings.sz_lbd_bqueue);
        let trail_queue = BoundedQueue::new(settings.sz_trail_bqueue);
        RestartPolicy { settings, lbd_fast, lbd_slow_sum: 0.0, lbd_slow_count: 0, trail_queue }
    }

    pub fn record_conflict(&mut self, lbd: u32, trail_len: usize) {
        self.lbd_fast.push(lbd as f64);
        self.lbd_slow_sum += lbd as f64;
        self.lbd_slow_count += 1;
        self.trail_queue.push(trail_len as f64);
    }

    /// `current_trail_len` is the trail length at the moment of the last
    /// conflict, used to defer ("block") a restart when the search is
    /// currently deeper than its recent average — restarting there would
    /// discard more progress than the thrashing signal justifies.
    pub fn should_restart(&self, conflicts: u64, current_trail_len: usize) -> bool {
        if conflicts < self.settings.fst_block_rst || !self.lbd_fast.is_full() {
            return false;
        }

        let slow_avg = self.lbd_slow_sum / (self.lbd_slow_count as f64);
        let fast_avg = self.lbd_fast.average();
        if fast_avg * self.settings.f_rst <= slow_avg {
            return false;
        }

        if self.trail_queue.is_full() && (current_trail_len as f64) > self.trail_queue.average() * self.settings.b_rst {
            return false;
        }

        true
    }

    pub fn reset_fast(&mut self) {
        self.lbd_fast.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_partial_window() {
        let mut q = BoundedQueue::new(4);
        q.push(1.0);
        q.push(3.0);
        assert_eq!(q.average(), 2.0);
        assert!(!q.is_full());
    }

    #[test]
    fn average_after_wraparound() {
        let mut q = BoundedQueue::new(2);
        q.push(10.0);
        q.push(20.0);
        assert!(q.is_full());
        q.push(30.0); // evicts 10.0
        assert_eq!(q.average(), 25.0);
    }

    #[test]
    fn restart_is_withheld_before_window_fills() {
        let policy = RestartPolicy::new(RestartSettings { fst_block_rst: 0, sz_lbd_bqueue: 5, ..RestartSettings::default() });
        assert!(!policy.should_restart(1, 0));
    }
}

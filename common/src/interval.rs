/// Elapsed-interval detector over a monotonic millisecond clock. A cycle
/// fires when `now > last_fire + interval`; on fire, `last_fire` advances to
/// the current time rather than the ideal boundary, so drift accumulates
/// under scheduling jitter. At boot the first cycle is held back one extra
/// interval (`last_fire` seeds to `now + interval`).
#[derive(Debug)]
pub struct IntervalScheduler {
    interval_ms: u64,
    last_fire_ms: u64,
}

impl IntervalScheduler {
    pub fn new(now_ms: u64, interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fire_ms: now_ms + interval_ms,
        }
    }

    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms > self.last_fire_ms + self.interval_ms {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_holds_first_cycle_back_one_extra_interval() {
        let mut scheduler = IntervalScheduler::new(0, 1_000);

        assert!(!scheduler.poll(1_000));
        assert!(!scheduler.poll(2_000));
        assert!(scheduler.poll(2_001));
    }

    #[test]
    fn comparison_is_strict() {
        let mut scheduler = IntervalScheduler::new(0, 1_000);
        scheduler.poll(2_001);

        assert!(!scheduler.poll(3_001));
        assert!(scheduler.poll(3_002));
    }

    #[test]
    fn late_fire_advances_to_now_and_drifts() {
        let mut scheduler = IntervalScheduler::new(0, 1_000);

        // Fired late: the next window is measured from the late fire time,
        // not the ideal boundary.
        assert!(scheduler.poll(2_750));
        assert!(!scheduler.poll(3_500));
        assert!(scheduler.poll(3_751));
    }
}

// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// Linear warm-up followed by linear decay, the schedule used
// for transformer fine-tuning:
//
//   lr(s) = base * s / warmup                    for s < warmup
//   lr(s) = base * (total - s) / (total - warmup) clamped at 0
//
// Step indices are 0-based and count optimizer updates. The
// first update therefore runs at lr 0 and the peak is reached
// exactly at s = warmup.
//
// Burn's optimizer takes the learning rate as an argument on
// every `step` call, so the schedule is a plain iterator-style
// struct rather than an optimizer wrapper.
//
// Reference: Devlin et al. (2019) BERT, Appendix A.2

/// Warm-up + linear-decay schedule over a fixed step budget.
#[derive(Debug, Clone)]
pub struct LinearDecaySchedule {
    base_lr:      f64,
    warmup_steps: usize,
    total_steps:  usize,
    current:      usize,
}

impl LinearDecaySchedule {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self { base_lr, warmup_steps, total_steps, current: 0 }
    }

    /// Learning rate for the upcoming optimizer update,
    /// advancing the schedule by one step.
    pub fn next_lr(&mut self) -> f64 {
        let lr = self.base_lr * self.factor(self.current);
        self.current += 1;
        lr
    }

    fn factor(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            step as f64 / self.warmup_steps.max(1) as f64
        } else {
            let remaining = self.total_steps.saturating_sub(step) as f64;
            let decay_len = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f64;
            (remaining / decay_len).max(0.0)
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_starts_at_zero_and_peaks_at_base() {
        let mut s = LinearDecaySchedule::new(1e-3, 100, 1000);
        assert_eq!(s.next_lr(), 0.0);

        // Steps 1..=99 climb linearly
        for _ in 1..100 {
            s.next_lr();
        }
        // Step 100 is the peak
        assert!((s.next_lr() - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn test_decays_to_zero_at_total_steps() {
        let mut s = LinearDecaySchedule::new(1e-3, 100, 1000);
        let mut last = 0.0;
        for _ in 0..1000 {
            last = s.next_lr();
        }
        // Step 999 is the last non-zero rate, step 1000 hits zero
        assert!(last > 0.0);
        assert_eq!(s.next_lr(), 0.0);
        assert_eq!(s.next_lr(), 0.0);
    }

    #[test]
    fn test_monotonic_decay_after_warmup() {
        let mut s = LinearDecaySchedule::new(2e-5, 10, 50);
        for _ in 0..=10 {
            s.next_lr();
        }
        let mut prev = f64::MAX;
        for _ in 11..50 {
            let lr = s.next_lr();
            assert!(lr < prev);
            prev = lr;
        }
    }

    #[test]
    fn test_zero_warmup_starts_at_base() {
        let mut s = LinearDecaySchedule::new(1e-4, 0, 10);
        assert!((s.next_lr() - 1e-4).abs() < 1e-12);
    }
}

//! Trailing mean over an ordered series.
//!
//! Unlike a fixed-period SMA there is no warmup: position `i` averages
//! `closes[max(0, i + 1 - window)..=i]`, so the first values use a shorter
//! window instead of NaN.

#[derive(Debug, Clone, Copy)]
pub struct TrailingMean {
    window: usize,
}

impl TrailingMean {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "trailing mean window must be >= 1");
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// One mean per input value, in input order.
    /// Each window is summed directly, so there is no rolling-sum drift.
    pub fn compute(&self, closes: &[f64]) -> Vec<f64> {
        (0..closes.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.window);
                let window = &closes[start..=i];
                window.iter().sum::<f64>() / window.len() as f64
            })
            .collect()
    }
}

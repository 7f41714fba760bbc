/// Exponential moving average, computed incrementally.
///
/// Seeded with the first observation, then
/// `value = α·price + (1−α)·prev` with `α = 2/(window+1)`.
/// `is_warm()` turns true once `window` bars have been absorbed; callers
/// treat the pre-warm value as unusable for scoring.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    window: usize,
    count: usize,
    pub value: f64,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        Self {
            alpha: 2.0 / (window as f64 + 1.0),
            window,
            count: 0,
            value: 0.0,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        if self.count == 0 {
            self.value = price;
        } else {
            self.value = self.alpha * price + (1.0 - self.alpha) * self.value;
        }
        self.count += 1;
        self.value
    }

    pub fn is_warm(&self) -> bool {
        self.count >= self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurrence_matches_hand_computation() {
        // window 4 -> alpha = 0.4
        let mut ema = Ema::new(4);

        assert!((ema.update(50.0) - 50.0).abs() < 1e-12);
        assert!(!ema.is_warm());

        // 0.4*55 + 0.6*50 = 52
        assert!((ema.update(55.0) - 52.0).abs() < 1e-12);

        // 0.4*49 + 0.6*52 = 50.8
        assert!((ema.update(49.0) - 50.8).abs() < 1e-12);
        assert!(!ema.is_warm());

        // 0.4*52 + 0.6*50.8 = 51.28, warm after 4 bars
        assert!((ema.update(52.0) - 51.28).abs() < 1e-12);
        assert!(ema.is_warm());
    }
}

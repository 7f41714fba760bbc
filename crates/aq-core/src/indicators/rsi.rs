/// Relative Strength Index with Wilder smoothing.
///
/// Holds the neutral 50 until `window` close-to-close changes have been
/// seen; after that, average gain/loss roll with weight `(N−1)/N`.
#[derive(Debug, Clone)]
pub struct Rsi {
    window: usize,
    prev_close: f64,
    has_prev: bool,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    changes: usize,
    warm: bool,
    pub value: f64,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            prev_close: 0.0,
            has_prev: false,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            changes: 0,
            warm: false,
            value: 50.0,
        }
    }

    pub fn update(&mut self, close: f64) -> f64 {
        if !self.has_prev {
            self.prev_close = close;
            self.has_prev = true;
            return self.value;
        }

        let change = close - self.prev_close;
        self.prev_close = close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if !self.warm {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.changes += 1;
            if self.changes < self.window {
                return self.value;
            }
            self.avg_gain = self.gain_sum / self.window as f64;
            self.avg_loss = self.loss_sum / self.window as f64;
            self.warm = true;
        } else {
            let w = self.window as f64;
            self.avg_gain = (self.avg_gain * (w - 1.0) + gain) / w;
            self.avg_loss = (self.avg_loss * (w - 1.0) + loss) / w;
        }

        self.value = if self.avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss)
        };
        self.value
    }

    pub fn is_warm(&self) -> bool {
        self.warm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_neutral_until_enough_changes() {
        let mut rsi = Rsi::new(3);
        assert_eq!(rsi.update(100.0), 50.0);
        assert_eq!(rsi.update(101.0), 50.0);
        assert_eq!(rsi.update(102.0), 50.0);
        assert!(!rsi.is_warm());
        // Fourth close supplies the third change: warm.
        let v = rsi.update(103.0);
        assert!(rsi.is_warm());
        assert!(v.is_finite());
    }

    #[test]
    fn monotone_gains_saturate_at_100() {
        let mut rsi = Rsi::new(3);
        for close in [10.0, 11.0, 12.0, 13.0, 14.0] {
            rsi.update(close);
        }
        assert_eq!(rsi.value, 100.0);
    }

    #[test]
    fn balanced_alternation_sits_near_midpoint() {
        let mut rsi = Rsi::new(2);
        for close in [100.0, 101.0, 100.0, 101.0, 100.0, 101.0] {
            rsi.update(close);
        }
        assert!((rsi.value - 50.0).abs() < 10.0);
    }
}

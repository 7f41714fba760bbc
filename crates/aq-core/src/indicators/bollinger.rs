use super::RingBuf;

/// Bollinger bands over a rolling close window: SMA midline ± 2 population
/// standard deviations. Until the window fills, all three lines collapse
/// onto the running mean and the band width is zero.
#[derive(Debug, Clone)]
pub struct Bollinger {
    ring: RingBuf,
    num_std: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// Band width as a fraction of the midline.
    pub fn width(&self) -> f64 {
        if self.middle > 0.0 {
            (self.upper - self.lower) / self.middle
        } else {
            0.0
        }
    }
}

impl Bollinger {
    pub fn new(window: usize) -> Self {
        Self {
            ring: RingBuf::new(window),
            num_std: 2.0,
        }
    }

    pub fn update(&mut self, close: f64) -> Bands {
        self.ring.push(close);
        let middle = self.ring.mean();
        if !self.ring.full() {
            return Bands {
                upper: middle,
                middle,
                lower: middle,
            };
        }
        let std = self.ring.std_pop();
        Bands {
            upper: middle + self.num_std * std,
            middle,
            lower: middle - self.num_std * std,
        }
    }

    pub fn is_warm(&self) -> bool {
        self.ring.full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_series_has_zero_width() {
        let mut bb = Bollinger::new(3);
        bb.update(100.0);
        bb.update(100.0);
        let bands = bb.update(100.0);
        assert!(bb.is_warm());
        assert_eq!(bands.upper, 100.0);
        assert_eq!(bands.lower, 100.0);
        assert_eq!(bands.width(), 0.0);
    }

    #[test]
    fn known_window_produces_expected_bands() {
        let mut bb = Bollinger::new(4);
        for close in [10.0, 12.0, 14.0, 16.0] {
            bb.update(close);
        }
        let bands = bb.update(16.0); // window is now [12, 14, 16, 16]
        let mean = (12.0 + 14.0 + 16.0 + 16.0) / 4.0;
        let var = [12.0f64, 14.0, 16.0, 16.0]
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / 4.0;
        assert!((bands.middle - mean).abs() < 1e-12);
        assert!((bands.upper - (mean + 2.0 * var.sqrt())).abs() < 1e-12);
        assert!((bands.lower - (mean - 2.0 * var.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn pre_warm_bands_collapse_to_mean() {
        let mut bb = Bollinger::new(5);
        let bands = bb.update(40.0);
        assert!(!bb.is_warm());
        assert_eq!(bands.upper, bands.lower);
        assert_eq!(bands.middle, 40.0);
    }
}

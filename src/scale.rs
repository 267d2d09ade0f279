/// Continuous mapping from a data domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Extends the domain outward to round tick boundaries.
    pub fn nice(mut self, count: usize) -> Self {
        let (d0, d1) = self.domain;
        let step = tick_step(d0, d1, count);
        if step > 0.0 && step.is_finite() {
            self.domain = ((d0 / step).floor() * step, (d1 / step).ceil() * step);
        }
        self
    }

    /// Roughly `count` evenly spaced values of 1, 2 or 5 times a power of ten.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        let step = tick_step(lo, hi, count);
        if step <= 0.0 || !step.is_finite() {
            return vec![lo];
        }

        let start = (lo / step).ceil() as i64;
        let stop = (hi / step).floor() as i64;
        (start..=stop).map(|i| i as f64 * step).collect()
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let span = hi - lo;
    if span <= 0.0 || count == 0 {
        return 0.0;
    }
    let raw = span / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Categorical mapping of distinct labels to equal-width bands.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: (f64, f64),
    pub padding: f64,
}

impl BandScale {
    pub fn new(domain: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        Self {
            domain,
            range,
            padding: padding.clamp(0.0, 1.0),
        }
    }

    fn step(&self) -> f64 {
        let n = self.domain.len() as f64;
        let slots = n - self.padding + 2.0 * self.padding;
        if slots <= 0.0 {
            0.0
        } else {
            (self.range.1 - self.range.0) / slots
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Left edge of the band for `label`.
    pub fn position(&self, label: &str) -> Option<f64> {
        let index = self.domain.iter().position(|d| d == label)?;
        let step = self.step();
        Some(self.range.0 + step * self.padding + step * index as f64)
    }

    pub fn center(&self, label: &str) -> Option<f64> {
        self.position(label).map(|x| x + self.bandwidth() / 2.0)
    }
}

/// Maps a numeric domain onto a colour ramp between two anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialColor {
    pub domain: (f64, f64),
    pub low: (u8, u8, u8),
    pub high: (u8, u8, u8),
}

impl SequentialColor {
    pub fn blues(domain: (f64, f64)) -> Self {
        Self {
            domain,
            low: (0xde, 0xeb, 0xf7),
            high: (0x08, 0x30, 0x6b),
        }
    }

    pub fn color(&self, value: f64) -> String {
        let (d0, d1) = self.domain;
        let t = if d1 == d0 {
            1.0
        } else {
            ((value - d0) / (d1 - d0)).clamp(0.0, 1.0)
        };
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.low.0, self.high.0),
            channel(self.low.1, self.high.1),
            channel(self.low.2, self.high.2)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_maps_endpoints_and_midpoint() {
        let x = LinearScale::new((0.0, 12.0), (60.0, 760.0));
        assert_eq!(x.map(0.0), 60.0);
        assert_eq!(x.map(12.0), 760.0);
        assert_eq!(x.map(6.0), 410.0);
    }

    #[test]
    fn inverted_range_for_vertical_axes() {
        let y = LinearScale::new((0.0, 1.0), (450.0, 50.0));
        assert_eq!(y.map(0.0), 450.0);
        assert_eq!(y.map(1.0), 50.0);
    }

    #[test]
    fn ticks_use_round_steps() {
        let x = LinearScale::new((0.0, 12.0), (0.0, 1.0));
        assert_eq!(x.ticks(12).len(), 13);
        let y = LinearScale::new((0.0, 1.0), (0.0, 1.0));
        let ticks = y.ticks(5);
        assert_eq!(ticks.len(), 6);
        assert!((ticks[1] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn nice_rounds_domain_outward() {
        let y = LinearScale::new((0.0, 37.0), (0.0, 1.0)).nice(5);
        assert_eq!(y.domain, (0.0, 40.0));
    }

    #[test]
    fn degenerate_domain_maps_to_range_center() {
        let x = LinearScale::new((3.0, 3.0), (0.0, 100.0));
        assert_eq!(x.map(3.0), 50.0);
        assert_eq!(x.ticks(5), vec![3.0]);
    }

    #[test]
    fn band_positions_respect_padding() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let band = BandScale::new(labels, (0.0, 220.0), 0.2);
        let step = 220.0 / 2.2;
        assert!((band.position("a").unwrap() - step * 0.2).abs() < 1e-9);
        assert!((band.bandwidth() - step * 0.8).abs() < 1e-9);
        assert!(band.position("c").is_none());
    }

    #[test]
    fn sequential_color_hits_anchors() {
        let scale = SequentialColor::blues((0.0, 10.0));
        assert_eq!(scale.color(0.0), "#deebf7");
        assert_eq!(scale.color(10.0), "#08306b");
        assert_eq!(scale.color(99.0), "#08306b");
    }
}

use crate::util::Interval;

/// A lookup table of evenly spaced samples, including both end points
/// of its range, which is linearly interpolated between samples.
#[derive(Clone, Debug)]
pub struct LookupTable {
    range: Interval,
    values: Vec<f64>,
}

impl LookupTable {
    /// Creates a lookup table from `count` samples of a function.
    /// A single sample yields a constant table.
    pub fn from_samples(range: Interval, count: usize, mut f: impl FnMut(f64) -> f64) -> Self {
        let count = count.max(1);
        let values = (0..count).map(|i| f(range.lerp(Self::frac(i, count)))).collect();
        Self { range, values }
    }

    /// The range covered by the table.
    pub fn range(&self) -> Interval {
        self.range
    }

    /// The tabulated values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The abscissa of the sample at `idx`.
    pub fn x(&self, idx: usize) -> f64 {
        self.range.lerp(Self::frac(idx, self.values.len()))
    }

    /// Samples the lookup table, clamping outside the range.
    pub fn sample(&self, x: f64) -> f64 {
        let n = self.values.len();
        if n == 1 || self.range.length() <= 0.0 {
            return self.values[0];
        }
        let t = self.range.inv_lerp(self.range.clamp(x)) * (n - 1) as f64;
        let idx = usize::min(t.floor() as usize, n - 2);
        let rem = t - idx as f64;
        self.values[idx] + rem * (self.values[idx + 1] - self.values[idx])
    }

    fn frac(idx: usize, count: usize) -> f64 {
        if count <= 1 {
            0.0
        } else {
            idx as f64 / (count - 1) as f64
        }
    }
}

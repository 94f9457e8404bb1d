/// A piecewise linear function through a set of support points,
/// held constant beyond the first and last point.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PiecewiseLinear {
    points: Vec<(f64, f64)>,
}

impl PiecewiseLinear {
    /// Creates the function from `(x, y)` points; the points are sorted by `x`.
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// Whether the function has no support points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluates the function, or returns `default` if it has no points.
    pub fn eval_or(&self, x: f64, default: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return default,
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        let idx = self.points.partition_point(|p| p.0 <= x);
        let (x0, y0) = self.points[idx - 1];
        let (x1, y1) = self.points[idx];
        y0 + (x - x0) / (x1 - x0) * (y1 - y0)
    }
}

#[cfg(test)]
mod test {
    use super::PiecewiseLinear;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn interpolates_and_holds() {
        let f = PiecewiseLinear::new(vec![(100.0, 0.5), (0.0, 1.0), (200.0, 0.5)]);
        assert_eq!(f.eval_or(-10.0, 9.0), 1.0);
        assert_approx_eq!(f.eval_or(50.0, 9.0), 0.75);
        assert_approx_eq!(f.eval_or(150.0, 9.0), 0.5);
        assert_eq!(f.eval_or(500.0, 9.0), 0.5);
        assert_eq!(PiecewiseLinear::default().eval_or(1.0, 9.0), 9.0);
    }
}

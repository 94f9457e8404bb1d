/// Rounds to the nearest integer, halves rounding up, as `floor(x + 0.5)`.
#[inline(always)]
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Rounds to the nearest integer cell count. Infinite values saturate.
#[inline(always)]
pub fn to_cells(x: f64) -> i64 {
    round_half_up(x) as i64
}

/// A smooth step from 0 to 1 centred at `x == 0` with the given `width`.
///
/// # Parameters
/// * `x` - The signed distance from the centre of the transition
/// * `width` - The width of the transition, must be positive
#[inline(always)]
pub fn smooth_step(x: f64, width: f64) -> f64 {
    0.5 * (1.0 + (x / width).tanh())
}

/// Takes the minimum of two values, treating NaN as "no constraint".
#[inline(always)]
pub fn min_constraint(a: f64, b: f64) -> f64 {
    if b.is_nan() {
        a
    } else if a.is_nan() {
        b
    } else {
        a.min(b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round_half_up(3.4), 3.0);
        assert_eq!(round_half_up(3.5), 4.0);
        assert_eq!(round_half_up(3.6), 4.0);
        assert_eq!(to_cells(f64::INFINITY), i64::MAX);
    }

    #[test]
    fn smooth_step_is_centred() {
        assert_eq!(smooth_step(0.0, 1.0), 0.5);
        assert!(smooth_step(5.0, 1.0) > 0.99);
        assert!(smooth_step(-5.0, 1.0) < 0.01);
    }

    #[test]
    fn nan_is_no_constraint() {
        assert_eq!(min_constraint(1.0, f64::NAN), 1.0);
        assert_eq!(min_constraint(f64::NAN, -2.0), -2.0);
        assert_eq!(min_constraint(1.0, -2.0), -2.0);
    }
}

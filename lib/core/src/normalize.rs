//! Score normalization.
//!
//! Retrieval scores arrive on two incompatible scales: a native index
//! relevance already in `[0, 1]`, and raw cosine similarity in `[-1, 1]`.
//! [`to_percentage`] maps either onto `0..=100` without knowing which path
//! produced the score.

/// Map a raw retrieval score to a whole percentage.
///
/// - `0 <= score <= 1`: `round(score * 100)`
/// - otherwise: `round(clamp((score + 1) / 2, 0, 1) * 100)`
///
/// Non-finite scores map to `0`. The padding sentinel `0.0` therefore shows
/// as `0`.
#[inline]
pub fn to_percentage(score: f32) -> u8 {
    if !score.is_finite() {
        return 0;
    }

    let ratio = if (0.0..=1.0).contains(&score) {
        score
    } else {
        ((score + 1.0) / 2.0).clamp(0.0, 1.0)
    };

    (ratio * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_range_is_linear() {
        assert_eq!(to_percentage(0.42), 42);
        assert_eq!(to_percentage(0.0), 0);
        assert_eq!(to_percentage(1.0), 100);
        assert_eq!(to_percentage(0.004), 0);
    }

    #[test]
    fn test_negative_cosine_is_shifted() {
        assert_eq!(to_percentage(-1.0), 0);
        assert_eq!(to_percentage(-0.5), 25);
        assert_eq!(to_percentage(-0.2), 40);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(to_percentage(-3.0), 0);
        assert_eq!(to_percentage(1.5), 100);
        assert_eq!(to_percentage(42.0), 100);
        assert_eq!(to_percentage(f32::NAN), 0);
        assert_eq!(to_percentage(f32::INFINITY), 0);
    }

    #[test]
    fn test_always_within_bounds() {
        let mut s = -5.0f32;
        while s <= 5.0 {
            assert!(to_percentage(s) <= 100);
            s += 0.01;
        }
    }

    #[test]
    fn test_monotonic_on_each_scale() {
        let mut prev = 0;
        for i in 0..=100 {
            let p = to_percentage(i as f32 / 100.0);
            assert!(p >= prev);
            prev = p;
        }

        let mut prev = 0;
        for i in -100..0 {
            let p = to_percentage(i as f32 / 100.0);
            assert!(p >= prev);
            prev = p;
        }
    }
}

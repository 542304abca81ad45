//! Positional window helpers: shift, highest, lowest.

use crate::domain::series::Series;

/// Lag the series by `offset` bars; the first `offset` positions are
/// undefined. Shifting is intentional lookback, so no warmup warning is
/// attached to it.
pub fn shift(series: &Series, offset: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];
    for i in offset..len {
        points[i] = series.get(i - offset);
    }
    Series::from_points(points)
}

/// Rolling extreme over `period` bars, folding with `pick` (`f64::max` for
/// highest, `f64::min` for lowest).
pub fn rolling_extreme(series: &Series, period: usize, pick: impl Fn(f64, f64) -> f64) -> Series {
    let len = series.len();
    let mut points = vec![None; len];

    for i in 0..len {
        if i + 1 < period {
            continue;
        }
        let window = &series.points[i + 1 - period..=i];
        if window.iter().all(|p| p.is_some()) {
            points[i] = window.iter().map(|p| p.unwrap()).reduce(&pick);
        }
    }

    Series::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_lags_by_offset() {
        let s = Series::from_values(vec![1.0, 2.0, 3.0, 4.0]);
        let out = shift(&s, 2);
        assert_eq!(out.points, vec![None, None, Some(1.0), Some(2.0)]);
    }

    #[test]
    fn shift_preserves_undefined_positions() {
        let s = Series::from_points(vec![None, Some(2.0), Some(3.0)]);
        let out = shift(&s, 1);
        assert_eq!(out.points, vec![None, None, Some(2.0)]);
    }

    #[test]
    fn shift_beyond_length_is_all_undefined() {
        let s = Series::from_values(vec![1.0, 2.0]);
        let out = shift(&s, 10);
        assert_eq!(out.points, vec![None, None]);
    }

    #[test]
    fn highest_and_lowest() {
        let s = Series::from_values(vec![3.0, 1.0, 4.0, 1.0, 5.0]);
        let high = rolling_extreme(&s, 3, f64::max);
        let low = rolling_extreme(&s, 3, f64::min);
        assert_eq!(high.points, vec![None, None, Some(4.0), Some(4.0), Some(5.0)]);
        assert_eq!(low.points, vec![None, None, Some(1.0), Some(1.0), Some(1.0)]);
    }
}

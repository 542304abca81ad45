//! Simple moving average.

use crate::domain::series::Series;

/// Rolling mean over `period` bars. A position is defined only when every
/// bar in its window is defined.
pub fn compute(series: &Series, period: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];

    for i in 0..len {
        if i + 1 < period {
            continue;
        }
        let window = &series.points[i + 1 - period..=i];
        if window.iter().all(|p| p.is_some()) {
            let sum: f64 = window.iter().map(|p| p.unwrap()).sum();
            points[i] = Some(sum / period as f64);
        }
    }

    Series::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn sma_basic() {
        let s = Series::from_values(vec![10.0, 20.0, 30.0, 40.0]);
        let out = compute(&s, 3);
        assert_eq!(out.points[0], None);
        assert_eq!(out.points[1], None);
        assert!((out.points[2].unwrap() - 20.0).abs() < EPS);
        assert!((out.points[3].unwrap() - 30.0).abs() < EPS);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let s = Series::from_values(vec![1.5, 2.5]);
        let out = compute(&s, 1);
        assert_eq!(out.points, vec![Some(1.5), Some(2.5)]);
    }

    #[test]
    fn sma_period_longer_than_data() {
        let s = Series::from_values(vec![1.0, 2.0]);
        let out = compute(&s, 5);
        assert_eq!(out.points, vec![None, None]);
    }

    #[test]
    fn sma_skips_windows_with_undefined_input() {
        let s = Series::from_points(vec![Some(1.0), None, Some(3.0), Some(5.0)]);
        let out = compute(&s, 2);
        assert_eq!(out.points, vec![None, None, None, Some(4.0)]);
    }
}

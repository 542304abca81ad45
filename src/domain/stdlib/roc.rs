//! Rate of change.

use crate::domain::series::Series;

/// Percentage change versus the bar `period` positions back:
/// `(x[i] - x[i - period]) / x[i - period] * 100`.
///
/// Undefined when either bar is undefined or the reference bar is zero.
pub fn compute(series: &Series, period: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];

    for i in period..len {
        if let (Some(current), Some(past)) = (series.get(i), series.get(i - period)) {
            if past != 0.0 {
                points[i] = Some((current - past) / past * 100.0);
            }
        }
    }

    Series::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn roc_basic() {
        let s = Series::from_values(vec![100.0, 110.0, 121.0]);
        let out = compute(&s, 1);
        assert_eq!(out.points[0], None);
        assert!((out.points[1].unwrap() - 10.0).abs() < EPS);
        assert!((out.points[2].unwrap() - 10.0).abs() < EPS);
    }

    #[test]
    fn roc_zero_reference_is_undefined() {
        let s = Series::from_values(vec![0.0, 5.0]);
        let out = compute(&s, 1);
        assert_eq!(out.points, vec![None, None]);
    }

    #[test]
    fn roc_longer_period() {
        let s = Series::from_values(vec![50.0, 60.0, 75.0]);
        let out = compute(&s, 2);
        assert_eq!(out.points[0], None);
        assert_eq!(out.points[1], None);
        assert!((out.points[2].unwrap() - 50.0).abs() < EPS);
    }
}

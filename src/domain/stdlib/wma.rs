//! Linearly weighted moving average.

use crate::domain::series::Series;

/// WMA over `period` bars: the newest bar gets weight `period`, the oldest
/// weight 1, divisor `period * (period + 1) / 2`.
pub fn compute(series: &Series, period: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];
    let divisor = period as f64 * (period as f64 + 1.0) / 2.0;

    for i in 0..len {
        if i + 1 < period {
            continue;
        }
        let window = &series.points[i + 1 - period..=i];
        if window.iter().all(|p| p.is_some()) {
            let weighted: f64 = window
                .iter()
                .enumerate()
                .map(|(j, p)| p.unwrap() * (j + 1) as f64)
                .sum();
            points[i] = Some(weighted / divisor);
        }
    }

    Series::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn wma_weights_recent_bars_heavier() {
        let s = Series::from_values(vec![10.0, 20.0, 30.0]);
        let out = compute(&s, 3);
        assert_eq!(out.points[0], None);
        assert_eq!(out.points[1], None);
        // (10*1 + 20*2 + 30*3) / 6 = 140 / 6
        assert!((out.points[2].unwrap() - 140.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn wma_period_one_is_identity() {
        let s = Series::from_values(vec![5.0, 6.0]);
        let out = compute(&s, 1);
        assert_eq!(out.points, vec![Some(5.0), Some(6.0)]);
    }

    #[test]
    fn wma_undefined_window_stays_undefined() {
        let s = Series::from_points(vec![Some(1.0), None, Some(3.0)]);
        let out = compute(&s, 2);
        assert_eq!(out.points, vec![None, None, None]);
    }
}

//! Rolling standard deviation.

use crate::domain::series::Series;

/// Population standard deviation over `period` bars (divide by N).
pub fn compute(series: &Series, period: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];

    for i in 0..len {
        if i + 1 < period {
            continue;
        }
        let window = &series.points[i + 1 - period..=i];
        if window.iter().all(|p| p.is_some()) {
            points[i] = Some(window_stddev(window, period));
        }
    }

    Series::from_points(points)
}

pub(super) fn window_stddev(window: &[Option<f64>], period: usize) -> f64 {
    let mean: f64 = window.iter().map(|p| p.unwrap()).sum::<f64>() / period as f64;
    let variance: f64 = window
        .iter()
        .map(|p| {
            let d = p.unwrap() - mean;
            d * d
        })
        .sum::<f64>()
        / period as f64;
    variance.sqrt()
}

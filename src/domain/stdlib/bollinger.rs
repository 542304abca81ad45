//! Bollinger bands.

use crate::domain::series::Series;
use crate::domain::stdlib::stddev::window_stddev;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Upper,
    Middle,
    Lower,
}

/// One band of the Bollinger channel: middle is the SMA over `period` bars,
/// upper and lower sit `mult` population standard deviations away.
pub fn compute(series: &Series, period: usize, mult: f64, band: Band) -> Series {
    let len = series.len();
    let mut points = vec![None; len];

    for i in 0..len {
        if i + 1 < period {
            continue;
        }
        let window = &series.points[i + 1 - period..=i];
        if window.iter().all(|p| p.is_some()) {
            let middle: f64 = window.iter().map(|p| p.unwrap()).sum::<f64>() / period as f64;
            points[i] = Some(match band {
                Band::Middle => middle,
                Band::Upper => middle + mult * window_stddev(window, period),
                Band::Lower => middle - mult * window_stddev(window, period),
            });
        }
    }

    Series::from_points(points)
}

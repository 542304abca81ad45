//! Exponential moving average.

use crate::domain::series::Series;

/// EMA with smoothing factor `k = 2 / (period + 1)`, seeded with the simple
/// average of the first full window.
///
/// The recursion needs contiguous input, so it runs over the defined run
/// following the input's warmup region; anything after an interior undefined
/// position stays undefined.
pub fn compute(series: &Series, period: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];
    let offset = series.warmup_len();

    let run: Vec<f64> = series.points[offset..]
        .iter()
        .map_while(|p| *p)
        .collect();
    if run.len() < period {
        return Series::from_points(points);
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed: f64 = run[..period].iter().sum::<f64>() / period as f64;
    points[offset + period - 1] = Some(seed);

    let mut prev = seed;
    for (j, &value) in run.iter().enumerate().skip(period) {
        let ema = value * k + prev * (1.0 - k);
        points[offset + j] = Some(ema);
        prev = ema;
    }

    Series::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn ema_seeds_with_simple_average() {
        let s = Series::from_values(vec![10.0, 20.0, 30.0, 40.0]);
        let out = compute(&s, 3);
        assert_eq!(out.points[0], None);
        assert_eq!(out.points[1], None);
        assert!((out.points[2].unwrap() - 20.0).abs() < EPS);
        // k = 0.5: 40 * 0.5 + 20 * 0.5 = 30
        assert!((out.points[3].unwrap() - 30.0).abs() < EPS);
    }

    #[test]
    fn ema_respects_input_warmup() {
        let s = Series::from_points(vec![None, Some(10.0), Some(20.0), Some(30.0)]);
        let out = compute(&s, 2);
        assert_eq!(out.points[0], None);
        assert_eq!(out.points[1], None);
        assert!((out.points[2].unwrap() - 15.0).abs() < EPS);
    }

    #[test]
    fn ema_too_little_data() {
        let s = Series::from_values(vec![10.0, 20.0]);
        let out = compute(&s, 5);
        assert!(out.points.iter().all(|p| p.is_none()));
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let s = Series::from_values(vec![7.0; 10]);
        let out = compute(&s, 4);
        for p in &out.points[3..] {
            assert!((p.unwrap() - 7.0).abs() < EPS);
        }
    }
}

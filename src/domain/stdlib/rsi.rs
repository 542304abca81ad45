//! Relative strength index (Wilder smoothing).

use crate::domain::series::Series;

/// RSI over `period` bars.
///
/// The first value uses the simple average of the first `period` gains and
/// losses; later values use Wilder smoothing,
/// `avg = (prev_avg * (period - 1) + current) / period`. When the average
/// loss is zero the RSI is 100. The first defined output lands `period` bars
/// after the input's warmup region.
pub fn compute(series: &Series, period: usize) -> Series {
    let len = series.len();
    let mut points = vec![None; len];
    let offset = series.warmup_len();

    let run: Vec<f64> = series.points[offset..]
        .iter()
        .map_while(|p| *p)
        .collect();
    if run.len() < period + 1 {
        return Series::from_points(points);
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for j in 1..=period {
        let change = run[j] - run[j - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    points[offset + period] = Some(rsi_value(avg_gain, avg_loss));

    for j in period + 1..run.len() {
        let change = run[j] - run[j - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        points[offset + j] = Some(rsi_value(avg_gain, avg_loss));
    }

    Series::from_points(points)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn rsi_all_gains_is_100() {
        let s = Series::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = compute(&s, 3);
        assert_eq!(out.points[2], None);
        assert!((out.points[3].unwrap() - 100.0).abs() < EPS);
        assert!((out.points[4].unwrap() - 100.0).abs() < EPS);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let s = Series::from_values(vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        let out = compute(&s, 3);
        assert!((out.points[3].unwrap() - 0.0).abs() < EPS);
    }

    #[test]
    fn rsi_balanced_moves_near_50() {
        let s = Series::from_values(vec![10.0, 11.0, 10.0, 11.0, 10.0]);
        let out = compute(&s, 4);
        // Two gains of 1 and two losses of 1 over the first window.
        assert!((out.points[4].unwrap() - 50.0).abs() < EPS);
    }

    #[test]
    fn rsi_warmup_length() {
        let s = Series::from_values(vec![1.0, 2.0, 3.0, 4.0]);
        let out = compute(&s, 3);
        assert_eq!(out.warmup_len(), 3);
    }

    #[test]
    fn rsi_too_little_data() {
        let s = Series::from_values(vec![1.0, 2.0]);
        let out = compute(&s, 5);
        assert!(out.points.iter().all(|p| p.is_none()));
    }
}

/// EMA over `values` with smoothing factor `2 / (period + 1)`, seeded by the SMA of the first
/// `period` values.
///
/// Element `k` of the output corresponds to input index `k + period - 1`. Returns an empty vec
/// when `period == 0` or the input is shorter than `period`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);

    let mut prev = seed;
    for &v in &values[period..] {
        prev = v * alpha + prev * (1.0 - alpha);
        out.push(prev);
    }
    out
}

/// Latest EMA value, if there is enough input.
pub fn ema_last(values: &[f64], period: usize) -> Option<f64> {
    ema(values, period).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_for_zero_period_or_short_input() {
        assert!(ema(&[1.0, 2.0, 3.0], 0).is_empty());
        assert!(ema(&[1.0, 2.0], 3).is_empty());
        assert!(ema(&[], 1).is_empty());
    }

    #[test]
    fn seed_is_sma_of_first_period() {
        let out = ema(&[2.0, 4.0, 6.0], 3);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn follows_recursive_definition() {
        let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = ema(&values, 5);
        assert_eq!(out.len(), 6);

        let alpha = 2.0 / 6.0;
        let mut expected = 3.0;
        assert!((out[0] - expected).abs() < 1e-12);
        for (k, &v) in values[5..].iter().enumerate() {
            expected = v * alpha + expected * (1.0 - alpha);
            assert!((out[k + 1] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_series_is_a_fixed_point() {
        let values = vec![123.45; 300];
        for period in [9, 12, 26, 50, 100, 200] {
            let out = ema(&values, period);
            assert_eq!(out.len(), values.len() - period + 1);
            assert!(out.iter().all(|v| (v - 123.45).abs() < 1e-9), "period {period}");
        }
    }
}

use super::ema::ema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdParams {
    /// Index of the first input bar that has a signal value.
    pub fn first_signal_index(&self) -> usize {
        self.slow + self.signal - 2
    }
}

/// MACD points for every bar that has a signal value, oldest first.
///
/// Point `k` corresponds to input index `k + params.first_signal_index()`.
pub fn macd(closes: &[f64], params: MacdParams) -> Vec<MacdPoint> {
    if params.fast == 0 || params.fast >= params.slow {
        return Vec::new();
    }

    let fast = ema(closes, params.fast);
    let slow = ema(closes, params.slow);
    if slow.is_empty() {
        return Vec::new();
    }

    // fast[k] sits at bar k + fast - 1, slow[k] at bar k + slow - 1.
    let shift = params.slow - params.fast;
    let line: Vec<f64> = slow
        .iter()
        .enumerate()
        .map(|(k, s)| fast[k + shift] - s)
        .collect();

    let signal = ema(&line, params.signal);
    let offset = params.signal.saturating_sub(1);

    signal
        .iter()
        .enumerate()
        .map(|(k, &sig)| {
            let l = line[k + offset];
            MacdPoint {
                line: l,
                signal: sig,
                histogram: l - sig,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn first_point_lands_on_bar_33() {
        let p = MacdParams::default();
        assert_eq!(p.first_signal_index(), 33);
        assert!(macd(&wave(33), p).is_empty());
        assert_eq!(macd(&wave(34), p).len(), 1);
        assert_eq!(macd(&wave(250), p).len(), 250 - 33);
    }

    #[test]
    fn histogram_is_line_minus_signal_everywhere() {
        for point in macd(&wave(300), MacdParams::default()) {
            assert_eq!(point.histogram, point.line - point.signal);
        }
    }

    #[test]
    fn line_matches_ema_difference_at_last_bar() {
        let closes = wave(200);
        let points = macd(&closes, MacdParams::default());
        let last = points.last().unwrap();
        let fast = *ema(&closes, 12).last().unwrap();
        let slow = *ema(&closes, 26).last().unwrap();
        assert!((last.line - (fast - slow)).abs() < 1e-12);
    }

    #[test]
    fn flat_series_has_zero_macd() {
        let points = macd(&[42.0; 120], MacdParams::default());
        assert!(points
            .iter()
            .all(|p| p.line.abs() < 1e-9 && p.signal.abs() < 1e-9));
    }

    #[test]
    fn rejects_degenerate_params() {
        let bad = MacdParams {
            fast: 26,
            slow: 12,
            signal: 9,
        };
        assert!(macd(&wave(200), bad).is_empty());
    }
}

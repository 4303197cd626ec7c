pub mod ema;
pub mod macd;
pub mod rsi;

use crate::domain::price::PriceSeries;
use macd::MacdParams;
pub use macd::MacdPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest EMA the snapshot needs; shorter series cannot be scored.
pub const REQUIRED_BARS: usize = 200;

pub const SUPPORT_EMA_PERIODS: [usize; 3] = [50, 100, 200];
pub const RSI_PERIOD: usize = 14;

/// Indicator values at the most recent bar, plus the prior MACD point for crossover checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub ema50: f64,
    pub ema100: f64,
    pub ema200: f64,
    pub rsi14: f64,
    pub macd: MacdPoint,
    pub macd_prev: MacdPoint,
}

impl IndicatorSnapshot {
    /// `(period, value)` pairs, shortest period first.
    pub fn ema_levels(&self) -> [(usize, f64); 3] {
        [(50, self.ema50), (100, self.ema100), (200, self.ema200)]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorError {
    InsufficientData { have: usize, need: usize },
    NonFinite { index: usize, value: f64 },
}

impl fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorError::InsufficientData { have, need } => {
                write!(f, "insufficient history: {have} bars, need {need}")
            }
            IndicatorError::NonFinite { index, value } => {
                write!(f, "invalid close {value} at bar {index}")
            }
        }
    }
}

impl std::error::Error for IndicatorError {}

pub fn compute_snapshot(
    series: &PriceSeries,
    min_bars: usize,
) -> Result<IndicatorSnapshot, IndicatorError> {
    let need = min_bars.max(REQUIRED_BARS);
    if series.len() < need {
        return Err(IndicatorError::InsufficientData {
            have: series.len(),
            need,
        });
    }

    let closes = series.closes();
    if let Some((index, &value)) = closes
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_finite() || **c <= 0.0)
    {
        return Err(IndicatorError::NonFinite { index, value });
    }

    let insufficient = || IndicatorError::InsufficientData {
        have: closes.len(),
        need,
    };

    let ema50 = ema::ema_last(&closes, 50).ok_or_else(insufficient)?;
    let ema100 = ema::ema_last(&closes, 100).ok_or_else(insufficient)?;
    let ema200 = ema::ema_last(&closes, 200).ok_or_else(insufficient)?;
    let rsi14 = rsi::rsi(&closes, RSI_PERIOD).ok_or_else(insufficient)?;

    let points = macd::macd(&closes, MacdParams::default());
    let [.., prev, latest] = points.as_slice() else {
        return Err(insufficient());
    };

    Ok(IndicatorSnapshot {
        close: closes[closes.len() - 1],
        ema50,
        ema100,
        ema200,
        rsi14,
        macd: *latest,
        macd_prev: *prev,
    })
}

#[cfg(test)]
pub(crate) fn pullback_bounce_closes() -> Vec<f64> {
    // Steady climb from 100 toward 150 over 205 weeks, a 30-week drift lower, then a 6-week
    // bounce. The last bar sits ~0.2% above EMA50 and ~2.8% above EMA100 with RSI near 47;
    // MACD crosses its signal on bar 239 and keeps rising on bar 240.
    let mut closes: Vec<f64> = (0..205).map(|i| 100.0 + 50.0 * i as f64 / 205.0).collect();
    while closes.len() < 235 {
        let last = closes[closes.len() - 1];
        closes.push(last - 0.14);
    }
    while closes.len() < 241 {
        let last = closes[closes.len() - 1];
        closes.push(last + 0.15);
    }
    closes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::weekly_series_from_closes;

    #[test]
    fn rejects_short_history() {
        let series = weekly_series_from_closes("SBIN.NS", &[100.0; 50]);
        let err = compute_snapshot(&series, 200).unwrap_err();
        assert_eq!(err, IndicatorError::InsufficientData { have: 50, need: 200 });
    }

    #[test]
    fn never_accepts_fewer_than_required_bars() {
        let series = weekly_series_from_closes("SBIN.NS", &[100.0; 150]);
        let err = compute_snapshot(&series, 100).unwrap_err();
        assert_eq!(err, IndicatorError::InsufficientData { have: 150, need: 200 });
    }

    #[test]
    fn honours_larger_configured_minimum() {
        let series = weekly_series_from_closes("SBIN.NS", &[100.0; 220]);
        assert!(compute_snapshot(&series, 260).is_err());
        assert!(compute_snapshot(&series, 200).is_ok());
    }

    #[test]
    fn rejects_non_finite_close() {
        let mut closes = vec![100.0; 220];
        closes[150] = f64::NAN;
        let series = weekly_series_from_closes("ITC.NS", &closes);
        match compute_snapshot(&series, 200) {
            Err(IndicatorError::NonFinite { index, .. }) => assert_eq!(index, 150),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn flat_series_snapshot() {
        let series = weekly_series_from_closes("LT.NS", &[500.0; 260]);
        let snap = compute_snapshot(&series, 200).unwrap();
        assert!((snap.ema50 - 500.0).abs() < 1e-9);
        assert!((snap.ema100 - 500.0).abs() < 1e-9);
        assert!((snap.ema200 - 500.0).abs() < 1e-9);
        assert_eq!(snap.rsi14, 50.0);
        assert!(snap.macd.histogram.abs() < 1e-9);
    }

    #[test]
    fn pullback_scenario_values() {
        let series = weekly_series_from_closes("HDFCBANK.NS", &pullback_bounce_closes());
        assert_eq!(series.len(), 241);
        let snap = compute_snapshot(&series, 200).unwrap();

        assert!((snap.close - 146.456).abs() < 1e-3);
        assert!((snap.ema50 - 146.1419).abs() < 1e-3);
        assert!((snap.ema100 - 142.5132).abs() < 1e-3);
        assert!((snap.ema200 - 132.0557).abs() < 1e-3);
        assert!((snap.rsi14 - 46.929).abs() < 1e-2);

        // Crossed on the prior bar, still above and rising now.
        assert!(snap.macd_prev.line > snap.macd_prev.signal);
        assert!(snap.macd.line > snap.macd.signal);
        assert!(snap.macd.line > snap.macd_prev.line);
        assert_eq!(snap.macd.histogram, snap.macd.line - snap.macd.signal);
    }

    #[test]
    fn crossover_happens_on_bar_239() {
        let closes = pullback_bounce_closes();
        let points = macd::macd(&closes, MacdParams::default());
        let at = |bar: usize| points[bar - MacdParams::default().first_signal_index()];
        assert!(at(238).line <= at(238).signal);
        assert!(at(239).line > at(239).signal);
    }
}

use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One weekly candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Weekly history for a single ticker, oldest bar first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn try_new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> anyhow::Result<Self> {
        let ticker = ticker.into();
        ensure!(!ticker.trim().is_empty(), "ticker must be non-empty");

        for pair in bars.windows(2) {
            ensure!(
                pair[0].date < pair[1].date,
                "bars for {ticker} must be strictly ascending by date ({} then {})",
                pair[0].date,
                pair[1].date
            );
        }

        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

#[cfg(test)]
pub(crate) fn weekly_series_from_closes(ticker: &str, closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::weeks(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        })
        .collect();
    PriceSeries::try_new(ticker, bars).unwrap()
}

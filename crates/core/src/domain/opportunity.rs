use crate::indicators::IndicatorSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    StrongBuy,
    Buy,
}

impl Rating {
    pub fn label(self) -> &'static str {
        match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The EMA level the close is resting on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportTouch {
    pub ema_period: usize,
    pub ema_value: f64,
    /// Percent above the EMA, `(close - ema) / ema * 100`.
    pub distance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub ticker: String,
    pub close: f64,
    pub snapshot: IndicatorSnapshot,
    pub support: SupportTouch,
    pub rating: Rating,
    pub confidence: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub tickers_scanned: usize,
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<SkippedTicker>,
}

impl Report {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at,
            tickers_scanned: 0,
            opportunities: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}

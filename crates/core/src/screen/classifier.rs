use crate::domain::opportunity::{Opportunity, Rating, SupportTouch};
use crate::indicators::IndicatorSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Max percent the close may sit above an EMA and still count as a support touch.
    pub support_threshold_pct: f64,
    /// Inclusive lower RSI bound.
    pub rsi_lower: f64,
    /// Exclusive upper RSI bound.
    pub rsi_upper: f64,
    pub accept_macd_continuation: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            support_threshold_pct: 3.0,
            rsi_lower: 30.0,
            rsi_upper: 50.0,
            accept_macd_continuation: true,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.support_threshold_pct.is_finite() && self.support_threshold_pct > 0.0,
            "support threshold must be a positive percentage (got {})",
            self.support_threshold_pct
        );
        anyhow::ensure!(
            self.rsi_lower.is_finite() && self.rsi_upper.is_finite(),
            "RSI bounds must be finite"
        );
        anyhow::ensure!(
            (0.0..=100.0).contains(&self.rsi_lower) && (0.0..=100.0).contains(&self.rsi_upper),
            "RSI bounds must be within 0..=100 (got {}..{})",
            self.rsi_lower,
            self.rsi_upper
        );
        anyhow::ensure!(
            self.rsi_lower < self.rsi_upper,
            "RSI lower bound must be below upper bound (got {}..{})",
            self.rsi_lower,
            self.rsi_upper
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdState {
    /// Line crossed above signal between the prior and the latest bar.
    FreshCrossover,
    /// Line was already above signal and both kept rising.
    Continuation,
    Neutral,
}

impl MacdState {
    pub fn of(snapshot: &IndicatorSnapshot) -> Self {
        let (prev, cur) = (snapshot.macd_prev, snapshot.macd);
        if cur.line <= cur.signal {
            return MacdState::Neutral;
        }
        if prev.line <= prev.signal {
            return MacdState::FreshCrossover;
        }
        if cur.line > prev.line && cur.signal > prev.signal {
            return MacdState::Continuation;
        }
        MacdState::Neutral
    }

    pub fn describe(self) -> &'static str {
        match self {
            MacdState::FreshCrossover => "bullish crossover",
            MacdState::Continuation => "bullish, rising above signal",
            MacdState::Neutral => "no bullish signal",
        }
    }
}

/// Longest-period EMA whose band contains the close.
pub fn support_touch(snapshot: &IndicatorSnapshot, threshold_pct: f64) -> Option<SupportTouch> {
    snapshot
        .ema_levels()
        .into_iter()
        .filter(|(_, ema)| *ema > 0.0)
        .map(|(period, ema)| SupportTouch {
            ema_period: period,
            ema_value: ema,
            distance_pct: (snapshot.close - ema) / ema * 100.0,
        })
        .filter(|t| (0.0..=threshold_pct).contains(&t.distance_pct))
        .max_by_key(|t| t.ema_period)
}

pub fn classify(
    ticker: &str,
    snapshot: &IndicatorSnapshot,
    cfg: &ClassifierConfig,
) -> Option<Opportunity> {
    let support = support_touch(snapshot, cfg.support_threshold_pct)?;

    let rsi_ok = snapshot.rsi14 >= cfg.rsi_lower && snapshot.rsi14 < cfg.rsi_upper;
    let macd_state = MacdState::of(snapshot);
    let macd_ok = match macd_state {
        MacdState::FreshCrossover => true,
        MacdState::Continuation => cfg.accept_macd_continuation,
        MacdState::Neutral => false,
    };

    let rating = match (rsi_ok, macd_ok) {
        (true, true) => Rating::StrongBuy,
        (true, false) | (false, true) => Rating::Buy,
        (false, false) => return None,
    };

    let confirmations = rsi_ok as u8 + macd_ok as u8;
    let confidence = (anchor_weight(support.ema_period) + 0.2 * confirmations as f64).min(1.0);

    Some(Opportunity {
        ticker: ticker.to_string(),
        close: snapshot.close,
        snapshot: *snapshot,
        support,
        rating,
        confidence,
        rationale: rationale(ticker, snapshot, &support, rsi_ok, macd_ok, macd_state, cfg),
    })
}

fn anchor_weight(ema_period: usize) -> f64 {
    match ema_period {
        200.. => 0.6,
        100.. => 0.5,
        _ => 0.4,
    }
}

fn rationale(
    ticker: &str,
    snapshot: &IndicatorSnapshot,
    support: &SupportTouch,
    rsi_ok: bool,
    macd_ok: bool,
    macd_state: MacdState,
    cfg: &ClassifierConfig,
) -> String {
    let rsi_part = if rsi_ok {
        format!(
            "The weekly RSI of {:.2} sits in the {:.0}-{:.0} band, leaving room before overbought",
            snapshot.rsi14, cfg.rsi_lower, cfg.rsi_upper
        )
    } else {
        format!(
            "The weekly RSI of {:.2} is outside the {:.0}-{:.0} band",
            snapshot.rsi14, cfg.rsi_lower, cfg.rsi_upper
        )
    };

    let macd_part = if macd_ok {
        format!("the MACD shows a {}", macd_state.describe())
    } else {
        "the MACD has not turned bullish yet".to_string()
    };

    format!(
        "{ticker} is trading near its {}-week EMA support at {:.2} ({:.2}% above). {rsi_part}, and {macd_part}. \
         This suggests a potential swing entry targeting a rebound toward recent resistance.",
        support.ema_period, support.ema_value, support.distance_pct
    )
}

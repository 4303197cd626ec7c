pub mod classifier;

use crate::domain::opportunity::{Opportunity, Report, SkippedTicker};
use crate::indicators::{compute_snapshot, IndicatorError, REQUIRED_BARS};
use crate::ingest::provider::MarketDataProvider;
use chrono::Utc;
use classifier::{classify, ClassifierConfig};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub min_history_bars: usize,
    pub classifier: ClassifierConfig,
    /// Pause between provider requests.
    pub request_delay: Duration,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            min_history_bars: REQUIRED_BARS,
            classifier: ClassifierConfig::default(),
            request_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    DataUnavailable(String),
    InsufficientHistory { have: usize, need: usize },
    Computation(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DataUnavailable(detail) => write!(f, "data unavailable: {detail}"),
            SkipReason::InsufficientHistory { have, need } => {
                write!(f, "insufficient history: {have} weekly bars, need {need}")
            }
            SkipReason::Computation(detail) => write!(f, "computation error: {detail}"),
        }
    }
}

impl std::error::Error for SkipReason {}

impl From<IndicatorError> for SkipReason {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InsufficientData { have, need } => {
                SkipReason::InsufficientHistory { have, need }
            }
            other @ IndicatorError::NonFinite { .. } => SkipReason::Computation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Opportunity(Opportunity),
    NoSetup,
    Skipped(SkipReason),
}

pub async fn screen_ticker(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    cfg: &ScreenConfig,
) -> TickerOutcome {
    let series = match provider.fetch_weekly(ticker).await {
        Ok(series) => series,
        Err(err) => return skipped(ticker, SkipReason::DataUnavailable(format!("{err:#}"))),
    };

    if series.is_empty() {
        return skipped(ticker, SkipReason::DataUnavailable("no bars returned".to_string()));
    }

    let snapshot = match compute_snapshot(&series, cfg.min_history_bars) {
        Ok(s) => s,
        Err(err) => return skipped(ticker, err.into()),
    };

    tracing::debug!(
        ticker = %ticker,
        close = snapshot.close,
        ema50 = snapshot.ema50,
        ema100 = snapshot.ema100,
        ema200 = snapshot.ema200,
        rsi14 = snapshot.rsi14,
        macd = snapshot.macd.line,
        macd_signal = snapshot.macd.signal,
        "indicators computed"
    );

    match classify(ticker, &snapshot, &cfg.classifier) {
        Some(opp) => {
            tracing::info!(
                ticker = %ticker,
                rating = %opp.rating,
                close = opp.close,
                support_ema = opp.support.ema_period,
                distance_pct = opp.support.distance_pct,
                "found opportunity"
            );
            TickerOutcome::Opportunity(opp)
        }
        None => TickerOutcome::NoSetup,
    }
}

fn skipped(ticker: &str, reason: SkipReason) -> TickerOutcome {
    tracing::warn!(ticker = %ticker, reason = %reason, "skipping ticker");
    TickerOutcome::Skipped(reason)
}

/// Screens `tickers` one after another and collects the outcomes in universe order.
pub async fn run_screen(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    cfg: &ScreenConfig,
) -> Report {
    let mut report = Report::new(Utc::now());
    let total = tickers.len();

    tracing::info!(
        run_id = %report.run_id,
        provider = provider.provider_name(),
        total,
        "starting NIFTY 50 swing trade analysis"
    );

    for (idx, ticker) in tickers.iter().enumerate() {
        if idx != 0 && !cfg.request_delay.is_zero() {
            tokio::time::sleep(cfg.request_delay).await;
        }

        tracing::info!(ticker = %ticker, n = idx + 1, total, "analyzing");
        report.tickers_scanned += 1;

        match screen_ticker(provider, ticker, cfg).await {
            TickerOutcome::Opportunity(opp) => report.opportunities.push(opp),
            TickerOutcome::NoSetup => {}
            TickerOutcome::Skipped(reason) => report.skipped.push(SkippedTicker {
                ticker: ticker.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    tracing::info!(
        run_id = %report.run_id,
        scanned = report.tickers_scanned,
        opportunities = report.opportunities.len(),
        skipped = report.skipped.len(),
        "analysis complete"
    );

    report
}

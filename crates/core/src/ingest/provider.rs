use crate::domain::price::PriceSeries;
use anyhow::Result;

/// Source of weekly OHLC history.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Full weekly history for `ticker`, oldest bar first.
    async fn fetch_weekly(&self, ticker: &str) -> Result<PriceSeries>;
}

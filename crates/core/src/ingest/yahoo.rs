use crate::config::Settings;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::ingest::provider::MarketDataProvider;
use crate::ingest::types::{Chart, ChartResponse, ChartResult};
use crate::time::ist;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{StatusCode, Url};
use std::collections::BTreeMap;
use std::time::Duration;

const CHART_PATH: [&str; 3] = ["v8", "finance", "chart"];

// The chart endpoint rejects requests without a browser-like agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
    backoff_base: Duration,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.data_provider_timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build Yahoo chart http client")?;

        Ok(Self {
            http,
            base_url: settings.data_provider_base_url.clone(),
            retries: settings.data_provider_retries.max(1),
            backoff_base: Duration::from_secs(1),
        })
    }

    fn chart_url(&self, ticker: &str) -> Result<Url> {
        chart_url(&self.base_url, ticker)
    }

    async fn fetch_chart(&self, ticker: &str) -> Result<ChartResponse> {
        let url = self.chart_url(ticker)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(&url).await {
                Ok(body) => return Ok(body),
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retryable(err)) => {
                    if attempt >= self.retries {
                        return Err(err.context(format!("Yahoo chart gave up after {attempt} attempts")));
                    }
                    let backoff = backoff_for(self.backoff_base, attempt);
                    tracing::warn!(
                        attempt,
                        ?backoff,
                        ticker = %ticker,
                        error = %format!("{err:#}"),
                        "Yahoo chart fetch failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> std::result::Result<ChartResponse, Attempt> {
        let params = [("range", "max"), ("interval", "1wk"), ("events", "div,splits")];

        let res = self
            .http
            .get(url.clone())
            .query(&params)
            .send()
            .await
            .context("Yahoo chart request failed")
            .map_err(Attempt::Retryable)?;

        let status = res.status();
        // A timeout or reset mid-body surfaces here, after the headers arrived.
        let text = res
            .text()
            .await
            .context("failed to read Yahoo chart response")
            .map_err(Attempt::Retryable)?;

        if !status.is_success() {
            // 404s still carry a chart.error body worth surfacing.
            let detail = match serde_json::from_str::<ChartResponse>(&text) {
                Ok(ChartResponse {
                    chart: Chart { error: Some(err), .. },
                }) => format!("{} ({})", err.description, err.code),
                _ => truncate(&text, 200).to_string(),
            };
            let err = anyhow::anyhow!("Yahoo chart HTTP {status}: {detail}");
            return Err(if is_retryable(status) {
                Attempt::Retryable(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        // A truncated 2xx body does not parse; treat it like a dropped connection.
        serde_json::from_str::<ChartResponse>(&text)
            .context("failed to parse Yahoo chart response")
            .map_err(Attempt::Retryable)
    }
}

enum Attempt {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_weekly(&self, ticker: &str) -> Result<PriceSeries> {
        let body = self.fetch_chart(ticker).await?;
        series_from_chart(ticker, body)
    }
}

pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `base`, `2 * base`, `4 * base`, ... capped at `32 * base`.
fn backoff_for(base: Duration, attempt: u32) -> Duration {
    base * (1u32 << attempt.saturating_sub(1).min(5))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn chart_url(base_url: &str, ticker: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .with_context(|| format!("invalid data provider base url: {base_url}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("data provider base url cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .extend(CHART_PATH)
        .push(ticker);
    Ok(url)
}

pub fn series_from_chart(ticker: &str, body: ChartResponse) -> Result<PriceSeries> {
    if let Some(err) = body.chart.error {
        anyhow::bail!("Yahoo chart error for {ticker}: {} ({})", err.description, err.code);
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .with_context(|| format!("Yahoo chart returned no result for {ticker}"))?;

    let bars = bars_from_result(&result)?;
    anyhow::ensure!(!bars.is_empty(), "Yahoo chart returned no usable bars for {ticker}");

    PriceSeries::try_new(ticker, bars)
}

/// Auto-adjusted weekly bars. Rows with a missing OHLC value are dropped; when two rows land on
/// the same date (the in-progress week is sometimes repeated) the later one wins.
fn bars_from_result(result: &ChartResult) -> Result<Vec<PriceBar>> {
    let quote = result
        .indicators
        .quote
        .first()
        .context("chart result has no quote block")?;
    let adjclose = result.indicators.adjclose.first().map(|a| &a.adjclose);

    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let mut by_date = BTreeMap::new();
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };

        let factor = adjclose
            .and_then(|a| at(a, i))
            .filter(|adj| adj.is_finite() && close > 0.0)
            .map(|adj| adj / close)
            .unwrap_or(1.0);

        let date = ist::date_of_timestamp(ts)
            .with_context(|| format!("invalid bar timestamp {ts}"))?;

        by_date.insert(
            date,
            PriceBar {
                date,
                open: open * factor,
                high: high * factor,
                low: low * factor,
                close: close * factor,
                volume: at(&quote.volume, i).unwrap_or(0.0),
            },
        );
    }

    Ok(by_date.into_values().collect())
}

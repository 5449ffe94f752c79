use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, CandleSeries, Error, Interval, MarketData, Result};
use strategy::MAX_CANDLE_LIMIT;

const BASE_URL: &str = "https://api.binance.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// REST client for Binance spot market data. Only public endpoints are used;
/// the API key, when present, is sent for higher rate limits.
pub struct BinanceClient {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Point the client at another host (testnet, mock server).
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn public_get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.http.get(&url).query(query);
        if let Some(key) = &self.api_key {
            req = req.header("X-MBX-APIKEY", key);
        }

        let resp = req.send().await.map_err(|e| Error::Http(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::ExchangeStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn tradable_symbols(&self) -> Result<Vec<String>> {
        let body = self.public_get("/api/v3/exchangeInfo", &[]).await?;
        let info: ExchangeInfo =
            serde_json::from_str(&body).map_err(|e| Error::Exchange(e.to_string()))?;

        let symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING")
            .map(|s| s.symbol)
            .collect();
        debug!(count = symbols.len(), "Fetched tradable symbols");
        Ok(symbols)
    }

    async fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries> {
        // One extra row: the latest kline is still forming and gets dropped.
        let body = self
            .public_get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", (limit + 1).min(MAX_CANDLE_LIMIT).to_string()),
                ],
            )
            .await?;
        let rows: Vec<KlineRow> =
            serde_json::from_str(&body).map_err(|e| Error::Exchange(e.to_string()))?;

        let mut candles = closed_rows(rows, Utc::now().timestamp_millis())
            .into_iter()
            .map(parse_kline)
            .collect::<Result<Vec<_>>>()?;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        debug!(symbol, %interval, bars = candles.len(), "Fetched closed candles");
        Ok(CandleSeries::new(symbol, interval, candles))
    }

    async fn current_price(&self, symbol: &str) -> Result<f64> {
        let body = self
            .public_get("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        let ticker: PriceTicker =
            serde_json::from_str(&body).map_err(|e| Error::Exchange(e.to_string()))?;

        ticker
            .price
            .parse::<f64>()
            .map_err(|e| Error::Exchange(e.to_string()))
    }
}

/// Drop the trailing kline if its close time has not passed yet. Binance
/// always returns the in-progress bar last.
fn closed_rows(mut rows: Vec<KlineRow>, now_ms: i64) -> Vec<KlineRow> {
    if rows.last().is_some_and(|row| row.6 >= now_ms) {
        rows.pop();
    }
    rows
}

fn parse_kline(row: KlineRow) -> Result<Candle> {
    let (open_time, open, high, low, close, volume, ..) = row;
    let num = |field: &str, raw: &str| {
        raw.parse::<f64>()
            .map_err(|e| Error::Exchange(format!("bad kline {field} '{raw}': {e}")))
    };
    let open_time = Utc
        .timestamp_millis_opt(open_time)
        .single()
        .ok_or_else(|| Error::Exchange(format!("bad kline open time {open_time}")))?;

    Ok(Candle {
        open_time,
        open: num("open", &open)?,
        high: num("high", &high)?,
        low: num("low", &low)?,
        close: num("close", &close)?,
        volume: num("volume", &volume)?,
    })
}

// ─── Response types ───────────────────────────────────────────────────────────

/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
/// trades, taker_base, taker_quote, ignore]`
type KlineRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    u64,
    String,
    String,
    String,
);

#[derive(Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize)]
struct SymbolInfo {
    symbol: String,
    status: String,
}

#[derive(Deserialize)]
struct PriceTicker {
    price: String,
}

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::market::MarketData;
use crate::models::{BarSeries, Instrument, PriceBar};

const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);
const BAR_INTERVAL: &str = "1h";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker {
    symbol: String,
    last_price: String,
    price_change_percent: String,
}

pub struct BinanceClient {
    client: Client,
    base_url: String,
    watchlist: Vec<String>,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, BarSeries)>,
    cache_ttl: Duration,
}

impl BinanceClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: cfg.market_data_base_url.trim_end_matches('/').to_string(),
            watchlist: cfg.watchlist.clone(),
            last_request: None,
            cache: HashMap::new(),
            cache_ttl: Duration::from_secs(5),
        })
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Display ticker and name for a market symbol like "BTCUSDT".
    fn display_parts(id: &str) -> (String, String) {
        let ticker = id
            .strip_suffix("USDT")
            .or_else(|| id.strip_suffix("USD"))
            .unwrap_or(id);
        let name = match ticker {
            "BTC" => "Bitcoin",
            "ETH" => "Ethereum",
            "SOL" => "Solana",
            "BNB" => "BNB",
            "ADA" => "Cardano",
            other => other,
        };
        (ticker.to_string(), name.to_string())
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn list_instruments(&mut self) -> Result<Vec<Instrument>> {
        self.rate_limit().await;

        // /api/v3/ticker/24hr takes a JSON array of symbols
        let symbols = serde_json::to_string(&self.watchlist)
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let resp = self
            .client
            .get(format!("{}/api/v3/ticker/24hr", self.base_url))
            .query(&[("symbols", symbols.as_str())])
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!("{}: {}", status, body)));
        }

        let tickers: Vec<RawTicker> = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        // Preserve watchlist order rather than response order
        let by_symbol: HashMap<String, RawTicker> =
            tickers.into_iter().map(|t| (t.symbol.clone(), t)).collect();

        let instruments = self
            .watchlist
            .iter()
            .filter_map(|id| {
                let t = by_symbol.get(id)?;
                let (symbol, name) = Self::display_parts(id);
                Some(Instrument {
                    id: id.clone(),
                    symbol,
                    name,
                    last_price: t.last_price.parse().ok()?,
                    change_24h: t.price_change_percent.parse().ok()?,
                })
            })
            .collect();

        Ok(instruments)
    }

    async fn get_recent_bars(&mut self, instrument_id: &str, window: usize) -> Result<BarSeries> {
        let window = window.max(1);

        let cache_key = format!("{}_{}", instrument_id, window);
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < self.cache_ttl {
                return Ok(series.clone());
            }
        }

        self.rate_limit().await;

        let resp = self
            .client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[
                ("symbol", instrument_id.to_string()),
                ("interval", BAR_INTERVAL.to_string()),
                ("limit", window.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // Binance answers 400 for a symbol it does not know
            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(Error::UnknownInstrument(instrument_id.to_string()));
            }
            return Err(Error::UpstreamUnavailable(format!("{}: {}", status, body)));
        }

        // Rows are heterogeneous arrays:
        // [openTime, open, high, low, close, volume, closeTime, ...]
        let rows: Vec<Vec<Value>> = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let mut bars: Vec<PriceBar> = rows
            .iter()
            .filter_map(|row| {
                let ms = row.first()?.as_i64()?;
                let time = DateTime::from_timestamp_millis(ms)?;
                let field = |i: usize| row.get(i)?.as_str()?.parse::<f64>().ok();
                Some(PriceBar {
                    time,
                    open: field(1)?,
                    high: field(2)?,
                    low: field(3)?,
                    close: field(4)?,
                    volume: field(5),
                })
            })
            .collect();

        bars.sort_by_key(|b| b.time);
        let series = BarSeries::new(bars);

        self.cache
            .insert(cache_key, (Instant::now(), series.clone()));

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_config;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kline_row(ms: i64, close: f64) -> Value {
        serde_json::json!([
            ms,
            format!("{:.2}", close - 10.0),
            format!("{:.2}", close + 20.0),
            format!("{:.2}", close - 20.0),
            format!("{:.2}", close),
            "123.45",
            ms + 3_599_999,
            "0",
            100,
            "0",
            "0",
            "0"
        ])
    }

    #[tokio::test]
    async fn bars_come_back_oldest_first() {
        let server = MockServer::start().await;
        // newest first in the response; the client must re-sort
        let body = serde_json::json!([
            kline_row(1_700_003_600_000, 65100.0),
            kline_row(1_700_000_000_000, 65000.0),
        ]);
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("interval", "1h"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let mut client = BinanceClient::new(&test_config(&server.uri())).unwrap();
        let bars = client.get_recent_bars("BTCUSDT", 100).await.unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].time < bars[1].time);
        assert!((bars[1].close - 65100.0).abs() < 1e-9);
        assert!(bars[1].volume.is_some());
    }

    #[tokio::test]
    async fn bad_request_maps_to_unknown_instrument() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
            )
            .mount(&server)
            .await;

        let mut client = BinanceClient::new(&test_config(&server.uri())).unwrap();
        let err = client.get_recent_bars("NOPEUSDT", 100).await.unwrap_err();
        assert!(matches!(err, Error::UnknownInstrument(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let mut client = BinanceClient::new(&test_config(&server.uri())).unwrap();
        let err = client.get_recent_bars("BTCUSDT", 100).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn watchlist_snapshot_keeps_configured_order() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            { "symbol": "ETHUSDT", "lastPrice": "3450.20", "priceChangePercent": "-1.2" },
            { "symbol": "BTCUSDT", "lastPrice": "65420.50", "priceChangePercent": "2.5" }
        ]);
        Mock::given(method("GET"))
            .and(path("/api/v3/ticker/24hr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let mut cfg = test_config(&server.uri());
        cfg.watchlist = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()];
        let mut client = BinanceClient::new(&cfg).unwrap();

        let list = client.list_instruments().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "BTCUSDT");
        assert_eq!(list[0].symbol, "BTC");
        assert_eq!(list[0].name, "Bitcoin");
        assert!((list[0].last_price - 65420.50).abs() < 1e-9);
        assert!((list[0].change_24h - 2.5).abs() < 1e-9);
        assert_eq!(list[1].id, "ETHUSDT");
    }
}

//! HTTP price provider.
//!
//! Performs a GET on the product URL and expects a JSON price document:
//!
//! ```json
//! { "price": "45.00", "title": "Noise Cancelling Headphones" }
//! ```
//!
//! `price` may be a JSON string or number. `title` is optional.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use url::Url;

use crate::errors::MarketDataError;
use crate::models::FetchedPrice;
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "HTTP";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpPriceProvider {
    client: Client,
}

impl HttpPriceProvider {
    pub fn new() -> Self {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Build a provider whose client gives up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pricepulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    fn validate_url(raw: &str) -> Result<Url, MarketDataError> {
        let parsed = Url::parse(raw).map_err(|_| MarketDataError::InvalidUrl(raw.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            _ => Err(MarketDataError::InvalidUrl(raw.to_string())),
        }
    }

    fn classify_status(status: StatusCode, url: &str) -> Result<(), MarketDataError> {
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(MarketDataError::NotFound(url.to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            }),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Err(MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            s if s.is_server_error() => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: s.to_string(),
            }),
            s => Err(MarketDataError::InvalidResponse {
                message: format!("unexpected status {}", s),
            }),
        }
    }
}

impl Default for HttpPriceProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a price document body into a [`FetchedPrice`].
pub fn parse_price_document(body: &str) -> Result<FetchedPrice, MarketDataError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| MarketDataError::InvalidResponse {
        message: format!("not a JSON document: {}", e),
    })?;

    let price = match doc.get("price") {
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
    .ok_or_else(|| MarketDataError::InvalidResponse {
        message: "missing or non-numeric price".to_string(),
    })?;

    if price.is_sign_negative() {
        return Err(MarketDataError::InvalidResponse {
            message: format!("negative price {}", price),
        });
    }

    let title = doc
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(FetchedPrice { price, title })
}

#[async_trait]
impl PriceProvider for HttpPriceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_current_price(&self, url: &str) -> Result<FetchedPrice, MarketDataError> {
        let target = Self::validate_url(url)?;

        let response = self
            .client
            .get(target)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        Self::classify_status(response.status(), url)?;

        let body = response.text().await?;
        let fetched = parse_price_document(&body)?;
        log::debug!("{} fetched {} for {}", PROVIDER_ID, fetched.price, url);
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_string_price() {
        let fetched = parse_price_document(r#"{"price":"45.00","title":"Lamp"}"#).unwrap();
        assert_eq!(fetched.price, dec!(45.00));
        assert_eq!(fetched.title.as_deref(), Some("Lamp"));
    }

    #[test]
    fn test_parse_number_price() {
        let fetched = parse_price_document(r#"{"price":19.5}"#).unwrap();
        assert_eq!(fetched.price, dec!(19.5));
        assert!(fetched.title.is_none());
    }

    #[test]
    fn test_blank_title_is_ignored() {
        let fetched = parse_price_document(r#"{"price":"1","title":"   "}"#).unwrap();
        assert!(fetched.title.is_none());
    }

    #[test]
    fn test_missing_price_is_invalid() {
        let err = parse_price_document(r#"{"title":"Lamp"}"#).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidResponse { .. }));
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let err = parse_price_document(r#"{"price":"-3"}"#).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidResponse { .. }));
    }

    #[test]
    fn test_non_json_body_is_invalid() {
        let err = parse_price_document("<html></html>").unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidResponse { .. }));
    }

    #[test]
    fn test_validate_url() {
        assert!(HttpPriceProvider::validate_url("https://shop.example/p/1").is_ok());
        assert!(matches!(
            HttpPriceProvider::validate_url("ftp://shop.example/p/1"),
            Err(MarketDataError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpPriceProvider::validate_url("not a url"),
            Err(MarketDataError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_classify_status() {
        let url = "https://shop.example/p/1";
        assert!(HttpPriceProvider::classify_status(StatusCode::OK, url).is_ok());
        assert!(matches!(
            HttpPriceProvider::classify_status(StatusCode::NOT_FOUND, url),
            Err(MarketDataError::NotFound(_))
        ));
        assert!(matches!(
            HttpPriceProvider::classify_status(StatusCode::TOO_MANY_REQUESTS, url),
            Err(MarketDataError::RateLimited { .. })
        ));
        assert!(matches!(
            HttpPriceProvider::classify_status(StatusCode::BAD_GATEWAY, url),
            Err(MarketDataError::ProviderError { .. })
        ));
        assert!(matches!(
            HttpPriceProvider::classify_status(StatusCode::FORBIDDEN, url),
            Err(MarketDataError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_scheme_without_network() {
        let provider = HttpPriceProvider::new();
        let err = provider
            .fetch_current_price("file:///etc/passwd")
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_provider_id() {
        assert_eq!(HttpPriceProvider::new().id(), "HTTP");
    }
}

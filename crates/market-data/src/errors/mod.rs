//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all oracle operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching a product price.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The product URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid product URL: {0}")]
    InvalidUrl(String),

    /// The upstream answered 404 / 410 for the product URL.
    #[error("Product not found upstream: {0}")]
    NotFound(String),

    /// The upstream rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request did not complete within the per-call budget.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The upstream failed with a server-side error.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The response could not be turned into a price.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of what was wrong with the document
        message: String,
    },

    /// A network error occurred while communicating with the upstream.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricepulse_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Timeout { provider: "HTTP".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::InvalidUrl("ftp://nope".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::InvalidUrl(_) | Self::NotFound(_) | Self::InvalidResponse { .. } => {
                RetryClass::Never
            }

            Self::RateLimited { .. } | Self::Timeout { .. } | Self::ProviderError { .. } => {
                RetryClass::WithBackoff
            }

            // Connection resets and DNS hiccups are worth another delivery;
            // body decode failures are not.
            Self::Network(e) => {
                if e.is_decode() || e.is_builder() {
                    RetryClass::Never
                } else {
                    RetryClass::WithBackoff
                }
            }
        }
    }

    /// Returns true when a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        self.retry_class() == RetryClass::WithBackoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_never_retries() {
        let error = MarketDataError::InvalidUrl("not a url".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
        assert!(!error.is_transient());
    }

    #[test]
    fn test_not_found_never_retries() {
        let error = MarketDataError::NotFound("http://x/1".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_invalid_response_never_retries() {
        let error = MarketDataError::InvalidResponse {
            message: "missing price".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = MarketDataError::RateLimited {
            provider: "HTTP".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
        assert!(error.is_transient());
    }

    #[test]
    fn test_timeout_retries_with_backoff() {
        let error = MarketDataError::Timeout {
            provider: "HTTP".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_provider_error_retries_with_backoff() {
        let error = MarketDataError::ProviderError {
            provider: "HTTP".to_string(),
            message: "502 Bad Gateway".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_error_display_messages() {
        let error = MarketDataError::Timeout {
            provider: "HTTP".to_string(),
        };
        assert_eq!(error.to_string(), "Timeout: HTTP");

        let error = MarketDataError::ProviderError {
            provider: "HTTP".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "Provider error: HTTP - boom");
    }
}

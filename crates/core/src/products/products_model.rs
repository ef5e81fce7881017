//! Products domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::PLACEHOLDER_TITLE;
use crate::errors::{Result, ValidationError};
use crate::utils::decimal_input;

/// Domain model representing a tracked product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub url: String,
    pub title: String,
    /// Zero until the first successful check.
    pub current_price: Decimal,
    pub target_price: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Product {
    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }

    pub fn is_target_reached_at(&self, price: Decimal) -> bool {
        price <= self.target_price
    }
}

/// Input model for creating a new product
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub url: String,
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "decimal_input::deserialize_option_decimal"
    )]
    pub current_price: Option<Decimal>,
    #[serde(deserialize_with = "decimal_input::deserialize_decimal")]
    pub target_price: Decimal,
}

impl NewProduct {
    pub fn new(url: impl Into<String>, target_price: Decimal) -> Self {
        Self {
            url: url.into(),
            title: None,
            current_price: None,
            target_price,
        }
    }

    /// Checks the input and normalizes the url in place.
    pub fn validate(&mut self) -> Result<()> {
        let trimmed = self.url.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("url".to_string()).into());
        }
        self.url = trimmed.to_string();

        validate_target_price(self.target_price)?;

        if let Some(price) = self.current_price {
            if price.is_sign_negative() {
                return Err(ValidationError::InvalidInput(format!(
                    "current price must not be negative, got {}",
                    price
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn title_or_placeholder(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(PLACEHOLDER_TITLE)
            .to_string()
    }

    pub fn current_price_or_zero(&self) -> Decimal {
        self.current_price.unwrap_or(Decimal::ZERO)
    }
}

pub(crate) fn validate_target_price(target_price: Decimal) -> Result<()> {
    if target_price <= Decimal::ZERO {
        return Err(ValidationError::InvalidInput(format!(
            "target price must be greater than zero, got {}",
            target_price
        ))
        .into());
    }
    Ok(())
}

/// Result of registering a product for tracking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProduct {
    pub product: Product,
    /// False when the product was stored but its first check task could not
    /// be published. The next sweep picks it up.
    pub task_published: bool,
}

/// Counters reported by a full price sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub checked: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub alerts: usize,
    pub failed: usize,
}

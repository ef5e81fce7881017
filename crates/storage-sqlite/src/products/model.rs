//! Database models for products.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use pricepulse_core::products::{NewProduct, Product};

/// Parses a stored decimal string, falling back to zero on corrupt data.
/// A zero price only means "never checked", so the next check rewrites it.
pub(crate) fn parse_decimal(value: &str, field_name: &str) -> Decimal {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .unwrap_or_else(|e| {
            log::error!(
                "Failed to parse {} '{}' as Decimal ({}). Falling back to ZERO.",
                field_name,
                value,
                e
            );
            Decimal::ZERO
        })
}

/// Database model for products
#[derive(
    Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ProductDB {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub current_price: String,
    pub target_price: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for creating a new product
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
#[serde(rename_all = "camelCase")]
pub struct NewProductDB {
    pub url: String,
    pub title: String,
    pub current_price: String,
    pub target_price: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<ProductDB> for Product {
    fn from(db: ProductDB) -> Self {
        Self {
            id: db.id,
            current_price: parse_decimal(&db.current_price, "current_price"),
            target_price: parse_decimal(&db.target_price, "target_price"),
            url: db.url,
            title: db.title,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl NewProductDB {
    pub fn from_domain(new_product: &NewProduct, now: NaiveDateTime) -> Self {
        Self {
            url: new_product.url.clone(),
            title: new_product.title_or_placeholder(),
            current_price: new_product.current_price_or_zero().to_string(),
            target_price: new_product.target_price.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_keeps_scale() {
        assert_eq!(parse_decimal("45.00", "price").to_string(), "45.00");
    }

    #[test]
    fn test_parse_decimal_scientific() {
        assert_eq!(parse_decimal("1.5e2", "price"), dec!(150));
    }

    #[test]
    fn test_parse_decimal_garbage_is_zero() {
        assert_eq!(parse_decimal("abc", "price"), Decimal::ZERO);
    }
}

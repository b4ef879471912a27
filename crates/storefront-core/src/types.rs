// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Type definitions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of a catalog product, shared by the cart line that holds it.
///
/// Some catalog sources hand out numeric ids, others strings. Both are
/// accepted on read; the id is always written back as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawProductId", into = "String")]
pub struct ProductId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawProductId> for ProductId {
    fn from(raw: RawProductId) -> Self {
        match raw {
            RawProductId::Text(s) => Self(s),
            RawProductId::Signed(n) => Self(n.to_string()),
            RawProductId::Unsigned(n) => Self(n.to_string()),
        }
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The one product shape the cart accepts.
///
/// Catalog lists, search results and detail screens all map their records
/// into this before calling [`crate::CartStore::add_item`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "crate::types::decimal_text")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductSummary {
    /// Create a product summary, rejecting negative prices
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, StoreError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(StoreError::InvalidPrice(price.to_string()));
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
        })
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Normalize a raw catalog record.
    ///
    /// Accepts `product_name` or `name`, string or numeric `id`, and a
    /// numeric or string `price`.
    pub fn from_catalog_json(record: &Value) -> Result<Self, StoreError> {
        let id = match record.get("id") {
            Some(Value::String(s)) if !s.is_empty() => ProductId::from(s.as_str()),
            Some(Value::Number(n)) => ProductId(n.to_string()),
            _ => return Err(StoreError::InvalidProduct("missing id".to_string())),
        };

        let name = record
            .get("product_name")
            .or_else(|| record.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidProduct(format!("product {} has no name", id)))?;

        let price = match record.get("price") {
            Some(Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(Value::String(s)) => parse_decimal(s),
            _ => None,
        }
        .ok_or_else(|| StoreError::InvalidProduct(format!("product {} has no valid price", id)))?;

        let mut product = Self::new(id, name, price)?;
        product.image = record
            .get("image")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(product)
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Exact decimal encoding for amounts.
///
/// Written as a decimal string so every digit survives a reload. Reads
/// accept strings and JSON numbers, since older slots stored floats.
pub mod decimal_text {
    use super::parse_decimal;
    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDecimal {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let text = match RawDecimal::deserialize(deserializer)? {
            RawDecimal::Text(text) => text,
            RawDecimal::Number(number) => number.to_string(),
        };

        parse_decimal(text.trim())
            .ok_or_else(|| de::Error::custom(format!("invalid decimal amount: {}", text)))
    }
}

/// One entry in the cart: a product id with its quantity and price snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: ProductId,
    /// Display name copied from the product on first add
    #[serde(default, alias = "product_name")]
    pub name: String,
    /// Unit price copied from the product on first add, never refreshed
    #[serde(default, with = "crate::types::decimal_text")]
    pub price: Decimal,
    /// Always at least 1 while the line is in a cart
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// When the line was first created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    /// Fields the cart does not interpret, carried verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartLineItem {
    /// Snapshot a product into a new line
    pub fn from_product(product: &ProductSummary, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            image: product.image.clone(),
            added_at: Some(Utc::now()),
            extra: Map::new(),
        }
    }

    /// Unit price times quantity
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Change notifications delivered to cart subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { id: ProductId, quantity: u32 },
    QuantityChanged { id: ProductId, quantity: u32 },
    ItemRemoved { id: ProductId },
    Cleared,
}

/// Error types for the storefront core
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Persistence writer stopped")]
    WriterStopped,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::FileIo(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

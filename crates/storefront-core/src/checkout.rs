// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Checkout payloads
//
// Maps a cart snapshot into the bodies sent to the payment backend and the
// order table. Sending them is left to the frontend.

use crate::cart::CartStore;
use crate::types::{CartLineItem, StoreError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceData {
    pub currency: String,
    pub product_data: ProductData,
    /// Unit price in minor units (cents)
    pub unit_amount: i64,
}

/// One line of the payment sheet request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLineItem {
    pub price_data: PriceData,
    pub quantity: u32,
}

/// Body of the payment sheet request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSheetRequest {
    /// Amount to charge in minor units (cents)
    pub amount: i64,
    pub currency: String,
    pub line_items: Vec<PaymentLineItem>,
}

/// One row of the order's product list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderProductRow {
    pub product_name: String,
    pub product_quantity: u32,
    #[serde(with = "crate::types::decimal_text")]
    pub product_price: Decimal,
}

/// Convert an amount to whole minor units, rounding half away from zero
pub fn to_minor_units(amount: Decimal) -> Result<i64, StoreError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| StoreError::InvalidPrice(format!("{} is out of range", amount)))
}

impl PaymentSheetRequest {
    /// Build a request for `items` charging `total`
    pub fn from_items(
        items: &[CartLineItem],
        total: Decimal,
        currency: &str,
    ) -> Result<Self, StoreError> {
        if items.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let line_items = items
            .iter()
            .map(|line| {
                Ok(PaymentLineItem {
                    price_data: PriceData {
                        currency: currency.to_string(),
                        product_data: ProductData {
                            name: line.name.clone(),
                        },
                        unit_amount: to_minor_units(line.price)?,
                    },
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Self {
            amount: to_minor_units(total)?,
            currency: currency.to_string(),
            line_items,
        })
    }

    /// Build a request for the current contents of `cart`
    pub fn for_cart(cart: &CartStore, currency: &str) -> Result<Self, StoreError> {
        let request = Self::from_items(&cart.items(), cart.calculate_total(), currency)?;
        tracing::info!(
            "Prepared payment request for {} lines, amount {}",
            request.line_items.len(),
            request.amount
        );
        Ok(request)
    }
}

/// Order rows for every cart line
pub fn order_rows(items: &[CartLineItem]) -> Result<Vec<OrderProductRow>, StoreError> {
    if items.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    Ok(items
        .iter()
        .map(|line| OrderProductRow {
            product_name: line.name.clone(),
            product_quantity: line.quantity,
            product_price: line.price,
        })
        .collect())
}

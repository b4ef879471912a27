// SPDX-License-Identifier: AGPL-3.0
// Storefront CLI - Command Handlers

use crate::state::AppState;
use serde_json::{json, Value};
use std::str::FromStr;
use storefront_core::checkout::order_rows;
use storefront_core::{Decimal, PaymentSheetRequest, ProductSummary};

type CommandResult<T> = Result<T, String>;

/// Current cart contents with totals
pub fn show_cart(state: &AppState) -> CommandResult<Value> {
    let cart = &state.cart;
    Ok(json!({
        "items": cart.items(),
        "lineCount": cart.line_count(),
        "totalQuantity": cart.total_quantity(),
        "summary": cart.summary(),
    }))
}

/// Add a product to the cart
pub fn add_item(
    state: &AppState,
    id: String,
    name: String,
    price: &str,
    quantity: u32,
    image: Option<String>,
) -> CommandResult<Value> {
    let price = Decimal::from_str(price).map_err(|e| format!("Invalid price {}: {}", price, e))?;
    let mut product = ProductSummary::new(id, name, price).map_err(|e| e.to_string())?;
    if let Some(image) = image {
        product = product.with_image(image);
    }

    state.cart.add_item_with_quantity(&product, quantity);
    finish(state)
}

/// Remove a line from the cart
pub fn remove_item(state: &AppState, id: &str) -> CommandResult<Value> {
    state.cart.remove_item(id);
    finish(state)
}

/// Add one unit to a line
pub fn increment(state: &AppState, id: &str) -> CommandResult<Value> {
    state.cart.increment_quantity(id);
    finish(state)
}

/// Take one unit from a line, stopping at 1
pub fn decrement(state: &AppState, id: &str) -> CommandResult<Value> {
    state.cart.decrement_quantity(id);
    finish(state)
}

/// Set the quantity of a line, 0 removes it
pub fn set_quantity(state: &AppState, id: &str, quantity: u32) -> CommandResult<Value> {
    state.cart.set_quantity(id, quantity);
    finish(state)
}

/// Empty the cart
pub fn clear_cart(state: &AppState) -> CommandResult<Value> {
    state.cart.clear_cart();
    finish(state)
}

/// Payloads the checkout screen would send for the current cart
pub fn checkout_preview(state: &AppState) -> CommandResult<Value> {
    let settings = state.settings.get();
    let request =
        PaymentSheetRequest::for_cart(&state.cart, &settings.currency).map_err(|e| e.to_string())?;
    let rows = order_rows(&state.cart.items()).map_err(|e| e.to_string())?;

    Ok(json!({
        "paymentSheet": request,
        "orderProducts": rows,
    }))
}

/// Get current settings
pub fn get_settings(state: &AppState) -> CommandResult<Value> {
    serde_json::to_value(state.settings.get()).map_err(|e| e.to_string())
}

/// Switch tax on or off and optionally change the rate.
///
/// Takes effect the next time the cart is loaded.
pub fn set_tax(state: &AppState, enabled: bool, rate: Option<&str>) -> CommandResult<Value> {
    let mut settings = state.settings.get();
    settings.tax.enabled = enabled;
    if let Some(rate) = rate {
        settings.tax.rate =
            Decimal::from_str(rate).map_err(|e| format!("Invalid rate {}: {}", rate, e))?;
    }

    state.settings.update(settings).map_err(|e| e.to_string())?;
    get_settings(state)
}

/// Wait for the cart to reach storage, then report it
fn finish(state: &AppState) -> CommandResult<Value> {
    state.cart.flush().map_err(|e| e.to_string())?;
    show_cart(state)
}

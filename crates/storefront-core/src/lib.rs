// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Shared cart logic for all frontends
//
// This crate provides:
// - ProductSummary, CartLineItem and StoreError types
// - CartStore, the device-local cart with change notifications
// - KeyValueStorage slots backed by files or memory
// - PersistenceWriter for fire-and-forget snapshot writes
// - Pricing strategies and checkout payload mapping
// - SettingsStore for persistent cart settings
//
// Screens and payment presentation live in frontend crates.

pub mod cart;
pub mod checkout;
pub mod persistence;
pub mod pricing;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use cart::CartStore;
pub use checkout::{OrderProductRow, PaymentLineItem, PaymentSheetRequest};
pub use persistence::PersistenceWriter;
pub use pricing::{CartSummary, FlatRateTax, NoTax, PricingStrategy};
pub use settings::{CartSettings, SettingsStore, TaxSettings};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use types::{CartEvent, CartLineItem, ProductId, ProductSummary, StoreError};

// Re-export the decimal type used for all money amounts
pub use rust_decimal::Decimal;

// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Cart store
//
// The authoritative list of cart lines for this device.
// Seeded from a local storage slot on load, written back after every change.

use crate::persistence::PersistenceWriter;
use crate::pricing::{CartSummary, PricingStrategy};
use crate::settings::CartSettings;
use crate::storage::KeyValueStorage;
use crate::types::{CartEvent, CartLineItem, ProductSummary, StoreError};
use async_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;

/// Device-local shopping cart.
///
/// Build one at startup and share it with every screen. Mutations and
/// queries never fail: an id that is not in the cart is simply ignored.
/// Decrementing a line at quantity 1 leaves it at 1; only
/// [`CartStore::remove_item`] and [`CartStore::set_quantity`] with zero
/// take a line out.
pub struct CartStore {
    items: RwLock<Vec<CartLineItem>>,
    subscribers: Mutex<Vec<Sender<CartEvent>>>,
    pricing: Box<dyn PricingStrategy>,
    writer: PersistenceWriter,
}

impl CartStore {
    /// Create a cart store, seeding it from the slot named in `settings`.
    ///
    /// A slot that is missing, unreadable or malformed gives an empty cart.
    pub fn load(
        storage: Arc<dyn KeyValueStorage>,
        settings: &CartSettings,
    ) -> Result<Self, StoreError> {
        let key = settings.storage_key.clone();
        let items = Self::read_items(storage.as_ref(), &key);
        tracing::info!("Loaded cart with {} lines", items.len());

        let pricing = settings.pricing_strategy()?;
        let writer = PersistenceWriter::spawn(storage, key)?;

        Ok(Self {
            items: RwLock::new(items),
            subscribers: Mutex::new(Vec::new()),
            pricing,
            writer,
        })
    }

    /// Replace the pricing strategy picked from settings
    pub fn with_pricing(mut self, pricing: impl PricingStrategy + 'static) -> Self {
        self.pricing = Box::new(pricing);
        self
    }

    fn read_items(storage: &dyn KeyValueStorage, key: &str) -> Vec<CartLineItem> {
        let content = match storage.get_item(key) {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::info!("No saved cart found, starting empty");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read saved cart, starting empty: {}", e);
                return Vec::new();
            }
        };

        let raw_lines = match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(raw_lines) => raw_lines,
            Err(e) => {
                tracing::warn!("Failed to parse saved cart, starting empty: {}", e);
                return Vec::new();
            }
        };

        // One unreadable line must not cost the rest of the cart
        let items = raw_lines
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<CartLineItem>(raw) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Dropping unreadable saved line {}: {}", index, e);
                    None
                }
            })
            .collect();

        normalize(items)
    }

    /// Add one unit of a product
    pub fn add_item(&self, product: &ProductSummary) {
        self.add_item_with_quantity(product, 1);
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line keeps its position and price snapshot and only
    /// grows. A quantity of 0 does nothing.
    pub fn add_item_with_quantity(&self, product: &ProductSummary, quantity: u32) {
        if quantity == 0 {
            tracing::debug!("Ignoring add of zero units of {}", product.id);
            return;
        }

        let mut items = self.items.write();
        let event = match items.iter_mut().find(|line| line.id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                CartEvent::QuantityChanged {
                    id: line.id.clone(),
                    quantity: line.quantity,
                }
            }
            None => {
                items.push(CartLineItem::from_product(product, quantity));
                CartEvent::ItemAdded {
                    id: product.id.clone(),
                    quantity,
                }
            }
        };

        self.commit(event, &items);
    }

    /// Remove a line. Removing an absent id does nothing.
    pub fn remove_item(&self, id: &str) {
        let mut items = self.items.write();
        let Some(position) = items.iter().position(|line| line.id.as_str() == id) else {
            return;
        };
        let removed = items.remove(position);

        self.commit(CartEvent::ItemRemoved { id: removed.id }, &items);
    }

    /// Add one unit to an existing line
    pub fn increment_quantity(&self, id: &str) {
        self.update_quantity(id, |quantity| Some(quantity.saturating_add(1)));
    }

    /// Take one unit from an existing line, never going below 1
    pub fn decrement_quantity(&self, id: &str) {
        self.update_quantity(id, |quantity| (quantity > 1).then(|| quantity - 1));
    }

    /// Set the quantity of an existing line; 0 removes it
    pub fn set_quantity(&self, id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(id);
            return;
        }
        self.update_quantity(id, |current| (current != quantity).then_some(quantity));
    }

    /// Apply `change` to a line's quantity. `None` means nothing changed.
    fn update_quantity(&self, id: &str, change: impl FnOnce(u32) -> Option<u32>) {
        let mut items = self.items.write();
        let Some(line) = items.iter_mut().find(|line| line.id.as_str() == id) else {
            return;
        };
        let Some(quantity) = change(line.quantity) else {
            return;
        };
        line.quantity = quantity;
        let event = CartEvent::QuantityChanged {
            id: line.id.clone(),
            quantity,
        };

        self.commit(event, &items);
    }

    /// Empty the cart. Always rewrites the slot.
    pub fn clear_cart(&self) {
        let mut items = self.items.write();
        tracing::info!("Cleared {} lines from cart", items.len());
        items.clear();

        self.commit(CartEvent::Cleared, &items);
    }

    /// Queue the write and notify subscribers.
    ///
    /// Callers hold the `items` write guard, so snapshots and events leave
    /// in the same order the mutations happened.
    fn commit(&self, event: CartEvent, items: &[CartLineItem]) {
        tracing::debug!("Cart changed: {:?}", event);
        self.writer.schedule(items.to_vec());
        self.notify(event);
    }

    fn notify(&self, event: CartEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.try_send(event.clone()).is_ok());
    }

    /// Receive a [`CartEvent`] for every change from now on.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<CartEvent> {
        let (tx, rx) = async_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Snapshot of all lines in insertion order
    pub fn items(&self) -> Vec<CartLineItem> {
        self.items.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<CartLineItem> {
        self.items
            .read()
            .iter()
            .find(|line| line.id.as_str() == id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.read().iter().any(|line| line.id.as_str() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Number of distinct lines
    pub fn line_count(&self) -> usize {
        self.items.read().len()
    }

    /// Sum of quantities across all lines
    pub fn total_quantity(&self) -> u64 {
        self.items
            .read()
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Sum of unit price times quantity, unrounded
    pub fn calculate_subtotal(&self) -> Decimal {
        self.items
            .read()
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.line_total()))
    }

    /// Subtotal with the configured pricing strategy applied
    pub fn calculate_total(&self) -> Decimal {
        self.pricing.total(self.calculate_subtotal())
    }

    /// Subtotal, tax, shipping and total rounded to cents
    pub fn summary(&self) -> CartSummary {
        CartSummary::compute(self.calculate_subtotal(), self.pricing.as_ref())
    }

    /// Slot the cart is persisted under
    pub fn storage_key(&self) -> &str {
        self.writer.key()
    }

    /// Block until all scheduled writes have reached storage
    pub fn flush(&self) -> Result<(), StoreError> {
        self.writer.flush()
    }
}

/// Drop lines that break cart invariants and merge repeated ids
fn normalize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut lines: Vec<CartLineItem> = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 {
            tracing::warn!("Dropping saved line {} with zero quantity", item.id);
            continue;
        }
        if item.price.is_sign_negative() && !item.price.is_zero() {
            tracing::warn!("Dropping saved line {} with negative price", item.id);
            continue;
        }

        match lines.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => lines.push(item),
        }
    }

    lines
}

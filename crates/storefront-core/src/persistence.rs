// SPDX-License-Identifier: AGPL-3.0
// Storefront Core - Background cart persistence
//
// Mutations hand a snapshot to a single writer thread and return at once.
// The thread applies snapshots in order, so storage converges on the latest one.

use crate::storage::KeyValueStorage;
use crate::types::{CartLineItem, StoreError};
use async_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Commands that can be sent to the writer thread
#[derive(Debug)]
enum WriterCommand {
    Write { snapshot: Vec<CartLineItem> },
    Flush { reply: Sender<()> },
}

/// Fire-and-forget writer for the cart slot
pub struct PersistenceWriter {
    command_tx: Sender<WriterCommand>,
    handle: Option<JoinHandle<()>>,
    key: String,
}

impl PersistenceWriter {
    pub fn spawn(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let (command_tx, command_rx) = async_channel::unbounded::<WriterCommand>();

        let thread_key = key.clone();
        let handle = thread::Builder::new()
            .name("cart-writer".to_string())
            .spawn(move || Self::run_writer(storage, thread_key, command_rx))
            .map_err(|e| StoreError::FileIo(format!("Failed to start cart writer: {}", e)))?;

        Ok(Self {
            command_tx,
            handle: Some(handle),
            key,
        })
    }

    /// Slot this writer replaces on every write
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queue a snapshot for writing without waiting for it
    pub fn schedule(&self, snapshot: Vec<CartLineItem>) {
        if self
            .command_tx
            .try_send(WriterCommand::Write { snapshot })
            .is_err()
        {
            tracing::warn!("Cart writer is gone, dropping snapshot for {}", self.key);
        }
    }

    /// Block until every snapshot queued so far has been written
    pub fn flush(&self) -> Result<(), StoreError> {
        let (reply_tx, reply_rx) = async_channel::bounded(1);

        self.command_tx
            .send_blocking(WriterCommand::Flush { reply: reply_tx })
            .map_err(|_| StoreError::WriterStopped)?;

        reply_rx.recv_blocking().map_err(|_| StoreError::WriterStopped)
    }

    fn run_writer(
        storage: Arc<dyn KeyValueStorage>,
        key: String,
        command_rx: Receiver<WriterCommand>,
    ) {
        while let Ok(command) = command_rx.recv_blocking() {
            match command {
                WriterCommand::Write { mut snapshot } => {
                    // Skip snapshots that are already stale
                    let mut waiting = Vec::new();
                    while let Ok(next) = command_rx.try_recv() {
                        match next {
                            WriterCommand::Write { snapshot: newer } => snapshot = newer,
                            WriterCommand::Flush { reply } => {
                                waiting.push(reply);
                                break;
                            }
                        }
                    }

                    Self::write_snapshot(storage.as_ref(), &key, &snapshot);

                    for reply in waiting {
                        let _ = reply.send_blocking(());
                    }
                }
                WriterCommand::Flush { reply } => {
                    let _ = reply.send_blocking(());
                }
            }
        }

        tracing::debug!("Cart writer for {} stopped", key);
    }

    fn write_snapshot(storage: &dyn KeyValueStorage, key: &str, snapshot: &[CartLineItem]) {
        let content = match serde_json::to_string(snapshot) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to serialize cart: {}", e);
                return;
            }
        };

        match storage.set_item(key, &content) {
            Ok(()) => tracing::debug!("Persisted {} cart lines", snapshot.len()),
            Err(e) => tracing::error!("Failed to persist cart: {}", e),
        }
    }
}

impl Drop for PersistenceWriter {
    fn drop(&mut self) {
        // Queued snapshots are still drained after close
        self.command_tx.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Cart writer thread panicked");
            }
        }
    }
}

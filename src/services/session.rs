// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Layer session: which datasets are currently on the map.
//!
//! Each dataset has at most one slot. A slot is either loading (a fetch task
//! is in flight), active (a transformed layer is displayed) or failed (the
//! last load failed and the message is kept until the next remove).
//!
//! Slots are stored in a `DashMap`, so every check-and-set on one dataset is
//! serialized by the shard lock. No lock is held across an await.

use crate::models::{Dataset, Layer};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

enum Slot {
    Loading {
        ticket: u64,
        abort: Option<AbortHandle>,
    },
    Active(Arc<Layer>),
    Failed(String),
}

impl Slot {
    fn is_ticket(&self, ticket: u64) -> bool {
        matches!(self, Slot::Loading { ticket: t, .. } if *t == ticket)
    }
}

/// Public view of a dataset's slot.
#[derive(Debug, Clone)]
pub enum LayerState {
    Idle,
    Loading,
    Active(Arc<Layer>),
    Failed(String),
}

impl LayerState {
    pub fn status(&self) -> LayerStatus {
        match self {
            LayerState::Idle => LayerStatus::Idle,
            LayerState::Loading => LayerStatus::Loading,
            LayerState::Active(_) => LayerStatus::Active,
            LayerState::Failed(_) => LayerStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum LayerStatus {
    Idle,
    Loading,
    Active,
    Failed,
}

/// Result of a remove request.
#[derive(Debug, Clone)]
pub enum Detached {
    Layer(Arc<Layer>),
    CancelledLoad,
    ClearedFailure,
    Nothing,
}

/// Why a load could not begin.
#[derive(Debug, Clone)]
pub enum BeginError {
    AlreadyActive(Arc<Layer>),
    AlreadyLoading,
}

/// Registry of displayed layers.
#[derive(Default)]
pub struct LayerSession {
    slots: DashMap<Dataset, Slot>,
    next_ticket: AtomicU64,
}

impl LayerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test if the dataset is currently displayed.
    pub fn is_layer_active(&self, dataset: Dataset) -> bool {
        matches!(self.slots.get(&dataset).as_deref(), Some(Slot::Active(_)))
    }

    pub fn active_layer(&self, dataset: Dataset) -> Option<Arc<Layer>> {
        match self.slots.get(&dataset).as_deref() {
            Some(Slot::Active(layer)) => Some(layer.clone()),
            _ => None,
        }
    }

    /// All displayed layers, in dataset order.
    pub fn active_layers(&self) -> Vec<Arc<Layer>> {
        Dataset::ALL
            .iter()
            .filter_map(|d| self.active_layer(*d))
            .collect()
    }

    pub fn state(&self, dataset: Dataset) -> LayerState {
        match self.slots.get(&dataset).as_deref() {
            None => LayerState::Idle,
            Some(Slot::Loading { .. }) => LayerState::Loading,
            Some(Slot::Active(layer)) => LayerState::Active(layer.clone()),
            Some(Slot::Failed(message)) => LayerState::Failed(message.clone()),
        }
    }

    /// Put a layer on the map. Returns `false` and keeps the displayed layer
    /// if the dataset is already active.
    pub fn attach_layer(&self, layer: Arc<Layer>) -> bool {
        match self.slots.entry(layer.dataset) {
            Entry::Occupied(entry) if matches!(entry.get(), Slot::Active(_)) => false,
            Entry::Occupied(mut entry) => {
                if let Slot::Loading {
                    abort: Some(handle),
                    ..
                } = entry.insert(Slot::Active(layer))
                {
                    handle.abort();
                }
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot::Active(layer));
                true
            }
        }
    }

    /// Take a dataset off the map. Cancels a load in flight and clears a
    /// recorded failure.
    pub fn detach_layer(&self, dataset: Dataset) -> Detached {
        match self.slots.remove(&dataset) {
            None => Detached::Nothing,
            Some((_, Slot::Active(layer))) => {
                tracing::info!(dataset = %dataset, "Layer removed");
                Detached::Layer(layer)
            }
            Some((_, Slot::Loading { abort, .. })) => {
                if let Some(handle) = abort {
                    handle.abort();
                }
                tracing::info!(dataset = %dataset, "Load cancelled");
                Detached::CancelledLoad
            }
            Some((_, Slot::Failed(_))) => Detached::ClearedFailure,
        }
    }

    /// Mark the dataset as loading. The returned ticket owns that state:
    /// settle it with the outcome, or drop it to roll back.
    pub fn begin_loading(&self, dataset: Dataset) -> Result<LoadTicket<'_>, BeginError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let loading = Slot::Loading {
            ticket,
            abort: None,
        };

        match self.slots.entry(dataset) {
            Entry::Occupied(mut entry) => match entry.get() {
                Slot::Active(layer) => return Err(BeginError::AlreadyActive(layer.clone())),
                Slot::Loading { .. } => return Err(BeginError::AlreadyLoading),
                Slot::Failed(_) => {
                    entry.insert(loading);
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(loading);
            }
        }

        tracing::debug!(dataset = %dataset, ticket, "Load started");
        Ok(LoadTicket {
            session: self,
            dataset,
            ticket,
            settled: false,
        })
    }
}

/// Loading state of one dataset, tied to the lifetime of its load task.
pub struct LoadTicket<'a> {
    session: &'a LayerSession,
    dataset: Dataset,
    ticket: u64,
    settled: bool,
}

impl LoadTicket<'_> {
    /// Register the task so a remove request can abort it. If the load was
    /// already cancelled the task is aborted immediately.
    pub fn set_abort(&mut self, handle: AbortHandle) {
        match self.session.slots.get_mut(&self.dataset).as_deref_mut() {
            Some(Slot::Loading { ticket, abort }) if *ticket == self.ticket => {
                *abort = Some(handle);
            }
            _ => handle.abort(),
        }
    }

    /// Attach the loaded layer. Returns `None` if the load was cancelled in
    /// the meantime; the layer is discarded.
    pub fn settle_active(mut self, layer: Layer) -> Option<Arc<Layer>> {
        self.settled = true;
        let layer = Arc::new(layer);
        let attached = match self.session.slots.get_mut(&self.dataset).as_deref_mut() {
            Some(slot) if slot.is_ticket(self.ticket) => {
                *slot = Slot::Active(layer.clone());
                true
            }
            _ => false,
        };
        if !attached {
            tracing::debug!(dataset = %self.dataset, "Discarding layer of cancelled load");
            return None;
        }
        tracing::info!(
            dataset = %self.dataset,
            features = layer.collection.features.len(),
            "Layer attached"
        );
        Some(layer)
    }

    /// Record a failed load. The message stays until the next remove.
    pub fn settle_failed(mut self, message: String) {
        self.settled = true;
        if let Some(slot) = self.session.slots.get_mut(&self.dataset).as_deref_mut() {
            if slot.is_ticket(self.ticket) {
                *slot = Slot::Failed(message);
            }
        }
    }
}

impl Drop for LoadTicket<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let ticket = self.ticket;
        let removed = self
            .session
            .slots
            .remove_if(&self.dataset, |_, slot| slot.is_ticket(ticket));
        if let Some((_, Slot::Loading { abort: Some(handle), .. })) = removed {
            handle.abort();
        }
        tracing::debug!(dataset = %self.dataset, ticket, "Load abandoned");
    }
}

//! Test utilities and a sandbox facade for Tether development.
//!
//! Provides [`GridWorld`], a small deterministic implementation of
//! [`SimulationFacade`](tether_core::SimulationFacade), and a shared
//! [`CallLog`] that records every facade call so tests can assert which
//! calls did (or did not) reach the simulation.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod fixtures;
pub mod grid;

pub use grid::GridWorld;

/// Shared, clonable record of facade calls.
///
/// Entries are short strings such as `"perform:craft"`,
/// `"start_move:up"` or `"snapshot:3"`. Ticks are not recorded.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

/// Entry prefixes that only read simulation state.
const READ_PREFIXES: [&str; 2] = ["snapshot", "inventory_item"];

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// Copy of every entry in call order.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Entries that may have changed the world.
    pub fn mutations(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| !READ_PREFIXES.iter().any(|p| e.starts_with(p)))
            .cloned()
            .collect()
    }

    /// Number of entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }

    /// Whether no call has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

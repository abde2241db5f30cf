//! Local, possibly stale copy of a remote table's visible rows.
//!
//! The mirror is rebuilt by a fetch and patched in place after each
//! successful write; nothing here reconciles it with writes made by other
//! sessions, `refetch` is the only way to catch up.
//!
//! The lock is only held for the duration of a read or a patch, never
//! across a remote call, so several operations may be in flight at once.
//! Racing writes to the same row land in the order their responses arrive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::models::Record;
use crate::store::StoreError;

struct MirrorState<T> {
    items: Arc<Vec<T>>,
    loading: bool,
    error: Option<String>,
}

pub(crate) struct Mirror<T> {
    state: Mutex<MirrorState<T>>,
}

impl<T: Record + Clone> Mirror<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(MirrorState {
                items: Arc::new(Vec::new()),
                loading: false,
                error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MirrorState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current rows. A failed operation leaves the
    /// snapshot pointer unchanged.
    pub(crate) fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.lock().items)
    }

    pub(crate) fn loading(&self) -> bool {
        self.lock().loading
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub(crate) fn begin_load(&self) {
        self.lock().loading = true;
    }

    /// Ends a fetch. Success replaces the rows and clears the error; failure
    /// records the message and keeps the previous rows.
    pub(crate) fn finish_load(&self, result: Result<Vec<T>, String>) {
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(items) => {
                state.items = Arc::new(items);
                state.error = None;
            }
            Err(message) => state.error = Some(message),
        }
    }

    pub(crate) fn clear(&self) {
        let mut state = self.lock();
        state.items = Arc::new(Vec::new());
        state.loading = false;
        state.error = None;
    }

    pub(crate) fn prepend(&self, item: T) {
        self.patch(|items| items.insert(0, item));
    }

    pub(crate) fn append(&self, item: T) {
        self.patch(|items| items.push(item));
    }

    /// Replaces the row with the same id, keeping its position.
    pub(crate) fn replace(&self, item: T) {
        let id = item.id();
        self.patch(|items| {
            if let Some(slot) = items.iter_mut().find(|existing| existing.id() == id) {
                *slot = item;
            }
        });
    }

    pub(crate) fn remove(&self, id: Uuid) {
        self.patch(|items| items.retain(|existing| existing.id() != id));
    }

    fn patch(&self, f: impl FnOnce(&mut Vec<T>)) {
        let mut state = self.lock();
        let mut items = state.items.as_ref().clone();
        f(&mut items);
        state.items = Arc::new(items);
    }
}

/// Message recorded when a fetch fails. Backend and transport errors keep
/// their own message; anything else gets the generic `fallback`.
pub(crate) fn fetch_failure_message(error: &StoreError, fallback: &str) -> String {
    match error {
        StoreError::Rejected { .. } | StoreError::Network(_) => error.to_string(),
        _ => fallback.to_string(),
    }
}

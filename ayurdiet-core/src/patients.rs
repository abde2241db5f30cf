//! Patient records visible to the signed-in user.
//!
//! A doctor sees the patients assigned to them; a patient sees their own
//! record. The list is mirrored locally and patched after each successful
//! write rather than refetched.

use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::mirror::{fetch_failure_message, Mirror};
use crate::models::{NewPatient, Patient, PatientUpdate};
use crate::session::SessionState;
use crate::store::{decode_rows, decode_single, Filter, Order, Query, RemoteStore, Select, StoreError};

const TABLE: &str = "patients";
const FETCH_FAILED: &str = "Failed to fetch patients";

/// Patient rows with the patient-user profile embedded as `profile`.
fn patient_select() -> Select {
    Select::all().embed("profile", "profiles", "user_id")
}

pub struct PatientList {
    store: Arc<dyn RemoteStore>,
    session: Mutex<SessionState>,
    mirror: Mirror<Patient>,
}

impl PatientList {
    /// Creates an empty list. Nothing is fetched until [`fetch`](Self::fetch)
    /// is called.
    pub fn new(store: Arc<dyn RemoteStore>, session: SessionState) -> Self {
        Self {
            store,
            session: Mutex::new(session),
            mirror: Mirror::new(),
        }
    }

    /// Creates the list and fetches it for `session`.
    pub async fn open(store: Arc<dyn RemoteStore>, session: SessionState) -> Self {
        let list = Self::new(store, session);
        list.fetch().await;
        list
    }

    pub fn items(&self) -> Arc<Vec<Patient>> {
        self.mirror.items()
    }

    pub fn loading(&self) -> bool {
        self.mirror.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.mirror.error()
    }

    pub fn session(&self) -> SessionState {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The first `count` patients, most recently created first.
    pub fn recent(&self, count: usize) -> Vec<Patient> {
        self.items().iter().take(count).cloned().collect()
    }

    /// Switches to a new identity. A different signed-in identity triggers
    /// a fetch; signing out empties the list.
    pub async fn set_session(&self, session: SessionState) {
        let previous = {
            let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, session)
        };
        if previous == session {
            return;
        }
        match session {
            SessionState::SignedIn(_) => self.fetch().await,
            SessionState::SignedOut => self.mirror.clear(),
            SessionState::Resolving => {}
        }
    }

    /// Loads the patients visible to the current identity, newest first.
    ///
    /// Does nothing while the identity is still resolving. Failures are
    /// recorded in [`error`](Self::error) and keep the previous list.
    pub async fn fetch(&self) {
        let identity = match self.session() {
            SessionState::SignedIn(identity) => identity,
            SessionState::SignedOut => {
                self.mirror.clear();
                return;
            }
            SessionState::Resolving => return,
        };

        let scope = if identity.is_doctor() {
            Filter::eq("doctor_id", identity.id.to_string())
        } else {
            Filter::eq("user_id", identity.id.to_string())
        };
        let query = Query::new()
            .select(patient_select())
            .filter(scope)
            .order(Order::desc("created_at"));

        self.mirror.begin_load();
        let result = self
            .store
            .select(TABLE, &query)
            .await
            .and_then(decode_rows::<Patient>);

        match result {
            Ok(patients) => {
                tracing::debug!(count = patients.len(), role = %identity.role, "fetched patients");
                self.mirror.finish_load(Ok(patients));
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch patients");
                self.mirror.finish_load(Err(fetch_failure_message(&e, FETCH_FAILED)));
            }
        }
    }

    pub async fn refetch(&self) {
        self.fetch().await
    }

    /// Creates a patient record and puts it at the top of the list.
    ///
    /// When the caller is a doctor the record is always assigned to them,
    /// whatever `doctor_id` the draft carries.
    pub async fn add(&self, mut draft: NewPatient) -> Result<Patient, StoreError> {
        if let Some(identity) = self.session().identity() {
            if identity.is_doctor() {
                draft.doctor_id = Some(identity.id);
            }
        }
        draft.derive_bmi();

        let row = serde_json::to_value(&draft)?;
        let stored = self.store.insert(TABLE, row, &patient_select()).await?;
        let patient: Patient = serde_json::from_value(stored)?;

        self.mirror.prepend(patient.clone());
        Ok(patient)
    }

    /// Applies `changes` to the record with `id` and replaces it in place.
    pub async fn update(&self, id: Uuid, mut changes: PatientUpdate) -> Result<Patient, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::InvalidInput("No fields to update".to_string()));
        }
        changes.derive_bmi();

        let patch = serde_json::to_value(&changes)?;
        let rows = self
            .store
            .update(TABLE, &[Filter::id(id)], patch, &patient_select())
            .await?;
        let patient: Patient = decode_single(rows)?;

        self.mirror.replace(patient.clone());
        Ok(patient)
    }

    /// Deletes the record with `id` from the backend and from the list.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(TABLE, &[Filter::id(id)]).await?;
        self.mirror.remove(id);
        Ok(())
    }
}

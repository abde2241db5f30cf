//! The caller's identity, as seen by the data-access objects.

use uuid::Uuid;

use crate::models::{Profile, Role};

/// Resolved identity of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn doctor(id: Uuid) -> Self {
        Self::new(id, Role::Doctor)
    }

    pub fn patient(id: Uuid) -> Self {
        Self::new(id, Role::Patient)
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}

impl From<&Profile> for Identity {
    fn from(profile: &Profile) -> Self {
        Self::new(profile.id, profile.role)
    }
}

/// Where the identity provider is in resolving the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not known yet; data that depends on identity must not be fetched.
    #[default]
    Resolving,
    /// Nobody is signed in; there is nothing to show.
    SignedOut,
    SignedIn(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<Identity> {
        match self {
            SessionState::SignedIn(identity) => Some(*identity),
            _ => None,
        }
    }
}

impl From<Identity> for SessionState {
    fn from(identity: Identity) -> Self {
        SessionState::SignedIn(identity)
    }
}

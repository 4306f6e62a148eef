//! User aggregate.

use super::{CredentialHash, EmailAddress, UserId, Username};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Registered user identity.
///
/// The credential hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    username: Username,
    email: EmailAddress,
    #[serde(skip_serializing)]
    credential: CredentialHash,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserData {
    /// Persisted user identifier.
    pub id: UserId,
    /// Persisted username.
    pub username: Username,
    /// Persisted email address.
    pub email: EmailAddress,
    /// Persisted credential hash.
    pub credential: CredentialHash,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a newly registered user.
    #[must_use]
    pub fn new(
        username: Username,
        email: EmailAddress,
        credential: CredentialHash,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: UserId::new(),
            username,
            email,
            credential,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a user from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            username: data.username,
            email: data.email,
            credential: data.credential,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the credential hash.
    #[must_use]
    pub const fn credential(&self) -> &CredentialHash {
        &self.credential
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the credential hash.
    pub fn replace_credential(&mut self, credential: CredentialHash, clock: &impl Clock) {
        self.credential = credential;
        self.updated_at = clock.utc();
    }
}

/// Records that still reference a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDependents {
    /// Projects created by the user.
    pub created_projects: usize,
    /// Tasks created by the user.
    pub created_tasks: usize,
    /// Tasks currently assigned to the user.
    pub assigned_tasks: usize,
    /// Project memberships held by the user.
    pub memberships: usize,
}

impl UserDependents {
    /// Returns `true` when nothing references the user.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.created_projects == 0
            && self.created_tasks == 0
            && self.assigned_tasks == 0
            && self.memberships == 0
    }
}

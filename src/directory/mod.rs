//! User directory collaborator.
//!
//! # Responsibilities
//! - Identity records: role, ban state, credential hash
//! - `UserDirectory` contract consumed by the auth and policy subsystems
//! - Argon2 credential hashing/verification (PHC strings)
//!
//! The production directory sits on a relational store behind this trait;
//! the in-memory implementation here serves tests and single-process
//! deployments.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use dashmap::DashMap;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role lattice: `User < Moderator < Admin`. Grants are additive, so
/// capability checks compare against the minimum required role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub banned: bool,
    pub ban_reason: Option<String>,
}

impl Identity {
    pub fn new(username: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            role,
            banned: false,
            ban_reason: None,
        }
    }
}

/// Directory contract. Lookups return `None` for unknown identities;
/// `persist` reports `false` so callers can surface a typed not-found.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<Identity>;

    async fn get(&self, id: Uuid) -> Option<Identity>;

    /// Persist a role or ban change. Returns `false` when the identity is
    /// not registered.
    async fn persist(&self, identity: &Identity) -> bool;
}

/// Hash a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|_| password_hash::Error::Crypto)?;
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(phc)
}

/// Verify a password against a stored PHC string. Malformed hashes verify
/// as false rather than erroring.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Concurrent in-memory directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    by_id: DashMap<Uuid, Identity>,
    by_username: DashMap<String, Uuid>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new identity. Returns `None` when the username is taken.
    pub fn register(&self, identity: Identity) -> Option<Uuid> {
        use dashmap::mapref::entry::Entry;
        match self.by_username.entry(identity.username.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let id = identity.id;
                slot.insert(id);
                self.by_id.insert(id, identity);
                Some(id)
            }
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Option<Identity> {
        let id = *self.by_username.get(username)?;
        self.by_id.get(&id).map(|r| r.value().clone())
    }

    async fn get(&self, id: Uuid) -> Option<Identity> {
        self.by_id.get(&id).map(|r| r.value().clone())
    }

    async fn persist(&self, identity: &Identity) -> bool {
        match self.by_id.get_mut(&identity.id) {
            Some(mut slot) => {
                *slot = identity.clone();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let phc = hash_password("hunter2").unwrap();
        assert!(verify_password(&phc, "hunter2"));
        assert!(!verify_password(&phc, "hunter3"));
        assert!(!verify_password("not-a-phc-string", "hunter2"));
    }

    #[test]
    fn role_lattice_is_ordered() {
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_usernames_rejected() {
        let dir = InMemoryDirectory::new();
        let phc = hash_password("pw").unwrap();
        assert!(dir
            .register(Identity::new("alice", phc.clone(), Role::User))
            .is_some());
        assert!(dir.register(Identity::new("alice", phc, Role::User)).is_none());
    }

    #[tokio::test]
    async fn persist_unknown_identity_reports_false() {
        let dir = InMemoryDirectory::new();
        let ghost = Identity::new("ghost", "x".into(), Role::User);
        assert!(!dir.persist(&ghost).await);
    }
}

//! Thread-safe handle around a [`SessionRegistry`].

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::config::{Lifetime, RegistryConfig};
use crate::error::Result;
use crate::registry::{RegistryStats, SessionRegistry};
use crate::session::Session;

/// Cloneable handle that serializes access to one registry behind a mutex.
///
/// Each call takes the lock for its own duration and returns owned values.
/// Use [`lock`](Self::lock) to run several operations atomically.
pub struct SharedRegistry<U, C: Clock = SystemClock> {
    inner: Arc<Mutex<SessionRegistry<U, C>>>,
}

impl<U> SharedRegistry<U, SystemClock> {
    /// Create a shared registry backed by the system clock.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        SessionRegistry::new(config).map(Self::from_registry)
    }
}

impl<U, C: Clock> SharedRegistry<U, C> {
    /// Create a shared registry that reads time from `clock`.
    pub fn with_clock(config: RegistryConfig, clock: C) -> Result<Self> {
        SessionRegistry::with_clock(config, clock).map(Self::from_registry)
    }

    /// Wrap an existing registry.
    pub fn from_registry(registry: SessionRegistry<U, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Exclusive access to the underlying registry.
    pub fn lock(&self) -> MutexGuard<'_, SessionRegistry<U, C>> {
        self.inner.lock()
    }

    /// Start a session bound to `user`. See [`SessionRegistry::start`].
    pub fn start(&self, user: U) -> Result<String> {
        self.inner.lock().start(user)
    }

    /// End a session. Returns whether one was removed.
    pub fn end(&self, id: &str) -> bool {
        self.inner.lock().end(id)
    }

    /// Push a session's expiry forward. Returns whether it exists.
    pub fn renew(&self, id: &str) -> bool {
        self.inner.lock().renew(id)
    }

    /// Validate (and renew) a session, returning a copy of its user.
    pub fn validate(&self, id: &str) -> Option<U>
    where
        U: Clone,
    {
        self.inner.lock().validate(id).cloned()
    }

    /// Copy of the bound user, without renewal or expiry checks.
    pub fn get_user(&self, id: &str) -> Option<U>
    where
        U: Clone,
    {
        self.inner.lock().get_user(id).cloned()
    }

    /// Replace the bound user. Returns whether the session exists.
    pub fn update_user(&self, id: &str, user: U) -> bool {
        self.inner.lock().update_user(id, user)
    }

    /// Id of the oldest session bound to a user equal to `user`.
    pub fn get_session_id(&self, user: &U) -> Option<String>
    where
        U: PartialEq,
    {
        self.inner.lock().get_session_id(user).map(str::to_string)
    }

    /// Snapshot of all sessions in insertion order.
    pub fn get_all(&self) -> Vec<Session<U>>
    where
        U: Clone,
    {
        self.inner.lock().get_all().cloned().collect()
    }

    /// Remove every session.
    pub fn destroy_all(&self) {
        self.inner.lock().destroy_all()
    }

    /// Remove expired sessions, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired()
    }

    /// Number of sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Point-in-time counts and settings.
    pub fn stats(&self) -> RegistryStats {
        self.inner.lock().stats()
    }

    /// Lifetime applied to new starts and renewals.
    pub fn lifetime(&self) -> Lifetime {
        self.inner.lock().lifetime()
    }

    /// Change the lifetime for future starts and renewals.
    pub fn set_lifetime(&self, lifetime: Lifetime) -> Result<()> {
        self.inner.lock().set_lifetime(lifetime)
    }

    /// Length of newly generated ids.
    pub fn id_length(&self) -> usize {
        self.inner.lock().id_length()
    }

    /// Change the length of newly generated ids.
    pub fn set_id_length(&self, id_length: usize) -> Result<()> {
        self.inner.lock().set_id_length(id_length)
    }
}

impl<U, C: Clock> Clone for SharedRegistry<U, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

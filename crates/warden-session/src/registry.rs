//! Session registry with sliding expiration and lazy eviction.

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::{Lifetime, RegistryConfig, validate_id_length};
use crate::error::{Error, Result};
use crate::id;
use crate::session::{Expiry, Session};

/// In-memory registry of sessions keyed by id.
///
/// The registry provides:
/// - Unique random ids, regenerated on collision
/// - Sliding expiration: a successful [`validate`](Self::validate) renews the session
/// - Lazy eviction: expired sessions stay until ended, purged or cleared
/// - Reverse lookup from a user value to its session id
///
/// There is no internal locking. Every mutating operation takes `&mut self`,
/// so callers sharing a registry across threads must serialize access, for
/// example through [`SharedRegistry`](crate::SharedRegistry).
pub struct SessionRegistry<U, C: Clock = SystemClock> {
    /// Sessions in insertion order. Only the non-promoting `peek` family is
    /// used, so the recency list never reorders; iterating it in reverse
    /// yields insertion order.
    sessions: LruCache<String, Session<U>>,

    config: RegistryConfig,

    clock: C,
}

impl<U> SessionRegistry<U, SystemClock> {
    /// Create a registry backed by the system clock.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<U> Default for SessionRegistry<U, SystemClock> {
    fn default() -> Self {
        Self {
            sessions: LruCache::unbounded(),
            config: RegistryConfig::default(),
            clock: SystemClock,
        }
    }
}

impl<U, C: Clock> SessionRegistry<U, C> {
    /// Create a registry that reads time from `clock`.
    pub fn with_clock(config: RegistryConfig, clock: C) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            sessions: LruCache::unbounded(),
            config,
            clock,
        })
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The clock used for expiry decisions.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Lifetime applied by future starts and renewals.
    pub fn lifetime(&self) -> Lifetime {
        self.config.lifetime
    }

    /// Change the lifetime. Already-issued expiries are not touched.
    pub fn set_lifetime(&mut self, lifetime: Lifetime) -> Result<()> {
        lifetime.validate()?;
        debug!(lifetime = %lifetime, "Session lifetime changed");
        self.config.lifetime = lifetime;
        Ok(())
    }

    /// Length of ids generated by future starts.
    pub fn id_length(&self) -> usize {
        self.config.id_length
    }

    /// Change the id length. Existing ids keep their length.
    pub fn set_id_length(&mut self, id_length: usize) -> Result<()> {
        validate_id_length(id_length)?;
        debug!(id_length, "Session id length changed");
        self.config.id_length = id_length;
        Ok(())
    }

    /// Generate a candidate id with the configured length.
    ///
    /// The id is not checked against active sessions; [`start`](Self::start)
    /// does that.
    pub fn generate_id(&self) -> String {
        id::generate_id(self.config.id_length)
    }

    /// Get the number of sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Check if an entry exists for `id`, whether or not it has expired.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains(id)
    }

    /// Start a session bound to `user` and return its id.
    ///
    /// Candidate ids are regenerated until one is not in use. Fails only when
    /// every id of the configured length is already taken.
    pub fn start(&mut self, user: U) -> Result<String> {
        let id_length = self.config.id_length;
        if let Some(space) = id::id_space(id_length)
            && self.sessions.len() as u128 >= space
            && self.count_with_id_length(id_length) as u128 >= space
        {
            return Err(Error::IdSpaceExhausted { id_length, space });
        }

        let mut id = self.generate_id();
        while self.sessions.contains(id.as_str()) {
            trace!("Session id collision, regenerating");
            id = self.generate_id();
        }

        let expires_at = self.config.lifetime.expiry_from(self.clock.now());
        let session = Session::new(id.clone(), expires_at, user);
        self.sessions.put(id.clone(), session);

        debug!(
            session_id = %redact(&id),
            sessions = self.sessions.len(),
            "Session started"
        );

        Ok(id)
    }

    /// Sessions whose ids were issued at `id_length`. Ids are ASCII, so the
    /// byte length is the character count.
    fn count_with_id_length(&self, id_length: usize) -> usize {
        self.sessions
            .iter()
            .filter(|(id, _)| id.len() == id_length)
            .count()
    }

    /// End a session. Returns whether a session was removed.
    pub fn end(&mut self, id: &str) -> bool {
        let removed = self.sessions.pop(id).is_some();
        if removed {
            debug!(
                session_id = %redact(id),
                sessions = self.sessions.len(),
                "Session ended"
            );
        }
        removed
    }

    /// Push a session's expiry to `now + lifetime`.
    ///
    /// Returns whether the session exists. With a `never` lifetime the
    /// timestamp is left alone but the renewal still reports success.
    /// Expired sessions are renewed too; only [`validate`](Self::validate)
    /// refuses them.
    pub fn renew(&mut self, id: &str) -> bool {
        let lifetime = self.config.lifetime;
        let now = self.clock.now();

        match self.sessions.peek_mut(id) {
            Some(session) => {
                if !lifetime.is_never() {
                    session.set_expires_at(lifetime.expiry_from(now));
                }
                trace!(session_id = %redact(id), "Session renewed");
                true
            }
            None => false,
        }
    }

    /// Check a session and return its user if still valid.
    ///
    /// A valid session is renewed as a side effect. An expired session is
    /// reported as missing but left in the registry.
    pub fn validate(&mut self, id: &str) -> Option<&U> {
        let lifetime = self.config.lifetime;
        let now = self.clock.now();

        let session = self.sessions.peek_mut(id)?;
        if !lifetime.is_never() && session.is_expired_at(now) {
            debug!(session_id = %redact(id), "Session expired");
            return None;
        }

        if !lifetime.is_never() {
            session.set_expires_at(lifetime.expiry_from(now));
        }
        trace!(session_id = %redact(id), "Session validated");
        Some(session.user())
    }

    /// The user bound to `id`, without renewing or checking expiry.
    pub fn get_user(&self, id: &str) -> Option<&U> {
        self.sessions.peek(id).map(Session::user)
    }

    /// Mutable access to the user bound to `id`. Does not renew.
    pub fn user_mut(&mut self, id: &str) -> Option<&mut U> {
        self.sessions.peek_mut(id).map(Session::user_mut)
    }

    /// Replace the user bound to `id`. Returns whether the session exists.
    pub fn update_user(&mut self, id: &str, user: U) -> bool {
        match self.sessions.peek_mut(id) {
            Some(session) => {
                session.set_user(user);
                trace!(session_id = %redact(id), "Session user updated");
                true
            }
            None => false,
        }
    }

    /// The full session record, without renewing or checking expiry.
    pub fn get(&self, id: &str) -> Option<&Session<U>> {
        self.sessions.peek(id)
    }

    /// Whether the session has expired, or `None` if it does not exist.
    ///
    /// While the lifetime is `never`, no session counts as expired.
    pub fn is_expired(&self, id: &str) -> Option<bool> {
        let now = self.clock.now();
        self.sessions.peek(id).map(|s| self.has_expired(s, now))
    }

    fn has_expired(&self, session: &Session<U>, now: DateTime<Utc>) -> bool {
        !self.config.lifetime.is_never() && session.is_expired_at(now)
    }

    /// Id of the first session, in insertion order, whose user equals `user`.
    ///
    /// Expired sessions are included.
    pub fn get_session_id(&self, user: &U) -> Option<&str>
    where
        U: PartialEq,
    {
        self.find_session_id(|candidate| candidate == user)
    }

    /// Id of the first session, in insertion order, whose user matches.
    ///
    /// Use this for identity comparisons such as `Arc::ptr_eq`.
    pub fn find_session_id<F>(&self, mut predicate: F) -> Option<&str>
    where
        F: FnMut(&U) -> bool,
    {
        self.get_all()
            .find(|session| predicate(session.user()))
            .map(Session::id)
    }

    /// All sessions in insertion order, expired ones included.
    pub fn get_all(&self) -> impl DoubleEndedIterator<Item = &Session<U>> + '_ {
        self.sessions.iter().rev().map(|(_, session)| session)
    }

    /// Remove every session.
    pub fn destroy_all(&mut self) {
        let count = self.sessions.len();
        self.sessions.clear();
        debug!(count, "All sessions destroyed");
    }

    /// Remove expired sessions and return how many were removed.
    ///
    /// Never called by the registry itself.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| self.has_expired(session, now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.sessions.pop(id.as_str());
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Purged expired sessions");
        }

        expired.len()
    }

    /// Get registry statistics.
    pub fn stats(&self) -> RegistryStats {
        let now = self.clock.now();
        RegistryStats {
            sessions: self.sessions.len(),
            expired: self
                .sessions
                .iter()
                .filter(|(_, session)| self.has_expired(session, now))
                .count(),
            lifetime: self.config.lifetime,
            id_length: self.config.id_length,
        }
    }

    /// Expiry of a session, without renewing.
    pub fn expires_at(&self, id: &str) -> Option<Expiry> {
        self.sessions.peek(id).map(Session::expires_at)
    }
}

/// Registry statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    /// Number of sessions held, expired ones included.
    pub sessions: usize,

    /// Number of held sessions whose expiry has passed.
    pub expired: usize,

    /// Lifetime applied by future starts and renewals.
    pub lifetime: Lifetime,

    /// Length of ids generated by future starts.
    pub id_length: usize,
}

/// Leading characters of an id, safe to put in logs.
pub(crate) fn redact(id: &str) -> &str {
    match id.char_indices().nth(6) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

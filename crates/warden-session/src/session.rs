//! Session records held by the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When a session stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// The session never expires.
    Never,
    /// The session is valid strictly before this instant.
    At(DateTime<Utc>),
}

impl Expiry {
    /// Whether the deadline has been reached at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(deadline) => *deadline <= now,
        }
    }

    /// The deadline, if the session can expire.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Never => None,
            Expiry::At(deadline) => Some(*deadline),
        }
    }

    /// Returns `true` for the "never expires" sentinel.
    pub fn is_never(&self) -> bool {
        matches!(self, Expiry::Never)
    }
}

/// A time-bounded binding between an opaque id and a user value.
///
/// Fields are read-only outside the registry; the id doubles as the
/// registry key and the expiry is only moved by starts and renewals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session<U> {
    id: String,
    expires_at: Expiry,
    user: U,
}

impl<U> Session<U> {
    pub(crate) fn new(id: String, expires_at: Expiry, user: U) -> Self {
        Self {
            id,
            expires_at,
            user,
        }
    }

    /// The session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session expires.
    pub fn expires_at(&self) -> Expiry {
        self.expires_at
    }

    /// The bound user value.
    pub fn user(&self) -> &U {
        &self.user
    }

    /// Whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_expired_at(now)
    }

    /// Consume the record, returning the bound user.
    pub fn into_user(self) -> U {
        self.user
    }

    pub(crate) fn user_mut(&mut self) -> &mut U {
        &mut self.user
    }

    pub(crate) fn set_user(&mut self, user: U) -> U {
        std::mem::replace(&mut self.user, user)
    }

    pub(crate) fn set_expires_at(&mut self, expires_at: Expiry) {
        self.expires_at = expires_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_never_does_not_expire() {
        let far_future = Utc::now() + TimeDelta::days(365 * 100);
        assert!(!Expiry::Never.is_expired_at(far_future));
        assert_eq!(Expiry::Never.deadline(), None);
    }

    #[test]
    fn test_expired_at_deadline() {
        let deadline = Utc::now();
        let expiry = Expiry::At(deadline);

        assert!(!expiry.is_expired_at(deadline - TimeDelta::milliseconds(1)));
        // Valid only while the deadline is strictly in the future
        assert!(expiry.is_expired_at(deadline));
        assert!(expiry.is_expired_at(deadline + TimeDelta::seconds(1)));
    }

    #[test]
    fn test_session_serializes_user() {
        let session = Session::new("abc".to_string(), Expiry::Never, "alice");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["expires_at"], "never");
        assert_eq!(json["user"], "alice");
    }
}

//! Configuration for the session registry.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{Error, Result};
use crate::session::Expiry;

/// Default number of characters in a generated session id.
pub const DEFAULT_ID_LENGTH: usize = 64;

/// Default session lifetime in minutes.
pub const DEFAULT_LIFETIME_MINUTES: u64 = 30;

/// Keyword accepted in place of a number of minutes for sessions that never expire.
pub const NEVER: &str = "never";

const MILLIS_PER_MINUTE: u128 = 60_000;

/// How long a session stays valid after it is started or renewed.
///
/// `Never` is a distinct variant rather than a very large duration, so an
/// actual long lifetime can never be mistaken for "no expiry".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Sessions never expire.
    Never,
    /// Sessions expire this long after their last start or renewal.
    Finite(Duration),
}

impl Default for Lifetime {
    fn default() -> Self {
        Lifetime::Finite(Duration::from_secs(DEFAULT_LIFETIME_MINUTES * 60))
    }
}

impl Lifetime {
    /// Build a lifetime from a (possibly fractional) number of minutes.
    ///
    /// The value is normalized to whole milliseconds. Zero, negative and
    /// non-finite inputs are rejected.
    pub fn from_minutes(minutes: f64) -> Result<Self> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "lifetime must be a positive number of minutes or \"{NEVER}\", got {minutes}"
            )));
        }

        let millis = (minutes * MILLIS_PER_MINUTE as f64).round();
        if millis < 1.0 || millis >= i64::MAX as f64 {
            return Err(Error::InvalidConfig(format!(
                "lifetime of {minutes} minutes is out of range"
            )));
        }

        Self::from_duration(Duration::from_millis(millis as u64))
    }

    /// Build a finite lifetime from a duration, rounded to the nearest
    /// millisecond and validated.
    pub fn from_duration(duration: Duration) -> Result<Self> {
        let millis = (duration.as_nanos() + 500_000) / 1_000_000;
        let millis = u64::try_from(millis).map_err(|_| {
            Error::InvalidConfig(format!("lifetime of {duration:?} is out of range"))
        })?;
        let lifetime = Lifetime::Finite(Duration::from_millis(millis));
        lifetime.validate()?;
        Ok(lifetime)
    }

    /// Check that a finite lifetime is non-zero and representable as a
    /// timestamp offset.
    pub fn validate(&self) -> Result<()> {
        match self {
            Lifetime::Never => Ok(()),
            Lifetime::Finite(d) if d.is_zero() => Err(Error::InvalidConfig(
                "lifetime must be greater than zero".to_string(),
            )),
            Lifetime::Finite(d) if d.subsec_nanos() % 1_000_000 != 0 => Err(
                Error::InvalidConfig(format!("lifetime of {d:?} is not whole milliseconds")),
            ),
            Lifetime::Finite(d) => TimeDelta::from_std(*d).map(|_| ()).map_err(|_| {
                Error::InvalidConfig(format!("lifetime of {d:?} is out of range"))
            }),
        }
    }

    /// Returns `true` for the "never expires" sentinel.
    pub fn is_never(&self) -> bool {
        matches!(self, Lifetime::Never)
    }

    /// The finite duration, if any.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Lifetime::Never => None,
            Lifetime::Finite(d) => Some(*d),
        }
    }

    /// Expiry for a session started or renewed at `now`.
    ///
    /// A deadline past the last representable timestamp can never be reached
    /// and is reported as [`Expiry::Never`].
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Expiry {
        match self {
            Lifetime::Never => Expiry::Never,
            Lifetime::Finite(d) => TimeDelta::from_std(*d)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta))
                .map_or(Expiry::Never, Expiry::At),
        }
    }

    fn whole_minutes(&self) -> Option<u64> {
        let millis = self.as_duration()?.as_millis();
        (millis % MILLIS_PER_MINUTE == 0).then(|| (millis / MILLIS_PER_MINUTE) as u64)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.whole_minutes()) {
            (Lifetime::Never, _) => f.write_str(NEVER),
            (_, Some(1)) => f.write_str("1 minute"),
            (_, Some(minutes)) => write!(f, "{minutes} minutes"),
            (Lifetime::Finite(d), None) => write!(f, "{} ms", d.as_millis()),
        }
    }
}

impl FromStr for Lifetime {
    type Err = Error;

    /// Parse `"never"` or a number of minutes.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NEVER) {
            return Ok(Lifetime::Never);
        }
        let minutes: f64 = s.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "lifetime must be a number of minutes or \"{NEVER}\", got {s:?}"
            ))
        })?;
        Lifetime::from_minutes(minutes)
    }
}

impl Serialize for Lifetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match (self, self.whole_minutes()) {
            (Lifetime::Never, _) => serializer.serialize_str(NEVER),
            (_, Some(minutes)) => serializer.serialize_u64(minutes),
            (Lifetime::Finite(d), None) => serializer.serialize_f64(d.as_secs_f64() / 60.0),
        }
    }
}

impl<'de> Deserialize<'de> for Lifetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Minutes(f64),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Minutes(minutes) => Lifetime::from_minutes(minutes).map_err(de::Error::custom),
            Raw::Keyword(keyword) => keyword.parse().map_err(de::Error::custom),
        }
    }
}

/// Construction-time configuration for a [`SessionRegistry`](crate::SessionRegistry).
///
/// ```toml
/// [session]
/// lifetime = 30      # minutes, or "never"
/// id_length = 64
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Lifetime applied by future starts and renewals.
    pub lifetime: Lifetime,

    /// Number of characters in generated session ids.
    pub id_length: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lifetime: Lifetime::default(),
            id_length: DEFAULT_ID_LENGTH,
        }
    }
}

impl RegistryConfig {
    /// Create a validated configuration.
    pub fn new(lifetime: Lifetime, id_length: usize) -> Result<Self> {
        let config = Self {
            lifetime,
            id_length,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the session lifetime.
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sessions never expire.
    pub fn never_expires(mut self) -> Self {
        self.lifetime = Lifetime::Never;
        self
    }

    /// Set the generated id length.
    pub fn with_id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length;
        self
    }

    /// Reject values that would produce unusable ids or lifetimes.
    pub fn validate(&self) -> Result<()> {
        validate_id_length(self.id_length)?;
        self.lifetime.validate()
    }
}

pub(crate) fn validate_id_length(id_length: usize) -> Result<()> {
    if id_length == 0 {
        return Err(Error::InvalidConfig(
            "id length must be a positive integer".to_string(),
        ));
    }
    if u32::try_from(id_length).is_err() {
        return Err(Error::InvalidConfig(format!(
            "id length {id_length} is too large"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.id_length, 64);
        assert_eq!(
            config.lifetime,
            Lifetime::Finite(Duration::from_secs(30 * 60))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minutes_normalized_to_millis() {
        let lifetime = Lifetime::from_minutes(1.5).unwrap();
        assert_eq!(lifetime.as_duration(), Some(Duration::from_millis(90_000)));
    }

    #[test]
    fn test_rejects_non_positive_minutes() {
        assert!(Lifetime::from_minutes(0.0).is_err());
        assert!(Lifetime::from_minutes(-5.0).is_err());
        assert!(Lifetime::from_minutes(f64::NAN).is_err());
        assert!(Lifetime::from_minutes(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rejects_zero_duration() {
        let err = Lifetime::from_duration(Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_from_duration_rounds_to_millis() {
        assert_eq!(
            Lifetime::from_duration(Duration::from_micros(1_499)).unwrap(),
            Lifetime::Finite(Duration::from_millis(1))
        );
        assert_eq!(
            Lifetime::from_duration(Duration::from_micros(2_500)).unwrap(),
            Lifetime::Finite(Duration::from_millis(3))
        );
        assert!(Lifetime::from_duration(Duration::from_micros(400)).is_err());
    }

    #[test]
    fn test_validate_rejects_sub_millisecond_lifetime() {
        let lifetime = Lifetime::Finite(Duration::from_nanos(90_000_000_001));
        assert!(lifetime.validate().is_err());
        assert!(RegistryConfig::default().with_lifetime(lifetime).validate().is_err());
    }

    #[test]
    fn test_rejects_zero_id_length() {
        let err = RegistryConfig::new(Lifetime::Never, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_lifetime() {
        assert_eq!("never".parse::<Lifetime>().unwrap(), Lifetime::Never);
        assert_eq!(" NEVER ".parse::<Lifetime>().unwrap(), Lifetime::Never);
        assert_eq!(
            "45".parse::<Lifetime>().unwrap(),
            Lifetime::Finite(Duration::from_secs(45 * 60))
        );
        assert!("soon".parse::<Lifetime>().is_err());
        assert!("0".parse::<Lifetime>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Lifetime::Never.to_string(), "never");
        assert_eq!(Lifetime::default().to_string(), "30 minutes");
        assert_eq!(Lifetime::from_minutes(1.0).unwrap().to_string(), "1 minute");
        assert_eq!(Lifetime::from_minutes(0.5).unwrap().to_string(), "30000 ms");
    }

    #[test]
    fn test_serde_minutes_and_never() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"lifetime": 10, "id_length": 32}"#).unwrap();
        assert_eq!(config.lifetime, Lifetime::from_minutes(10.0).unwrap());
        assert_eq!(config.id_length, 32);

        let config: RegistryConfig = serde_json::from_str(r#"{"lifetime": "never"}"#).unwrap();
        assert_eq!(config.lifetime, Lifetime::Never);
        assert_eq!(config.id_length, DEFAULT_ID_LENGTH);

        let json = serde_json::to_value(RegistryConfig::default()).unwrap();
        assert_eq!(json["lifetime"], 30);
    }

    #[test]
    fn test_serde_rejects_invalid_lifetime() {
        assert!(serde_json::from_str::<RegistryConfig>(r#"{"lifetime": -1}"#).is_err());
        assert!(serde_json::from_str::<RegistryConfig>(r#"{"lifetime": "forever"}"#).is_err());
    }

    #[test]
    fn test_expiry_from() {
        let now = Utc::now();
        assert_eq!(Lifetime::Never.expiry_from(now), Expiry::Never);

        let lifetime = Lifetime::from_minutes(30.0).unwrap();
        assert_eq!(
            lifetime.expiry_from(now),
            Expiry::At(now + TimeDelta::minutes(30))
        );
    }
}

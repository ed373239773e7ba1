//! In-process session registry with sliding expiration.
//!
//! This crate binds opaque, randomly generated session ids to
//! application-supplied user values:
//! - Collision-free ids drawn from a 92-character alphabet
//! - Sliding expiration, renewed on every successful validation
//! - Lazy eviction: expired sessions are only reported, never swept
//! - Reverse lookup from a user value back to its session id
//!
//! State lives in memory only and is lost when the process exits.
//!
//! # Example
//!
//! ```rust
//! use warden_session::{Lifetime, RegistryConfig, SessionRegistry};
//!
//! let config = RegistryConfig::new(Lifetime::from_minutes(30.0)?, 64)?;
//! let mut registry = SessionRegistry::new(config)?;
//!
//! let id = registry.start("alice")?;
//! assert_eq!(registry.validate(&id), Some(&"alice"));
//! assert!(registry.end(&id));
//! assert_eq!(registry.validate(&id), None);
//! # Ok::<(), warden_session::Error>(())
//! ```

mod clock;
mod config;
mod error;
mod id;
mod registry;
mod session;
mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_ID_LENGTH, DEFAULT_LIFETIME_MINUTES, Lifetime, NEVER, RegistryConfig};
pub use error::{Error, Result};
pub use id::{ALPHABET, generate_id, generate_id_with, id_space};
pub use registry::{RegistryStats, SessionRegistry};
pub use session::{Expiry, Session};
pub use shared::SharedRegistry;

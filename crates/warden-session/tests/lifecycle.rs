//! End-to-end session lifecycle scenarios against a manually driven clock.

use std::collections::HashMap;

use chrono::TimeDelta;
use warden_session::{Clock, Expiry, Lifetime, ManualClock, RegistryConfig, SessionRegistry};

type User = HashMap<String, String>;

fn user(name: &str) -> User {
    HashMap::from([("name".to_string(), name.to_string())])
}

fn registry(lifetime: Lifetime) -> (SessionRegistry<User, ManualClock>, ManualClock) {
    let clock = ManualClock::starting_now();
    let config = RegistryConfig::new(lifetime, 64).unwrap();
    let registry = SessionRegistry::with_clock(config, clock.clone()).unwrap();
    (registry, clock)
}

#[test]
fn start_validate_end() {
    let (mut registry, _) = registry(Lifetime::from_minutes(30.0).unwrap());

    let id = registry.start(user("alice")).unwrap();
    assert_eq!(registry.validate(&id), Some(&user("alice")));
    assert!(registry.end(&id));
    assert_eq!(registry.validate(&id), None);
}

#[test]
fn expiry_is_creation_plus_lifetime() {
    for minutes in [1.0, 30.0, 24.0 * 60.0] {
        let (mut registry, clock) = registry(Lifetime::from_minutes(minutes).unwrap());
        let created = clock.now();

        let id = registry.start(user("alice")).unwrap();
        assert!(registry.validate(&id).is_some());

        let expected = created + TimeDelta::milliseconds((minutes * 60_000.0) as i64);
        assert_eq!(registry.get(&id).unwrap().expires_at(), Expiry::At(expected));
    }
}

#[test]
fn never_lifetime_survives_ten_years() {
    let (mut registry, clock) = registry(Lifetime::from_minutes(30.0).unwrap());
    registry.set_lifetime(Lifetime::Never).unwrap();

    let id = registry.start(user("u")).unwrap();
    assert_eq!(registry.get(&id).unwrap().expires_at(), Expiry::Never);

    clock.advance(TimeDelta::days(3653));
    assert_eq!(registry.validate(&id), Some(&user("u")));
}

#[test]
fn reverse_lookup_follows_lifecycle() {
    let (mut registry, _) = registry(Lifetime::default());
    let u = user("bob");

    let id = registry.start(u.clone()).unwrap();
    assert_eq!(registry.get_session_id(&u), Some(id.as_str()));

    assert!(registry.end(&id));
    assert_eq!(registry.get_session_id(&u), None);
}

#[test]
fn sliding_window_and_lazy_eviction() {
    let (mut registry, clock) = registry(Lifetime::from_minutes(10.0).unwrap());
    let id = registry.start(user("carol")).unwrap();

    // t1 < expiresAt
    clock.advance(TimeDelta::minutes(9));
    assert!(registry.validate(&id).is_some());

    // expiresAt < t2 < t1 + L
    clock.advance(TimeDelta::minutes(5));
    assert!(registry.validate(&id).is_some());

    // Let it lapse
    clock.advance(TimeDelta::minutes(11));
    assert!(registry.validate(&id).is_none());
    assert_eq!(registry.get_user(&id), Some(&user("carol")));
    assert_eq!(registry.get_all().count(), 1);

    registry.destroy_all();
    assert!(registry.get_user(&id).is_none());
}

#[test]
fn end_returns_true_once_per_id() {
    let (mut registry, _) = registry(Lifetime::default());
    let ids: Vec<String> = (0..20)
        .map(|i| registry.start(user(&i.to_string())).unwrap())
        .collect();

    for id in &ids {
        assert!(registry.end(id));
    }
    for id in &ids {
        assert!(!registry.end(id));
    }
    assert!(registry.is_empty());
}

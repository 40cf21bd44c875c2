//! Detector tests against synthetic signal fixtures.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use coinwarden::models::fraud::{ActivityKind, Evidence};
use coinwarden::models::sessions::{GeoPoint, IpClass, Session};
use coinwarden::repositories::ip_reputation::{IpIntel, IpReputationResolver, ResolverError};
use coinwarden::repositories::memory::MemorySignalStore;
use coinwarden::repositories::signals::SignalStore;
use coinwarden::services::detectors;
use coinwarden::settings::RiskPolicy;

fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

struct CannedResolver {
    intel: IpIntel,
}

impl CannedResolver {
    fn with_class(class: IpClass) -> Self {
        CannedResolver {
            intel: IpIntel {
                class,
                country: Some("Netherlands".to_string()),
                region: None,
                city: None,
                coordinates: None,
                isp: Some("ExampleNet".to_string()),
            },
        }
    }
}

#[async_trait]
impl IpReputationResolver for CannedResolver {
    async fn resolve(&self, _ip_address: &str) -> Result<IpIntel, ResolverError> {
        Ok(self.intel.clone())
    }
}

struct FailingResolver;

#[async_trait]
impl IpReputationResolver for FailingResolver {
    async fn resolve(&self, _ip_address: &str) -> Result<IpIntel, ResolverError> {
        Err(ResolverError::Malformed("provider unavailable".to_string()))
    }
}

fn session_at(
    account_id: &str,
    device_id: &str,
    ip_address: &str,
    last_activity: DateTime<Utc>,
) -> Session {
    let mut session = Session::new(account_id, device_id, ip_address, None, last_activity);
    session.last_activity = last_activity;

    session
}

const PARIS: GeoPoint = GeoPoint {
    lat: 48.8566,
    lon: 2.3522,
};
const LONDON: GeoPoint = GeoPoint {
    lat: 51.5074,
    lon: -0.1278,
};
const MOSCOW: GeoPoint = GeoPoint {
    lat: 55.7558,
    lon: 37.6173,
};

#[tokio::test]
async fn suspicious_ip_flags_anonymizing_classes() {
    for class in [IpClass::Vpn, IpClass::Proxy, IpClass::Tor, IpClass::Datacenter] {
        let resolver = CannedResolver::with_class(class);
        let verdict = detectors::suspicious_ip(&resolver, "203.0.113.9").await;

        assert!(verdict.is_suspicious, "{:?} should be suspicious", class);
        assert!(matches!(
            verdict.evidence,
            Some(Evidence::IpClassification { .. })
        ));
    }
}

#[tokio::test]
async fn suspicious_ip_clear_for_residential() {
    let resolver = CannedResolver::with_class(IpClass::Residential);
    let verdict = detectors::suspicious_ip(&resolver, "198.51.100.7").await;

    assert!(!verdict.is_suspicious);
    assert!(verdict.evidence.is_none());
}

#[tokio::test]
async fn suspicious_ip_fails_open_on_lookup_error() {
    let verdict = detectors::suspicious_ip(&FailingResolver, "198.51.100.7").await;

    assert!(!verdict.is_suspicious);
    match verdict.evidence {
        Some(Evidence::LookupFailure { ip_address, .. }) => {
            assert_eq!(ip_address, "198.51.100.7");
        }
        other => panic!("expected lookup-failure evidence, got {:?}", other),
    }
}

#[tokio::test]
async fn multiple_accounts_flags_shared_device_within_window() {
    let signals = MemorySignalStore::new();
    signals
        .insert_session(&session_at(
            "other-account",
            "device-1",
            "203.0.113.5",
            test_now() - Duration::hours(2),
        ))
        .await
        .unwrap();

    let verdict = detectors::multiple_accounts(
        &signals,
        "account-under-review",
        "198.51.100.9",
        "device-1",
        test_now(),
        &RiskPolicy::default(),
    )
    .await
    .unwrap();

    assert!(verdict.is_suspicious);
    match verdict.evidence {
        Some(Evidence::SharedFingerprint {
            related_accounts, ..
        }) => {
            assert_eq!(related_accounts, vec!["other-account".to_string()]);
        }
        other => panic!("expected shared-fingerprint evidence, got {:?}", other),
    }
}

#[tokio::test]
async fn multiple_accounts_ignores_stale_and_own_sessions() {
    let signals = MemorySignalStore::new();
    // Same device but outside the 24h window.
    signals
        .insert_session(&session_at(
            "other-account",
            "device-1",
            "203.0.113.5",
            test_now() - Duration::hours(25),
        ))
        .await
        .unwrap();
    // The account's own session never counts.
    signals
        .insert_session(&session_at(
            "account-under-review",
            "device-1",
            "203.0.113.5",
            test_now() - Duration::hours(1),
        ))
        .await
        .unwrap();

    let verdict = detectors::multiple_accounts(
        &signals,
        "account-under-review",
        "203.0.113.5",
        "device-1",
        test_now(),
        &RiskPolicy::default(),
    )
    .await
    .unwrap();

    assert!(!verdict.is_suspicious);
}

#[test]
fn haversine_distance_is_plausible() {
    let distance = PARIS.distance_km(&LONDON);
    assert!((330.0..360.0).contains(&distance), "got {}", distance);
}

#[test]
fn geo_hopping_flags_impossible_travel() {
    let mut prior = session_at("a1", "device-1", "203.0.113.5", test_now() - Duration::minutes(10));
    prior.location.coordinates = Some(PARIS);

    let verdict = detectors::geo_hopping(
        Some(&prior),
        Some(MOSCOW),
        test_now(),
        &RiskPolicy::default(),
    );

    assert!(verdict.is_suspicious);
    match verdict.evidence {
        Some(Evidence::ImpossibleTravel {
            distance_km,
            elapsed_minutes,
            ..
        }) => {
            assert!(distance_km > 2000.0);
            assert_eq!(elapsed_minutes, 10);
        }
        other => panic!("expected impossible-travel evidence, got {:?}", other),
    }
}

#[test]
fn geo_hopping_allows_slow_travel() {
    let mut prior = session_at("a1", "device-1", "203.0.113.5", test_now() - Duration::hours(24));
    prior.location.coordinates = Some(PARIS);

    let verdict = detectors::geo_hopping(
        Some(&prior),
        Some(MOSCOW),
        test_now(),
        &RiskPolicy::default(),
    );

    assert!(!verdict.is_suspicious);
}

#[test]
fn geo_hopping_needs_a_prior_location() {
    let verdict =
        detectors::geo_hopping(None, Some(MOSCOW), test_now(), &RiskPolicy::default());
    assert!(!verdict.is_suspicious);

    // A prior session without coordinates gives no verdict either.
    let prior = session_at("a1", "device-1", "203.0.113.5", test_now() - Duration::minutes(5));
    let verdict = detectors::geo_hopping(
        Some(&prior),
        Some(MOSCOW),
        test_now(),
        &RiskPolicy::default(),
    );
    assert!(!verdict.is_suspicious);
}

#[test]
fn activity_rate_uses_per_type_thresholds() {
    let policy = RiskPolicy::default();

    let burst = detectors::activity_rate(&policy, ActivityKind::Vote, 150, 60);
    assert!(burst.is_suspicious);
    match burst.evidence {
        Some(Evidence::ActivityBurst { threshold, .. }) => assert_eq!(threshold, 100),
        other => panic!("expected activity-burst evidence, got {:?}", other),
    }

    // At the threshold is still within bounds.
    let at_threshold = detectors::activity_rate(&policy, ActivityKind::Vote, 100, 60);
    assert!(!at_threshold.is_suspicious);

    // Referrals have a much tighter threshold than views.
    assert!(detectors::activity_rate(&policy, ActivityKind::Referral, 11, 60).is_suspicious);
    assert!(!detectors::activity_rate(&policy, ActivityKind::View, 400, 60).is_suspicious);
}

#[tokio::test]
async fn self_referral_flags_shared_fingerprint() {
    let signals = MemorySignalStore::new();
    signals
        .insert_session(&session_at(
            "referrer",
            "device-9",
            "203.0.113.5",
            test_now() - Duration::days(3),
        ))
        .await
        .unwrap();

    let shared = detectors::self_referral(&signals, "referrer", "198.51.100.2", "device-9")
        .await
        .unwrap();
    assert!(shared.is_suspicious);

    let unrelated = detectors::self_referral(&signals, "referrer", "198.51.100.2", "device-7")
        .await
        .unwrap();
    assert!(!unrelated.is_suspicious);
}

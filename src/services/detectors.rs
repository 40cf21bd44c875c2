//! Fraud detectors. Each one inspects current signals plus a lookback
//! window and returns a verdict; none of them mutates ledger or risk state.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::fraud::{ActivityKind, Evidence};
use crate::models::sessions::{GeoPoint, IpClass, Session};
use crate::repositories::ip_reputation::{IpIntel, IpReputationResolver, ResolverError};
use crate::repositories::signals::SignalStore;
use crate::repositories::StoreError;
use crate::settings::RiskPolicy;

#[derive(Clone, Debug, Serialize)]
pub struct Verdict {
    pub is_suspicious: bool,
    pub reason: Option<String>,
    pub evidence: Option<Evidence>,
}

impl Verdict {
    pub fn clear() -> Self {
        Verdict {
            is_suspicious: false,
            reason: None,
            evidence: None,
        }
    }

    fn flag(reason: String, evidence: Evidence) -> Self {
        Verdict {
            is_suspicious: true,
            reason: Some(reason),
            evidence: Some(evidence),
        }
    }
}

/// Builds the suspicious-IP verdict from a lookup outcome. A failed lookup
/// is not a signal against the user: the verdict stays clear and only
/// records the failure as evidence (fail-open).
pub fn ip_verdict(ip_address: &str, lookup: Result<&IpIntel, &ResolverError>) -> Verdict {
    let intel = match lookup {
        Ok(intel) => intel,
        Err(e) => {
            return Verdict {
                is_suspicious: false,
                reason: None,
                evidence: Some(Evidence::LookupFailure {
                    ip_address: ip_address.to_string(),
                    error: e.to_string(),
                }),
            }
        }
    };

    let reason = match intel.class {
        IpClass::Vpn => "VPN detected",
        IpClass::Proxy => "Proxy detected",
        IpClass::Tor => "Tor network detected",
        IpClass::Datacenter => "Datacenter IP detected",
        IpClass::Residential | IpClass::Unknown => return Verdict::clear(),
    };

    Verdict::flag(
        reason.to_string(),
        Evidence::IpClassification {
            ip_address: ip_address.to_string(),
            class: intel.class,
            isp: intel.isp.clone(),
        },
    )
}

pub async fn suspicious_ip(resolver: &dyn IpReputationResolver, ip_address: &str) -> Verdict {
    let lookup = resolver.resolve(ip_address).await;

    if let Err(e) = &lookup {
        log::warn!("IP reputation lookup failed for {}: {}", ip_address, e);
    }

    ip_verdict(ip_address, lookup.as_ref())
}

/// Other accounts seen on the same IP or device within the lookback window.
pub async fn multiple_accounts(
    signals: &dyn SignalStore,
    account_id: &str,
    ip_address: &str,
    device_id: &str,
    now: DateTime<Utc>,
    policy: &RiskPolicy,
) -> Result<Verdict, StoreError> {
    let since = now - Duration::hours(policy.multi_account_window_hours);
    let sessions = signals
        .sessions_matching(ip_address, device_id, account_id, since)
        .await?;

    let mut related: Vec<String> = sessions.iter().map(|s| s.account_id.clone()).collect();
    related.sort_unstable();
    related.dedup();

    if related.is_empty() {
        return Ok(Verdict::clear());
    }

    Ok(Verdict::flag(
        format!(
            "{} other account(s) detected from same IP/device",
            related.len()
        ),
        Evidence::SharedFingerprint {
            related_accounts: related,
            ip_address: ip_address.to_string(),
            device_id: device_id.to_string(),
        },
    ))
}

/// Impossible travel between the last located session and the new location.
/// No verdict without a prior location.
pub fn geo_hopping(
    prior: Option<&Session>,
    new_location: Option<GeoPoint>,
    now: DateTime<Utc>,
    policy: &RiskPolicy,
) -> Verdict {
    let (prior, to) = match (prior, new_location) {
        (Some(prior), Some(to)) => (prior, to),
        _ => return Verdict::clear(),
    };
    let from = match prior.coordinates() {
        Some(from) => from,
        None => return Verdict::clear(),
    };

    let elapsed = now - prior.last_activity;
    let elapsed_hours = (elapsed.num_seconds().max(0) as f64) / 3600.0;
    let distance_km = from.distance_km(&to);

    if elapsed_hours < policy.geo_window_hours
        && distance_km > policy.geo_max_speed_kmh * elapsed_hours
    {
        let elapsed_minutes = elapsed.num_minutes().max(0);
        return Verdict::flag(
            format!(
                "Traveled {:.0}km in {} minute(s)",
                distance_km, elapsed_minutes
            ),
            Evidence::ImpossibleTravel {
                from,
                to,
                distance_km,
                elapsed_minutes,
            },
        );
    }

    Verdict::clear()
}

/// Per-type activity threshold over the observation window.
pub fn activity_rate(
    policy: &RiskPolicy,
    kind: ActivityKind,
    count: i64,
    window_minutes: i64,
) -> Verdict {
    let threshold = policy.activity_thresholds.for_kind(kind);

    if count <= threshold {
        return Verdict::clear();
    }

    Verdict::flag(
        format!(
            "Abnormal {} activity: {} in {} minute(s) (threshold: {})",
            kind.as_str(),
            count,
            window_minutes,
            threshold
        ),
        Evidence::ActivityBurst {
            activity: kind,
            count,
            threshold,
            window_minutes,
        },
    )
}

/// Referrer and freshly referred account sharing an IP or device id.
pub async fn self_referral(
    signals: &dyn SignalStore,
    referrer_id: &str,
    ip_address: &str,
    device_id: &str,
) -> Result<Verdict, StoreError> {
    let shared = signals
        .shares_fingerprint(referrer_id, ip_address, device_id)
        .await?;

    if !shared {
        return Ok(Verdict::clear());
    }

    Ok(Verdict::flag(
        "Referrer and new user share same IP/device (possible self-referral)".to_string(),
        Evidence::SharedFingerprint {
            related_accounts: vec![referrer_id.to_string()],
            ip_address: ip_address.to_string(),
            device_id: device_id.to_string(),
        },
    ))
}

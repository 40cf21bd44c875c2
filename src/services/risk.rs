use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::detectors::{self, Verdict};
use super::events::EventPublisher;
use super::notifications::{Notification, NotificationKind};
use super::{RequestHandler, Service};
use crate::models::accounts::{Account, AccountStatus};
use crate::models::events::DomainEvent;
use crate::models::fraud::{
    ActivityKind, AutomatedAction, DetectionMethod, Evidence, FraudIncident, FraudType,
    ReviewStatus, Severity,
};
use crate::models::sessions::{GeoLocation, Session};
use crate::models::transactions::TransactionType;
use crate::repositories::ip_reputation::IpReputationResolver;
use crate::repositories::ledger::LedgerStore;
use crate::repositories::signals::SignalStore;
use crate::repositories::{CommitOutcome, StoreError};
use crate::settings::RiskPolicy;

const COMMIT_RETRY_LIMIT: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("account not found")]
    AccountNotFound,
    #[error("incident not found")]
    IncidentNotFound,
    #[error("account is being updated concurrently, try again")]
    Contention,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, Serialize)]
pub struct RiskProfile {
    pub account_id: String,
    pub risk_score: i16,
    pub account_status: AccountStatus,
    pub coins_frozen: bool,
    pub incidents: Vec<FraudIncident>,
    pub anonymizing_sessions: i64,
    pub distinct_devices: i64,
}

pub enum RiskRequest {
    RecordLogin {
        account_id: String,
        device_id: String,
        ip_address: String,
        user_agent: Option<String>,
        response: oneshot::Sender<Result<Session, RiskError>>,
    },
    ReportIncident {
        account_id: String,
        fraud_type: FraudType,
        severity: Severity,
        description: String,
        evidence: Option<Evidence>,
        detection: DetectionMethod,
        response: oneshot::Sender<Result<Option<FraudIncident>, RiskError>>,
    },
    ReviewIncident {
        incident_id: String,
        reviewer_id: String,
        status: ReviewStatus,
        notes: Option<String>,
        action: Option<AutomatedAction>,
        response: oneshot::Sender<Result<FraudIncident, RiskError>>,
    },
    CheckReferral {
        referrer_id: String,
        new_account_id: String,
        ip_address: String,
        device_id: String,
        response: oneshot::Sender<Result<Verdict, RiskError>>,
    },
    NoteActivity {
        account_id: String,
        kind: ActivityKind,
        count: Option<i64>,
        response: oneshot::Sender<Result<Verdict, RiskError>>,
    },
    GetRiskProfile {
        account_id: String,
        response: oneshot::Sender<Result<RiskProfile, RiskError>>,
    },
}

/// Severity-weighted score over the trailing incident window, plus session
/// penalties, clamped to 0..=100. Recomputed from the incident log on
/// demand; the log is the source of truth.
pub fn compute_risk_score(
    policy: &RiskPolicy,
    incidents: &[FraudIncident],
    anonymizing_sessions: i64,
    distinct_devices: i64,
) -> i16 {
    let mut score: i64 = 0;

    for incident in incidents {
        score += policy.severity_weight(incident.severity) as i64;
    }

    score += anonymizing_sessions * policy.anonymizing_session_penalty as i64;

    if distinct_devices > policy.device_allowance {
        score += (distinct_devices - policy.device_allowance) * policy.device_penalty as i64;
    }

    score.clamp(0, 100) as i16
}

/// Applies an automated action to the account state. Actions only escalate;
/// re-applying the current state is a no-op. Returns whether anything
/// changed.
pub fn apply_action(account: &mut Account, action: AutomatedAction, reason: &str) -> bool {
    match action {
        AutomatedAction::None | AutomatedAction::Warning | AutomatedAction::ShadowBan => false,
        AutomatedAction::RateLimit => {
            if account.account_status >= AccountStatus::RateLimited {
                return false;
            }
            account.account_status = AccountStatus::RateLimited;
            true
        }
        AutomatedAction::FreezeCoins => {
            if account.coins_frozen || account.account_status >= AccountStatus::CoinsFrozen {
                return false;
            }
            account.coins_frozen = true;
            account.freeze_reason = Some(reason.to_string());
            account.account_status = AccountStatus::CoinsFrozen;
            true
        }
        AutomatedAction::Suspend => {
            if account.account_status >= AccountStatus::Suspended {
                return false;
            }
            account.account_status = AccountStatus::Suspended;
            account.is_banned = true;
            account.ban_reason = Some(reason.to_string());
            true
        }
        AutomatedAction::Ban => {
            if account.account_status >= AccountStatus::Banned {
                return false;
            }
            account.account_status = AccountStatus::Banned;
            account.is_banned = true;
            account.ban_reason = Some(reason.to_string());
            true
        }
    }
}

fn activity_transaction_type(kind: ActivityKind) -> Option<TransactionType> {
    match kind {
        ActivityKind::Vote => Some(TransactionType::VoteCast),
        ActivityKind::View => Some(TransactionType::ViewReward),
        ActivityKind::Upload => Some(TransactionType::UploadReward),
        ActivityKind::AdWatch => Some(TransactionType::AdWatch),
        ActivityKind::Referral => Some(TransactionType::Referral),
        ActivityKind::Like | ActivityKind::Comment => None,
    }
}

#[derive(Clone)]
pub struct RiskRequestHandler {
    ledger: Arc<dyn LedgerStore>,
    signals: Arc<dyn SignalStore>,
    resolver: Arc<dyn IpReputationResolver>,
    events: EventPublisher,
    notifications: mpsc::Sender<Notification>,
    policy: Arc<RiskPolicy>,
}

impl RiskRequestHandler {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        signals: Arc<dyn SignalStore>,
        resolver: Arc<dyn IpReputationResolver>,
        events: EventPublisher,
        notifications: mpsc::Sender<Notification>,
        policy: Arc<RiskPolicy>,
    ) -> Self {
        RiskRequestHandler {
            ledger,
            signals,
            resolver,
            events,
            notifications,
            policy,
        }
    }

    /// Ingests a login: classifies the IP (fail-open), runs the login
    /// detectors against the stored signals, persists the session and logs
    /// an incident per suspicious verdict.
    pub async fn record_login(
        &self,
        account_id: &str,
        device_id: &str,
        ip_address: &str,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Session, RiskError> {
        self.ledger
            .fetch_account(account_id)
            .await?
            .ok_or(RiskError::AccountNotFound)?;

        let lookup = self.resolver.resolve(ip_address).await;
        if let Err(e) = &lookup {
            log::warn!("IP reputation lookup failed for {}: {}", ip_address, e);
        }
        let ip_verdict = detectors::ip_verdict(ip_address, lookup.as_ref());

        let mut session = Session::new(account_id, device_id, ip_address, user_agent, now);
        if let Ok(intel) = &lookup {
            session.ip_class = intel.class;
            session.isp = intel.isp.clone();
            session.location = GeoLocation {
                country: intel.country.clone(),
                region: intel.region.clone(),
                city: intel.city.clone(),
                coordinates: intel.coordinates,
            };
        }

        // The prior session must be read before this login is stored.
        let prior = self.signals.latest_located_session(account_id).await?;
        let geo_verdict =
            detectors::geo_hopping(prior.as_ref(), session.coordinates(), now, &self.policy);
        let multi_verdict = detectors::multiple_accounts(
            self.signals.as_ref(),
            account_id,
            ip_address,
            device_id,
            now,
            &self.policy,
        )
        .await?;

        for verdict in [&ip_verdict, &geo_verdict, &multi_verdict] {
            if verdict.is_suspicious {
                session.is_suspicious = true;
                if let Some(reason) = &verdict.reason {
                    session.suspicious_reasons.push(reason.clone());
                }
            }
        }

        self.signals.insert_session(&session).await?;

        let findings = [
            (ip_verdict, FraudType::VpnDetected, self.policy.vpn_severity),
            (
                geo_verdict,
                FraudType::GeoHopping,
                self.policy.geo_hopping_severity,
            ),
            (
                multi_verdict,
                FraudType::MultipleAccounts,
                self.policy.multi_account_severity,
            ),
        ];

        for (verdict, fraud_type, severity) in findings {
            if !verdict.is_suspicious {
                continue;
            }

            self.log_incident(
                account_id,
                fraud_type,
                severity,
                verdict
                    .reason
                    .unwrap_or_else(|| fraud_type.as_str().to_string()),
                verdict.evidence,
                Some(ip_address.to_string()),
                Some(device_id.to_string()),
                DetectionMethod::Automatic,
                now,
            )
            .await?;
        }

        Ok(session)
    }

    /// Creates an incident, refreshes the account's risk score and applies
    /// the severity-mapped automated action. Returns `None` when an
    /// incident of the same type was already logged inside the dedup
    /// window.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_incident(
        &self,
        account_id: &str,
        fraud_type: FraudType,
        severity: Severity,
        description: String,
        evidence: Option<Evidence>,
        ip_address: Option<String>,
        device_id: Option<String>,
        detection: DetectionMethod,
        now: DateTime<Utc>,
    ) -> Result<Option<FraudIncident>, RiskError> {
        let dedup_since = now - Duration::minutes(self.policy.incident_dedup_minutes);
        if self
            .signals
            .recent_incident_exists(account_id, fraud_type, dedup_since)
            .await?
        {
            log::debug!(
                "Duplicate {} incident suppressed for {}",
                fraud_type.as_str(),
                account_id
            );
            return Ok(None);
        }

        let action = self.policy.action_for(severity);
        let incident = FraudIncident {
            id: Uuid::new_v4().hyphenated().to_string(),
            account_id: account_id.to_string(),
            fraud_type,
            severity,
            description,
            evidence,
            ip_address,
            device_id,
            action_taken: action,
            action_details: None,
            status: ReviewStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            risk_contribution: self.policy.severity_weight(severity).clamp(0, 100) as i16,
            detection,
            created_at: now,
        };

        self.signals.insert_incident(&incident).await?;

        self.events.publish(DomainEvent::FraudIncidentCreated {
            account_id: account_id.to_string(),
            incident_id: incident.id.clone(),
            fraud_type,
            severity,
        });

        self.refresh_account_state(account_id, action, fraud_type, now)
            .await?;

        Ok(Some(incident))
    }

    /// Recomputes the risk score from the incident log and applies the
    /// action under the account's versioned update, so the score and the
    /// status transition land atomically per account.
    async fn refresh_account_state(
        &self,
        account_id: &str,
        action: AutomatedAction,
        fraud_type: FraudType,
        now: DateTime<Utc>,
    ) -> Result<(), RiskError> {
        let score = self.current_risk_score(account_id, now).await?;
        let reason = format!("Fraud detected: {}", fraud_type.as_str());

        for _ in 0..COMMIT_RETRY_LIMIT {
            let mut account = self
                .ledger
                .fetch_account(account_id)
                .await?
                .ok_or(RiskError::AccountNotFound)?;

            account.risk_score = score;
            let changed = apply_action(&mut account, action, &reason);

            let expected = account.version;
            account.version += 1;

            match self.ledger.update_account(&account, expected).await? {
                CommitOutcome::Committed => {
                    if changed {
                        log::info!(
                            "Applied {} to account {} ({})",
                            action.as_str(),
                            account_id,
                            reason
                        );
                        self.events.publish(DomainEvent::AccountActioned {
                            account_id: account_id.to_string(),
                            action,
                            reason: reason.clone(),
                        });
                        self.notify_action(account_id, action);
                    }
                    return Ok(());
                }
                CommitOutcome::Conflict => continue,
            }
        }

        Err(RiskError::Contention)
    }

    pub async fn current_risk_score(
        &self,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<i16, RiskError> {
        let since = now - Duration::days(self.policy.incident_window_days);
        let incidents = self.signals.incidents_since(account_id, since).await?;
        let anonymizing = self.signals.anonymizing_session_count(account_id).await?;
        let devices = self.signals.distinct_device_count(account_id).await?;

        Ok(compute_risk_score(
            &self.policy,
            &incidents,
            anonymizing,
            devices,
        ))
    }

    fn notify_action(&self, account_id: &str, action: AutomatedAction) {
        let (kind, message) = match action {
            AutomatedAction::FreezeCoins => (
                NotificationKind::CoinsFrozen,
                "Your coins have been frozen pending review.",
            ),
            AutomatedAction::Suspend => (
                NotificationKind::AccountSuspended,
                "Your account has been suspended.",
            ),
            AutomatedAction::Ban => (
                NotificationKind::AccountBanned,
                "Your account has been banned.",
            ),
            _ => return,
        };

        let notification = Notification {
            account_id: account_id.to_string(),
            kind,
            message: message.to_string(),
        };

        if let Err(e) = self.notifications.try_send(notification) {
            log::warn!("Notification delivery failed for {}: {}", account_id, e);
        }
    }

    /// Human review step. A confirmed incident may escalate the applied
    /// action; a false positive is recorded but never auto-reverts account
    /// state.
    pub async fn review_incident(
        &self,
        incident_id: &str,
        reviewer_id: &str,
        status: ReviewStatus,
        notes: Option<String>,
        action: Option<AutomatedAction>,
        now: DateTime<Utc>,
    ) -> Result<FraudIncident, RiskError> {
        let mut incident = self
            .signals
            .fetch_incident(incident_id)
            .await?
            .ok_or(RiskError::IncidentNotFound)?;

        incident.status = status;
        incident.reviewed_by = Some(reviewer_id.to_string());
        incident.reviewed_at = Some(now);
        incident.review_notes = notes;
        if let Some(action) = action {
            incident.action_taken = action;
        }

        match status {
            ReviewStatus::Confirmed => {
                incident.action_details =
                    Some(format!("Confirmed by reviewer: {}", incident.action_taken.as_str()));
                self.signals.update_incident_review(&incident).await?;
                self.refresh_account_state(
                    &incident.account_id,
                    incident.action_taken,
                    incident.fraud_type,
                    now,
                )
                .await?;
            }
            ReviewStatus::FalsePositive => {
                self.signals.update_incident_review(&incident).await?;
                log::info!(
                    "Incident {} marked false positive; applied actions require administrative rollback",
                    incident.id
                );
            }
            _ => {
                self.signals.update_incident_review(&incident).await?;
            }
        }

        Ok(incident)
    }

    /// Self-referral screening when a referral reward is claimed.
    pub async fn check_referral(
        &self,
        referrer_id: &str,
        new_account_id: &str,
        ip_address: &str,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Verdict, RiskError> {
        let verdict =
            detectors::self_referral(self.signals.as_ref(), referrer_id, ip_address, device_id)
                .await?;

        if verdict.is_suspicious {
            self.log_incident(
                referrer_id,
                FraudType::SelfReferral,
                self.policy.self_referral_severity,
                format!(
                    "Referral of {} shares the referrer's IP/device",
                    new_account_id
                ),
                verdict.evidence.clone(),
                Some(ip_address.to_string()),
                Some(device_id.to_string()),
                DetectionMethod::Automatic,
                now,
            )
            .await?;
        }

        Ok(verdict)
    }

    /// Activity-rate screening. With no caller-supplied count, the recent
    /// ledger activity of the matching transaction type is counted.
    pub async fn note_activity(
        &self,
        account_id: &str,
        kind: ActivityKind,
        count: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Verdict, RiskError> {
        let window_minutes = self.policy.activity_window_minutes;

        let count = match count {
            Some(count) => count,
            None => match activity_transaction_type(kind) {
                Some(tx_type) => {
                    self.ledger
                        .transaction_count_since(
                            account_id,
                            tx_type,
                            now - Duration::minutes(window_minutes),
                        )
                        .await?
                }
                None => return Ok(Verdict::clear()),
            },
        };

        let verdict = detectors::activity_rate(&self.policy, kind, count, window_minutes);

        if verdict.is_suspicious {
            self.log_incident(
                account_id,
                FraudType::RapidActions,
                self.policy.rapid_activity_severity,
                verdict
                    .reason
                    .clone()
                    .unwrap_or_else(|| "rapid actions".to_string()),
                verdict.evidence.clone(),
                None,
                None,
                DetectionMethod::Automatic,
                now,
            )
            .await?;
        }

        Ok(verdict)
    }

    /// Read-only aggregation for the review surface.
    pub async fn risk_profile(
        &self,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RiskProfile, RiskError> {
        let account = self
            .ledger
            .fetch_account(account_id)
            .await?
            .ok_or(RiskError::AccountNotFound)?;

        let since = now - Duration::days(self.policy.incident_window_days);
        let incidents = self.signals.incidents_since(account_id, since).await?;
        let anonymizing = self.signals.anonymizing_session_count(account_id).await?;
        let devices = self.signals.distinct_device_count(account_id).await?;

        Ok(RiskProfile {
            account_id: account.id,
            risk_score: compute_risk_score(&self.policy, &incidents, anonymizing, devices),
            account_status: account.account_status,
            coins_frozen: account.coins_frozen,
            incidents,
            anonymizing_sessions: anonymizing,
            distinct_devices: devices,
        })
    }
}

#[async_trait]
impl RequestHandler<RiskRequest> for RiskRequestHandler {
    async fn handle_request(&self, request: RiskRequest) {
        let now = Utc::now();

        match request {
            RiskRequest::RecordLogin {
                account_id,
                device_id,
                ip_address,
                user_agent,
                response,
            } => {
                let result = self
                    .record_login(&account_id, &device_id, &ip_address, user_agent, now)
                    .await;
                let _ = response.send(result);
            }
            RiskRequest::ReportIncident {
                account_id,
                fraud_type,
                severity,
                description,
                evidence,
                detection,
                response,
            } => {
                let result = self
                    .log_incident(
                        &account_id,
                        fraud_type,
                        severity,
                        description,
                        evidence,
                        None,
                        None,
                        detection,
                        now,
                    )
                    .await;
                let _ = response.send(result);
            }
            RiskRequest::ReviewIncident {
                incident_id,
                reviewer_id,
                status,
                notes,
                action,
                response,
            } => {
                let result = self
                    .review_incident(&incident_id, &reviewer_id, status, notes, action, now)
                    .await;
                let _ = response.send(result);
            }
            RiskRequest::CheckReferral {
                referrer_id,
                new_account_id,
                ip_address,
                device_id,
                response,
            } => {
                let result = self
                    .check_referral(&referrer_id, &new_account_id, &ip_address, &device_id, now)
                    .await;
                let _ = response.send(result);
            }
            RiskRequest::NoteActivity {
                account_id,
                kind,
                count,
                response,
            } => {
                let result = self.note_activity(&account_id, kind, count, now).await;
                let _ = response.send(result);
            }
            RiskRequest::GetRiskProfile {
                account_id,
                response,
            } => {
                let result = self.risk_profile(&account_id, now).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct RiskService;

impl RiskService {
    pub fn new() -> Self {
        RiskService {}
    }
}

#[async_trait]
impl Service<RiskRequest, RiskRequestHandler> for RiskService {}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sessions::{GeoPoint, IpClass};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudType {
    MultipleAccounts,
    VpnDetected,
    SuspiciousVoting,
    FakeEngagement,
    GeoHopping,
    AbnormalReferrals,
    BotActivity,
    SelfReferral,
    RapidActions,
    Other,
}

impl FraudType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudType::MultipleAccounts => "multiple_accounts",
            FraudType::VpnDetected => "vpn_detected",
            FraudType::SuspiciousVoting => "suspicious_voting",
            FraudType::FakeEngagement => "fake_engagement",
            FraudType::GeoHopping => "geo_hopping",
            FraudType::AbnormalReferrals => "abnormal_referrals",
            FraudType::BotActivity => "bot_activity",
            FraudType::SelfReferral => "self_referral",
            FraudType::RapidActions => "rapid_actions",
            FraudType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "multiple_accounts" => Some(FraudType::MultipleAccounts),
            "vpn_detected" => Some(FraudType::VpnDetected),
            "suspicious_voting" => Some(FraudType::SuspiciousVoting),
            "fake_engagement" => Some(FraudType::FakeEngagement),
            "geo_hopping" => Some(FraudType::GeoHopping),
            "abnormal_referrals" => Some(FraudType::AbnormalReferrals),
            "bot_activity" => Some(FraudType::BotActivity),
            "self_referral" => Some(FraudType::SelfReferral),
            "rapid_actions" => Some(FraudType::RapidActions),
            "other" => Some(FraudType::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomatedAction {
    None,
    Warning,
    RateLimit,
    FreezeCoins,
    ShadowBan,
    Suspend,
    Ban,
}

impl AutomatedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomatedAction::None => "none",
            AutomatedAction::Warning => "warning",
            AutomatedAction::RateLimit => "rate_limit",
            AutomatedAction::FreezeCoins => "freeze_coins",
            AutomatedAction::ShadowBan => "shadow_ban",
            AutomatedAction::Suspend => "suspend",
            AutomatedAction::Ban => "ban",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(AutomatedAction::None),
            "warning" => Some(AutomatedAction::Warning),
            "rate_limit" => Some(AutomatedAction::RateLimit),
            "freeze_coins" => Some(AutomatedAction::FreezeCoins),
            "shadow_ban" => Some(AutomatedAction::ShadowBan),
            "suspend" => Some(AutomatedAction::Suspend),
            "ban" => Some(AutomatedAction::Ban),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Reviewed,
    FalsePositive,
    Confirmed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Reviewed => "reviewed",
            ReviewStatus::FalsePositive => "false_positive",
            ReviewStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "reviewed" => Some(ReviewStatus::Reviewed),
            "false_positive" => Some(ReviewStatus::FalsePositive),
            "confirmed" => Some(ReviewStatus::Confirmed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Automatic,
    Manual,
    UserReport,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Automatic => "automatic",
            DetectionMethod::Manual => "manual",
            DetectionMethod::UserReport => "user_report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "automatic" => Some(DetectionMethod::Automatic),
            "manual" => Some(DetectionMethod::Manual),
            "user_report" => Some(DetectionMethod::UserReport),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Vote,
    View,
    Upload,
    AdWatch,
    Referral,
    Like,
    Comment,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Vote => "vote",
            ActivityKind::View => "view",
            ActivityKind::Upload => "upload",
            ActivityKind::AdWatch => "ad_watch",
            ActivityKind::Referral => "referral",
            ActivityKind::Like => "like",
            ActivityKind::Comment => "comment",
        }
    }
}

/// Structured evidence attached to an incident. Known shapes are typed; the
/// opaque variant covers genuinely unstructured reports.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    SharedFingerprint {
        related_accounts: Vec<String>,
        ip_address: String,
        device_id: String,
    },
    IpClassification {
        ip_address: String,
        class: IpClass,
        isp: Option<String>,
    },
    ImpossibleTravel {
        from: GeoPoint,
        to: GeoPoint,
        distance_km: f64,
        elapsed_minutes: i64,
    },
    ActivityBurst {
        activity: ActivityKind,
        count: i64,
        threshold: i64,
        window_minutes: i64,
    },
    LookupFailure {
        ip_address: String,
        error: String,
    },
    Opaque {
        data: serde_json::Value,
    },
}

/// Audit-trail record of a detected or reported anomaly. Never deleted;
/// only the review fields change after creation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FraudIncident {
    pub id: String,
    pub account_id: String,
    pub fraud_type: FraudType,
    pub severity: Severity,
    pub description: String,
    pub evidence: Option<Evidence>,
    pub ip_address: Option<String>,
    pub device_id: Option<String>,
    pub action_taken: AutomatedAction,
    pub action_details: Option<String>,
    pub status: ReviewStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub risk_contribution: i16,
    pub detection: DetectionMethod,
    pub created_at: DateTime<Utc>,
}

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::models::accounts::SubscriptionTier;
use crate::models::fraud::{ActivityKind, AutomatedAction, Severity};

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Http {
    pub bind: String,
}

impl Default for Http {
    fn default() -> Self {
        Http {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IpReputation {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for IpReputation {
    fn default() -> Self {
        IpReputation {
            url: "https://ipapi.co".to_string(),
            timeout_ms: 1500,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpinReward {
    pub coins: i64,
    pub weight: u32,
}

/// Reward amounts and caps. All business policy values live here so they can
/// be tuned per deployment without code changes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    pub welcome_bonus_coins: i64,
    pub referral_coins: i64,

    pub upload_reward_coins: i64,
    pub upload_bonus_coins: i64,
    pub max_upload_posts: i64,
    pub upload_bonus_window_days: i64,
    pub reward_earning_ceiling: i64,

    pub view_threshold: i64,
    pub view_reward_per_threshold: i64,
    pub daily_view_coin_cap: i64,
    pub monthly_view_coin_cap: i64,

    pub ad_watch_coins: i64,
    pub ad_daily_limit_free: i64,
    pub ad_daily_limit_basic: i64,
    pub ad_daily_limit_pro: i64,
    pub ad_daily_limit_vip: i64,
    pub ad_burst_length: i64,
    pub ad_cooldown_minutes: i64,

    pub spin_rewards: Vec<SpinReward>,

    pub commit_retry_limit: u32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        RewardPolicy {
            welcome_bonus_coins: 100,
            referral_coins: 100,
            upload_reward_coins: 50,
            upload_bonus_coins: 200,
            max_upload_posts: 10,
            upload_bonus_window_days: 7,
            reward_earning_ceiling: 5000,
            view_threshold: 1000,
            view_reward_per_threshold: 10,
            daily_view_coin_cap: 200,
            monthly_view_coin_cap: 2000,
            ad_watch_coins: 10,
            ad_daily_limit_free: 5,
            ad_daily_limit_basic: 10,
            ad_daily_limit_pro: 15,
            ad_daily_limit_vip: 50,
            ad_burst_length: 3,
            ad_cooldown_minutes: 15,
            spin_rewards: vec![
                SpinReward { coins: 5, weight: 40 },
                SpinReward { coins: 10, weight: 25 },
                SpinReward { coins: 20, weight: 15 },
                SpinReward { coins: 50, weight: 20 },
            ],
            commit_retry_limit: 8,
        }
    }
}

impl RewardPolicy {
    pub fn ad_daily_limit(&self, tier: SubscriptionTier) -> i64 {
        match tier {
            SubscriptionTier::Free => self.ad_daily_limit_free,
            SubscriptionTier::Basic => self.ad_daily_limit_basic,
            SubscriptionTier::Pro => self.ad_daily_limit_pro,
            SubscriptionTier::Vip => self.ad_daily_limit_vip,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ActivityThresholds {
    pub vote: i64,
    pub view: i64,
    pub upload: i64,
    pub ad_watch: i64,
    pub referral: i64,
    pub like: i64,
    pub comment: i64,
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        ActivityThresholds {
            vote: 100,
            view: 500,
            upload: 20,
            ad_watch: 50,
            referral: 10,
            like: 200,
            comment: 50,
        }
    }
}

impl ActivityThresholds {
    pub fn for_kind(&self, kind: ActivityKind) -> i64 {
        match kind {
            ActivityKind::Vote => self.vote,
            ActivityKind::View => self.view,
            ActivityKind::Upload => self.upload,
            ActivityKind::AdWatch => self.ad_watch,
            ActivityKind::Referral => self.referral,
            ActivityKind::Like => self.like,
            ActivityKind::Comment => self.comment,
        }
    }
}

/// Scoring weights, detector thresholds and the severity-to-action mapping
/// of the risk engine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub weight_low: i32,
    pub weight_medium: i32,
    pub weight_high: i32,
    pub weight_critical: i32,
    pub anonymizing_session_penalty: i32,
    pub device_allowance: i64,
    pub device_penalty: i32,
    pub incident_window_days: i64,
    pub incident_dedup_minutes: i64,

    pub multi_account_window_hours: i64,
    pub geo_max_speed_kmh: f64,
    pub geo_window_hours: f64,
    pub activity_window_minutes: i64,
    pub activity_thresholds: ActivityThresholds,

    pub low_action: AutomatedAction,
    pub medium_action: AutomatedAction,
    pub high_action: AutomatedAction,
    pub critical_action: AutomatedAction,

    pub vpn_severity: Severity,
    pub geo_hopping_severity: Severity,
    pub multi_account_severity: Severity,
    pub self_referral_severity: Severity,
    pub rapid_activity_severity: Severity,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy {
            weight_low: 5,
            weight_medium: 15,
            weight_high: 30,
            weight_critical: 50,
            anonymizing_session_penalty: 5,
            device_allowance: 5,
            device_penalty: 3,
            incident_window_days: 30,
            incident_dedup_minutes: 60,
            multi_account_window_hours: 24,
            geo_max_speed_kmh: 500.0,
            geo_window_hours: 1.0,
            activity_window_minutes: 60,
            activity_thresholds: ActivityThresholds::default(),
            low_action: AutomatedAction::Warning,
            medium_action: AutomatedAction::RateLimit,
            high_action: AutomatedAction::FreezeCoins,
            critical_action: AutomatedAction::Suspend,
            vpn_severity: Severity::Medium,
            geo_hopping_severity: Severity::High,
            multi_account_severity: Severity::High,
            self_referral_severity: Severity::High,
            rapid_activity_severity: Severity::Medium,
        }
    }
}

impl RiskPolicy {
    pub fn severity_weight(&self, severity: Severity) -> i32 {
        match severity {
            Severity::Low => self.weight_low,
            Severity::Medium => self.weight_medium,
            Severity::High => self.weight_high,
            Severity::Critical => self.weight_critical,
        }
    }

    pub fn action_for(&self, severity: Severity) -> AutomatedAction {
        match severity {
            Severity::Low => self.low_action,
            Severity::Medium => self.medium_action,
            Severity::High => self.high_action,
            Severity::Critical => self.critical_action,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub postgres: Postgres,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub ip_reputation: IpReputation,
    #[serde(default)]
    pub rewards: RewardPolicy,
    #[serde(default)]
    pub risk: RiskPolicy,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        config.try_deserialize()
    }
}

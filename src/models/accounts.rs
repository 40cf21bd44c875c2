use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Basic,
    Pro,
    Vip,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Vip => "vip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionTier::Free),
            "basic" => Some(SubscriptionTier::Basic),
            "pro" => Some(SubscriptionTier::Pro),
            "vip" => Some(SubscriptionTier::Vip),
            _ => None,
        }
    }
}

/// Ordered by escalation: an automated action never moves the status to the
/// left of where it already is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    RateLimited,
    CoinsFrozen,
    Suspended,
    Banned,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::RateLimited => "rate_limited",
            AccountStatus::CoinsFrozen => "coins_frozen",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Banned => "banned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AccountStatus::Active),
            "rate_limited" => Some(AccountStatus::RateLimited),
            "coins_frozen" => Some(AccountStatus::CoinsFrozen),
            "suspended" => Some(AccountStatus::Suspended),
            "banned" => Some(AccountStatus::Banned),
            _ => None,
        }
    }
}

/// One account per user. Balances and counters are only ever mutated through
/// the ledger service; `version` backs the optimistic commit on every write.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub subscription_tier: SubscriptionTier,

    pub coin_balance: i64,
    pub withdrawable_balance: i64,
    pub total_coins_earned: i64,

    pub upload_rewards_enabled: bool,
    pub upload_count: i64,
    pub upload_rewards_earned: i64,

    pub daily_view_coins: i64,
    pub monthly_view_coins: i64,
    pub last_view_coin_reset: DateTime<Utc>,

    pub daily_ads_watched: i64,
    pub last_ad_watch: Option<DateTime<Utc>>,
    pub ad_cooldown_until: Option<DateTime<Utc>>,

    pub daily_uploads_count: i64,
    pub last_upload_date: Option<DateTime<Utc>>,
    pub daily_shares_count: i64,
    pub last_share_date: Option<DateTime<Utc>>,

    pub last_spin_date: Option<DateTime<Utc>>,

    pub referred_by: Option<String>,
    pub referral_count: i64,

    pub risk_score: i16,
    pub account_status: AccountStatus,
    pub coins_frozen: bool,
    pub freeze_reason: Option<String>,
    pub is_banned: bool,
    pub ban_reason: Option<String>,

    pub signup_date: DateTime<Utc>,
    pub version: i64,
}

impl Account {
    pub fn new(
        id: String,
        username: String,
        referred_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Account {
            id,
            username,
            subscription_tier: SubscriptionTier::Free,
            coin_balance: 0,
            withdrawable_balance: 0,
            total_coins_earned: 0,
            upload_rewards_enabled: true,
            upload_count: 0,
            upload_rewards_earned: 0,
            daily_view_coins: 0,
            monthly_view_coins: 0,
            last_view_coin_reset: now,
            daily_ads_watched: 0,
            last_ad_watch: None,
            ad_cooldown_until: None,
            daily_uploads_count: 0,
            last_upload_date: None,
            daily_shares_count: 0,
            last_share_date: None,
            last_spin_date: None,
            referred_by,
            referral_count: 0,
            risk_score: 0,
            account_status: AccountStatus::Active,
            coins_frozen: false,
            freeze_reason: None,
            is_banned: false,
            ban_reason: None,
            signup_date: now,
            version: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BalanceSummary {
    pub coin_balance: i64,
    pub withdrawable_balance: i64,
    pub total_coins_earned: i64,
}

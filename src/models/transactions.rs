use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    UploadReward,
    ViewReward,
    AdWatch,
    Referral,
    ReferralBonus,
    SpinWheel,
    VoteCast,
    VoteReceived,
    GiftSent,
    GiftReceived,
    Purchase,
    Withdrawal,
    AddMoney,
    WelcomeBonus,
    AdminAdjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::UploadReward => "upload_reward",
            TransactionType::ViewReward => "view_reward",
            TransactionType::AdWatch => "ad_watch",
            TransactionType::Referral => "referral",
            TransactionType::ReferralBonus => "referral_bonus",
            TransactionType::SpinWheel => "spin_wheel",
            TransactionType::VoteCast => "vote_cast",
            TransactionType::VoteReceived => "vote_received",
            TransactionType::GiftSent => "gift_sent",
            TransactionType::GiftReceived => "gift_received",
            TransactionType::Purchase => "purchase",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::AddMoney => "add_money",
            TransactionType::WelcomeBonus => "welcome_bonus",
            TransactionType::AdminAdjustment => "admin_adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upload_reward" => Some(TransactionType::UploadReward),
            "view_reward" => Some(TransactionType::ViewReward),
            "ad_watch" => Some(TransactionType::AdWatch),
            "referral" => Some(TransactionType::Referral),
            "referral_bonus" => Some(TransactionType::ReferralBonus),
            "spin_wheel" => Some(TransactionType::SpinWheel),
            "vote_cast" => Some(TransactionType::VoteCast),
            "vote_received" => Some(TransactionType::VoteReceived),
            "gift_sent" => Some(TransactionType::GiftSent),
            "gift_received" => Some(TransactionType::GiftReceived),
            "purchase" => Some(TransactionType::Purchase),
            "withdrawal" => Some(TransactionType::Withdrawal),
            "add_money" => Some(TransactionType::AddMoney),
            "welcome_bonus" => Some(TransactionType::WelcomeBonus),
            "admin_adjustment" => Some(TransactionType::AdminAdjustment),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Append-only ledger record. A completed transaction is never edited;
/// corrections are new offsetting records.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub balance_after: i64,
    pub description: String,
    pub related_account: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn completed(
        account_id: &str,
        tx_type: TransactionType,
        amount: i64,
        balance_after: i64,
        description: String,
        related_account: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id: uuid::Uuid::new_v4().hyphenated().to_string(),
            account_id: account_id.to_string(),
            tx_type,
            amount,
            balance_after,
            description,
            related_account,
            status: TransactionStatus::Completed,
            created_at: now,
        }
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::events::EventPublisher;
use super::{RequestHandler, Service};
use crate::models::accounts::{Account, AccountStatus, BalanceSummary};
use crate::models::events::DomainEvent;
use crate::models::transactions::{Transaction, TransactionType};
use crate::repositories::ledger::LedgerStore;
use crate::repositories::{CommitOutcome, StoreError};
use crate::settings::{RewardPolicy, SpinReward};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("account not found")]
    AccountNotFound,
    #[error("insufficient coin balance")]
    InsufficientBalance,
    #[error("coins are frozen for this account")]
    AccountFrozen,
    #[error("account is suspended")]
    AccountSuspended,
    #[error("daily ad watch limit reached")]
    DailyLimitReached { limit: i64 },
    #[error("please wait {remaining_minutes} minute(s) before watching another ad")]
    CooldownActive { remaining_minutes: i64 },
    #[error("already spun the wheel today")]
    AlreadySpunToday,
    #[error("account is being updated concurrently, try again")]
    Contention,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, Serialize)]
pub struct UploadRewardOutcome {
    pub awarded: bool,
    pub coins: i64,
    pub bonus_awarded: bool,
    pub upload_count: i64,
    pub reason: Option<String>,
}

impl UploadRewardOutcome {
    fn denied(upload_count: i64, reason: &str) -> Self {
        UploadRewardOutcome {
            awarded: false,
            coins: 0,
            bonus_awarded: false,
            upload_count,
            reason: Some(reason.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ViewRewardOutcome {
    pub awarded: bool,
    pub coins: i64,
    pub reason: Option<String>,
}

impl ViewRewardOutcome {
    fn denied(reason: Option<&str>) -> Self {
        ViewRewardOutcome {
            awarded: false,
            coins: 0,
            reason: reason.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AdWatchOutcome {
    pub coins_earned: i64,
    pub daily_ads_watched: i64,
    pub daily_limit: i64,
    pub cooldown_until: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SpinOutcome {
    pub coins_won: i64,
}

pub enum LedgerRequest {
    CreateAccount {
        username: String,
        referred_by: Option<String>,
        response: oneshot::Sender<Result<Account, LedgerError>>,
    },
    Award {
        account_id: String,
        amount: i64,
        tx_type: TransactionType,
        description: String,
        related_account: Option<String>,
        response: oneshot::Sender<Result<Transaction, LedgerError>>,
    },
    Deduct {
        account_id: String,
        amount: i64,
        tx_type: TransactionType,
        description: String,
        related_account: Option<String>,
        response: oneshot::Sender<Result<Transaction, LedgerError>>,
    },
    Adjust {
        account_id: String,
        amount: i64,
        description: String,
        response: oneshot::Sender<Result<Transaction, LedgerError>>,
    },
    ClaimUploadReward {
        account_id: String,
        response: oneshot::Sender<Result<UploadRewardOutcome, LedgerError>>,
    },
    ClaimViewReward {
        account_id: String,
        views: i64,
        response: oneshot::Sender<Result<ViewRewardOutcome, LedgerError>>,
    },
    WatchAd {
        account_id: String,
        response: oneshot::Sender<Result<AdWatchOutcome, LedgerError>>,
    },
    Spin {
        account_id: String,
        response: oneshot::Sender<Result<SpinOutcome, LedgerError>>,
    },
    SendGift {
        sender_id: String,
        recipient_id: String,
        amount: i64,
        message: Option<String>,
        response: oneshot::Sender<Result<(), LedgerError>>,
    },
    GetBalance {
        account_id: String,
        response: oneshot::Sender<Result<BalanceSummary, LedgerError>>,
    },
    GetTransactions {
        account_id: String,
        limit: i64,
        response: oneshot::Sender<Result<Vec<Transaction>, LedgerError>>,
    },
}

fn crossed_day(last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.date_naive() > last.date_naive()
}

fn crossed_month(last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now.year(), now.month()) > (last.year(), last.month())
}

/// Weighted draw over the configured reward table.
pub fn draw_spin_reward(rewards: &[SpinReward]) -> i64 {
    let total: u32 = rewards.iter().map(|r| r.weight).sum();
    if total == 0 {
        return 0;
    }

    let mut roll = rand::thread_rng().gen_range(0..total);
    for reward in rewards {
        if roll < reward.weight {
            return reward.coins;
        }
        roll -= reward.weight;
    }

    rewards[rewards.len() - 1].coins
}

#[derive(Clone)]
pub struct LedgerRequestHandler {
    store: Arc<dyn LedgerStore>,
    events: EventPublisher,
    policy: Arc<RewardPolicy>,
}

impl LedgerRequestHandler {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        events: EventPublisher,
        policy: Arc<RewardPolicy>,
    ) -> Self {
        LedgerRequestHandler {
            store,
            events,
            policy,
        }
    }

    async fn load(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.store
            .fetch_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound)
    }

    /// Suspended and banned accounts are rejected outright; frozen accounts
    /// only accept administrative corrections.
    fn gate(account: &Account, admin: bool) -> Result<(), LedgerError> {
        if account.is_banned
            || matches!(
                account.account_status,
                AccountStatus::Suspended | AccountStatus::Banned
            )
        {
            return Err(LedgerError::AccountSuspended);
        }

        if (account.coins_frozen || account.account_status == AccountStatus::CoinsFrozen) && !admin
        {
            return Err(LedgerError::AccountFrozen);
        }

        Ok(())
    }

    fn publish_transaction(&self, record: &Transaction) {
        self.events.publish(DomainEvent::TransactionCreated {
            account_id: record.account_id.clone(),
            transaction_id: record.id.clone(),
            tx_type: record.tx_type,
            amount: record.amount,
            balance_after: record.balance_after,
        });
    }

    /// The single balance-mutation primitive: optimistic retry loop around
    /// the store's versioned commit. The balance change and its transaction
    /// record persist together or not at all.
    async fn apply_balance_change(
        &self,
        account_id: &str,
        amount: i64,
        tx_type: TransactionType,
        description: String,
        related_account: Option<String>,
        admin: bool,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        for _ in 0..self.policy.commit_retry_limit {
            let mut account = self.load(account_id).await?;
            Self::gate(&account, admin)?;

            if amount < 0 && account.coin_balance < -amount {
                return Err(LedgerError::InsufficientBalance);
            }

            account.coin_balance += amount;
            if amount > 0
                && !matches!(
                    tx_type,
                    TransactionType::GiftReceived | TransactionType::AdminAdjustment
                )
            {
                account.total_coins_earned += amount;
            }
            if tx_type == TransactionType::GiftReceived {
                account.withdrawable_balance += amount;
            }
            if amount < 0 {
                account.withdrawable_balance =
                    account.withdrawable_balance.min(account.coin_balance);
            }

            let expected = account.version;
            account.version += 1;

            let record = Transaction::completed(
                account_id,
                tx_type,
                amount,
                account.coin_balance,
                description.clone(),
                related_account.clone(),
                now,
            );

            match self.store.commit(&account, expected, &record).await? {
                CommitOutcome::Committed => {
                    self.publish_transaction(&record);
                    return Ok(record);
                }
                CommitOutcome::Conflict => continue,
            }
        }

        Err(LedgerError::Contention)
    }

    pub async fn create_account(
        &self,
        username: String,
        referred_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let referrer = match &referred_by {
            Some(id) => self.store.fetch_account(id).await?,
            None => None,
        };

        let id = Uuid::new_v4().hyphenated().to_string();
        let account = Account::new(
            id.clone(),
            username,
            referrer.as_ref().map(|r| r.id.clone()),
            now,
        );
        self.store.insert_account(&account).await?;

        if self.policy.welcome_bonus_coins > 0 {
            self.apply_balance_change(
                &id,
                self.policy.welcome_bonus_coins,
                TransactionType::WelcomeBonus,
                "Welcome bonus".to_string(),
                None,
                false,
                now,
            )
            .await?;
        }

        if let Some(referrer) = referrer {
            self.reward_referrer(&referrer.id, &account, now).await;
        }

        self.load(&id).await
    }

    /// The referrer's reward must never block a signup; failures are logged
    /// and dropped.
    async fn reward_referrer(&self, referrer_id: &str, referred: &Account, now: DateTime<Utc>) {
        if self.policy.referral_coins > 0 {
            let awarded = self
                .apply_balance_change(
                    referrer_id,
                    self.policy.referral_coins,
                    TransactionType::Referral,
                    format!("Referral reward for inviting {}", referred.username),
                    Some(referred.id.clone()),
                    false,
                    now,
                )
                .await;

            if let Err(e) = awarded {
                log::warn!("Referral reward skipped for {}: {}", referrer_id, e);
                return;
            }
        }

        for _ in 0..self.policy.commit_retry_limit {
            let mut referrer = match self.load(referrer_id).await {
                Ok(account) => account,
                Err(e) => {
                    log::warn!("Referral count update skipped for {}: {}", referrer_id, e);
                    return;
                }
            };

            referrer.referral_count += 1;
            let expected = referrer.version;
            referrer.version += 1;

            match self.store.update_account(&referrer, expected).await {
                Ok(CommitOutcome::Committed) => return,
                Ok(CommitOutcome::Conflict) => continue,
                Err(e) => {
                    log::warn!("Referral count update failed for {}: {}", referrer_id, e);
                    return;
                }
            }
        }
    }

    pub async fn award(
        &self,
        account_id: &str,
        amount: i64,
        tx_type: TransactionType,
        description: String,
        related_account: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::Validation(
                "award amount must be positive".to_string(),
            ));
        }

        self.apply_balance_change(
            account_id,
            amount,
            tx_type,
            description,
            related_account,
            false,
            now,
        )
        .await
    }

    pub async fn deduct(
        &self,
        account_id: &str,
        amount: i64,
        tx_type: TransactionType,
        description: String,
        related_account: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::Validation(
                "deduct amount must be positive".to_string(),
            ));
        }

        self.apply_balance_change(
            account_id,
            -amount,
            tx_type,
            description,
            related_account,
            false,
            now,
        )
        .await
    }

    /// Administrative correction; the only mutation honored while coins are
    /// frozen.
    pub async fn adjust(
        &self,
        account_id: &str,
        amount: i64,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::Validation(
                "adjustment amount must be non-zero".to_string(),
            ));
        }

        self.apply_balance_change(
            account_id,
            amount,
            TransactionType::AdminAdjustment,
            description,
            None,
            true,
            now,
        )
        .await
    }

    pub async fn claim_upload_reward(
        &self,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UploadRewardOutcome, LedgerError> {
        for _ in 0..self.policy.commit_retry_limit {
            let mut account = self.load(account_id).await?;
            Self::gate(&account, false)?;

            if !account.upload_rewards_enabled {
                return Ok(UploadRewardOutcome::denied(
                    account.upload_count,
                    "Upload rewards disabled",
                ));
            }

            if account.total_coins_earned >= self.policy.reward_earning_ceiling {
                account.upload_rewards_enabled = false;
                let expected = account.version;
                account.version += 1;

                match self.store.update_account(&account, expected).await? {
                    CommitOutcome::Committed => {
                        return Ok(UploadRewardOutcome::denied(
                            account.upload_count,
                            "Upload rewards limit reached",
                        ))
                    }
                    CommitOutcome::Conflict => continue,
                }
            }

            if account.upload_count >= self.policy.max_upload_posts {
                return Ok(UploadRewardOutcome::denied(
                    account.upload_count,
                    "Max upload limit reached",
                ));
            }

            account.upload_count += 1;
            if let Some(last) = account.last_upload_date {
                if crossed_day(last, now) {
                    account.daily_uploads_count = 0;
                }
            }
            account.daily_uploads_count += 1;
            account.last_upload_date = Some(now);

            let within_bonus_window = now - account.signup_date
                <= Duration::days(self.policy.upload_bonus_window_days);
            let bonus = if account.upload_count == self.policy.max_upload_posts
                && within_bonus_window
            {
                self.policy.upload_bonus_coins
            } else {
                0
            };

            let total = self.policy.upload_reward_coins + bonus;
            account.coin_balance += total;
            account.total_coins_earned += total;
            account.upload_rewards_earned += total;

            let description = if bonus > 0 {
                format!(
                    "Upload reward ({} coins) + bonus ({} coins)",
                    self.policy.upload_reward_coins, bonus
                )
            } else {
                "Upload reward".to_string()
            };

            let expected = account.version;
            account.version += 1;

            let record = Transaction::completed(
                account_id,
                TransactionType::UploadReward,
                total,
                account.coin_balance,
                description,
                None,
                now,
            );

            match self.store.commit(&account, expected, &record).await? {
                CommitOutcome::Committed => {
                    self.publish_transaction(&record);
                    return Ok(UploadRewardOutcome {
                        awarded: true,
                        coins: total,
                        bonus_awarded: bonus > 0,
                        upload_count: account.upload_count,
                        reason: None,
                    });
                }
                CommitOutcome::Conflict => continue,
            }
        }

        Err(LedgerError::Contention)
    }

    pub async fn claim_view_reward(
        &self,
        account_id: &str,
        views: i64,
        now: DateTime<Utc>,
    ) -> Result<ViewRewardOutcome, LedgerError> {
        if views < 0 {
            return Err(LedgerError::Validation(
                "view count must be non-negative".to_string(),
            ));
        }

        let computed =
            (views / self.policy.view_threshold) * self.policy.view_reward_per_threshold;
        if computed <= 0 {
            return Ok(ViewRewardOutcome::denied(None));
        }

        for _ in 0..self.policy.commit_retry_limit {
            let mut account = self.load(account_id).await?;
            Self::gate(&account, false)?;

            let last_reset = account.last_view_coin_reset;
            let mut reset = false;
            if crossed_day(last_reset, now) {
                account.daily_view_coins = 0;
                reset = true;
            }
            if crossed_month(last_reset, now) {
                account.monthly_view_coins = 0;
                reset = true;
            }
            if reset {
                account.last_view_coin_reset = now;
            }

            let daily_headroom =
                (self.policy.daily_view_coin_cap - account.daily_view_coins).max(0);
            let monthly_headroom =
                (self.policy.monthly_view_coin_cap - account.monthly_view_coins).max(0);

            if daily_headroom == 0 {
                return Ok(ViewRewardOutcome::denied(Some("Daily cap reached")));
            }
            if monthly_headroom == 0 {
                return Ok(ViewRewardOutcome::denied(Some("Monthly cap reached")));
            }

            // Never exceed either cap, even when both are nearly exhausted.
            let coins = computed.min(daily_headroom).min(monthly_headroom);

            account.coin_balance += coins;
            account.total_coins_earned += coins;
            account.daily_view_coins += coins;
            account.monthly_view_coins += coins;

            let expected = account.version;
            account.version += 1;

            let record = Transaction::completed(
                account_id,
                TransactionType::ViewReward,
                coins,
                account.coin_balance,
                format!("View-based earnings ({} views)", views),
                None,
                now,
            );

            match self.store.commit(&account, expected, &record).await? {
                CommitOutcome::Committed => {
                    self.publish_transaction(&record);
                    return Ok(ViewRewardOutcome {
                        awarded: true,
                        coins,
                        reason: None,
                    });
                }
                CommitOutcome::Conflict => continue,
            }
        }

        Err(LedgerError::Contention)
    }

    pub async fn watch_ad(
        &self,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AdWatchOutcome, LedgerError> {
        for _ in 0..self.policy.commit_retry_limit {
            let mut account = self.load(account_id).await?;
            Self::gate(&account, false)?;

            let limit = self.policy.ad_daily_limit(account.subscription_tier);

            if let Some(last) = account.last_ad_watch {
                if crossed_day(last, now) {
                    account.daily_ads_watched = 0;
                }
            }

            if account.daily_ads_watched >= limit {
                return Err(LedgerError::DailyLimitReached { limit });
            }

            if let Some(until) = account.ad_cooldown_until {
                if now < until {
                    let remaining_minutes = ((until - now).num_seconds() + 59) / 60;
                    return Err(LedgerError::CooldownActive { remaining_minutes });
                }
            }

            let coins = self.policy.ad_watch_coins;
            account.coin_balance += coins;
            account.total_coins_earned += coins;
            account.daily_ads_watched += 1;
            account.last_ad_watch = Some(now);

            if self.policy.ad_burst_length > 0
                && account.daily_ads_watched % self.policy.ad_burst_length == 0
            {
                account.ad_cooldown_until =
                    Some(now + Duration::minutes(self.policy.ad_cooldown_minutes));
            }

            let expected = account.version;
            account.version += 1;

            let record = Transaction::completed(
                account_id,
                TransactionType::AdWatch,
                coins,
                account.coin_balance,
                "Watched rewarded ad".to_string(),
                None,
                now,
            );

            match self.store.commit(&account, expected, &record).await? {
                CommitOutcome::Committed => {
                    self.publish_transaction(&record);
                    return Ok(AdWatchOutcome {
                        coins_earned: coins,
                        daily_ads_watched: account.daily_ads_watched,
                        daily_limit: limit,
                        cooldown_until: account.ad_cooldown_until,
                    });
                }
                CommitOutcome::Conflict => continue,
            }
        }

        Err(LedgerError::Contention)
    }

    pub async fn spin(
        &self,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SpinOutcome, LedgerError> {
        for _ in 0..self.policy.commit_retry_limit {
            let mut account = self.load(account_id).await?;
            Self::gate(&account, false)?;

            if let Some(last) = account.last_spin_date {
                if last.date_naive() == now.date_naive() {
                    return Err(LedgerError::AlreadySpunToday);
                }
            }

            let coins = draw_spin_reward(&self.policy.spin_rewards);
            account.coin_balance += coins;
            account.total_coins_earned += coins;
            account.last_spin_date = Some(now);

            let expected = account.version;
            account.version += 1;

            let record = Transaction::completed(
                account_id,
                TransactionType::SpinWheel,
                coins,
                account.coin_balance,
                format!("Won {} coins from spin wheel", coins),
                None,
                now,
            );

            match self.store.commit(&account, expected, &record).await? {
                CommitOutcome::Committed => {
                    self.publish_transaction(&record);
                    return Ok(SpinOutcome { coins_won: coins });
                }
                CommitOutcome::Conflict => continue,
            }
        }

        Err(LedgerError::Contention)
    }

    /// Gift transfer: sender deduct then recipient award, as two
    /// single-account mutations. If the award fails after the deduct
    /// committed, the sender is re-credited with a compensating adjustment.
    pub async fn send_gift(
        &self,
        sender_id: &str,
        recipient_id: &str,
        amount: i64,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::Validation(
                "gift amount must be positive".to_string(),
            ));
        }
        if sender_id == recipient_id {
            return Err(LedgerError::Validation(
                "cannot gift coins to yourself".to_string(),
            ));
        }

        let sender = self.load(sender_id).await?;
        let recipient = self.load(recipient_id).await?;

        self.apply_balance_change(
            sender_id,
            -amount,
            TransactionType::GiftSent,
            format!("Gift sent to {}", recipient.username),
            Some(recipient.id.clone()),
            false,
            now,
        )
        .await?;

        let description = match &message {
            Some(message) => format!("Gift received from {}: {}", sender.username, message),
            None => format!("Gift received from {}", sender.username),
        };

        let awarded = self
            .apply_balance_change(
                recipient_id,
                amount,
                TransactionType::GiftReceived,
                description,
                Some(sender.id.clone()),
                false,
                now,
            )
            .await;

        match awarded {
            Ok(_) => Ok(()),
            Err(err) => {
                let compensation = self
                    .apply_balance_change(
                        sender_id,
                        amount,
                        TransactionType::AdminAdjustment,
                        format!("Gift to {} reversed: delivery failed", recipient.username),
                        Some(recipient.id),
                        true,
                        now,
                    )
                    .await;

                if let Err(comp) = compensation {
                    log::error!(
                        "Gift compensation failed for {}: {} (original failure: {})",
                        sender_id,
                        comp,
                        err
                    );
                }

                Err(err)
            }
        }
    }

    pub async fn balance(&self, account_id: &str) -> Result<BalanceSummary, LedgerError> {
        let account = self.load(account_id).await?;

        Ok(BalanceSummary {
            coin_balance: account.coin_balance,
            withdrawable_balance: account.withdrawable_balance,
            total_coins_earned: account.total_coins_earned,
        })
    }

    pub async fn transactions(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.load(account_id).await?;

        Ok(self.store.transactions_for(account_id, limit).await?)
    }
}

#[async_trait]
impl RequestHandler<LedgerRequest> for LedgerRequestHandler {
    async fn handle_request(&self, request: LedgerRequest) {
        let now = Utc::now();

        match request {
            LedgerRequest::CreateAccount {
                username,
                referred_by,
                response,
            } => {
                let result = self.create_account(username, referred_by, now).await;
                let _ = response.send(result);
            }
            LedgerRequest::Award {
                account_id,
                amount,
                tx_type,
                description,
                related_account,
                response,
            } => {
                let result = self
                    .award(&account_id, amount, tx_type, description, related_account, now)
                    .await;
                let _ = response.send(result);
            }
            LedgerRequest::Deduct {
                account_id,
                amount,
                tx_type,
                description,
                related_account,
                response,
            } => {
                let result = self
                    .deduct(&account_id, amount, tx_type, description, related_account, now)
                    .await;
                let _ = response.send(result);
            }
            LedgerRequest::Adjust {
                account_id,
                amount,
                description,
                response,
            } => {
                let result = self.adjust(&account_id, amount, description, now).await;
                let _ = response.send(result);
            }
            LedgerRequest::ClaimUploadReward {
                account_id,
                response,
            } => {
                let result = self.claim_upload_reward(&account_id, now).await;
                let _ = response.send(result);
            }
            LedgerRequest::ClaimViewReward {
                account_id,
                views,
                response,
            } => {
                let result = self.claim_view_reward(&account_id, views, now).await;
                let _ = response.send(result);
            }
            LedgerRequest::WatchAd {
                account_id,
                response,
            } => {
                let result = self.watch_ad(&account_id, now).await;
                let _ = response.send(result);
            }
            LedgerRequest::Spin {
                account_id,
                response,
            } => {
                let result = self.spin(&account_id, now).await;
                let _ = response.send(result);
            }
            LedgerRequest::SendGift {
                sender_id,
                recipient_id,
                amount,
                message,
                response,
            } => {
                let result = self
                    .send_gift(&sender_id, &recipient_id, amount, message, now)
                    .await;
                let _ = response.send(result);
            }
            LedgerRequest::GetBalance {
                account_id,
                response,
            } => {
                let result = self.balance(&account_id).await;
                let _ = response.send(result);
            }
            LedgerRequest::GetTransactions {
                account_id,
                limit,
                response,
            } => {
                let result = self.transactions(&account_id, limit).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        LedgerService {}
    }
}

#[async_trait]
impl Service<LedgerRequest, LedgerRequestHandler> for LedgerService {}

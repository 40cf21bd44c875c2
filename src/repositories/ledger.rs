use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::{CommitOutcome, StoreError};
use crate::models::accounts::{Account, AccountStatus, SubscriptionTier};
use crate::models::transactions::{Transaction, TransactionStatus, TransactionType};

/// Persistent account state plus the append-only transaction log.
///
/// `commit` is the single mutation primitive: it persists the new account
/// state and its transaction record together, guarded by the account
/// `version` the caller read. A concurrent writer makes the guard fail and
/// the caller retries from a fresh read.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn fetch_account(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// Atomically persist `account` (whose `version` has been bumped) and
    /// append `record`, iff the stored version still equals
    /// `expected_version`.
    async fn commit(
        &self,
        account: &Account,
        expected_version: i64,
        record: &Transaction,
    ) -> Result<CommitOutcome, StoreError>;

    /// Version-guarded account update without a transaction record, for
    /// state changes that are not balance mutations (risk score, automated
    /// actions, reward flags).
    async fn update_account(
        &self,
        account: &Account,
        expected_version: i64,
    ) -> Result<CommitOutcome, StoreError>;

    /// Most recent transactions first.
    async fn transactions_for(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, StoreError>;

    async fn transaction_count_since(
        &self,
        account_id: &str,
        tx_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;
}

#[derive(Clone)]
pub struct PgLedgerStore {
    conn: PgPool,
}

impl PgLedgerStore {
    pub fn new(conn: PgPool) -> Self {
        PgLedgerStore { conn }
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let tier: String = row.try_get("subscription_tier")?;
    let status: String = row.try_get("account_status")?;

    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        subscription_tier: SubscriptionTier::parse(&tier)
            .ok_or_else(|| StoreError::Corrupt(format!("subscription tier: {}", tier)))?,
        coin_balance: row.try_get("coin_balance")?,
        withdrawable_balance: row.try_get("withdrawable_balance")?,
        total_coins_earned: row.try_get("total_coins_earned")?,
        upload_rewards_enabled: row.try_get("upload_rewards_enabled")?,
        upload_count: row.try_get("upload_count")?,
        upload_rewards_earned: row.try_get("upload_rewards_earned")?,
        daily_view_coins: row.try_get("daily_view_coins")?,
        monthly_view_coins: row.try_get("monthly_view_coins")?,
        last_view_coin_reset: row.try_get("last_view_coin_reset")?,
        daily_ads_watched: row.try_get("daily_ads_watched")?,
        last_ad_watch: row.try_get("last_ad_watch")?,
        ad_cooldown_until: row.try_get("ad_cooldown_until")?,
        daily_uploads_count: row.try_get("daily_uploads_count")?,
        last_upload_date: row.try_get("last_upload_date")?,
        daily_shares_count: row.try_get("daily_shares_count")?,
        last_share_date: row.try_get("last_share_date")?,
        last_spin_date: row.try_get("last_spin_date")?,
        referred_by: row.try_get("referred_by")?,
        referral_count: row.try_get("referral_count")?,
        risk_score: row.try_get("risk_score")?,
        account_status: AccountStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("account status: {}", status)))?,
        coins_frozen: row.try_get("coins_frozen")?,
        freeze_reason: row.try_get("freeze_reason")?,
        is_banned: row.try_get("is_banned")?,
        ban_reason: row.try_get("ban_reason")?,
        signup_date: row.try_get("signup_date")?,
        version: row.try_get("version")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StoreError> {
    let tx_type: String = row.try_get("tx_type")?;
    let status: String = row.try_get("status")?;

    Ok(Transaction {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        tx_type: TransactionType::parse(&tx_type)
            .ok_or_else(|| StoreError::Corrupt(format!("transaction type: {}", tx_type)))?,
        amount: row.try_get("amount")?,
        balance_after: row.try_get("balance_after")?,
        description: row.try_get("description")?,
        related_account: row.try_get("related_account")?,
        status: TransactionStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("transaction status: {}", status)))?,
        created_at: row.try_get("created_at")?,
    })
}

const UPDATE_ACCOUNT_SQL: &str = r#"
    UPDATE accounts SET
        username = $3,
        subscription_tier = $4,
        coin_balance = $5,
        withdrawable_balance = $6,
        total_coins_earned = $7,
        upload_rewards_enabled = $8,
        upload_count = $9,
        upload_rewards_earned = $10,
        daily_view_coins = $11,
        monthly_view_coins = $12,
        last_view_coin_reset = $13,
        daily_ads_watched = $14,
        last_ad_watch = $15,
        ad_cooldown_until = $16,
        daily_uploads_count = $17,
        last_upload_date = $18,
        daily_shares_count = $19,
        last_share_date = $20,
        last_spin_date = $21,
        referred_by = $22,
        referral_count = $23,
        risk_score = $24,
        account_status = $25,
        coins_frozen = $26,
        freeze_reason = $27,
        is_banned = $28,
        ban_reason = $29,
        version = $30
    WHERE id = $1 AND version = $2
"#;

fn bind_account_update<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    account: &'q Account,
    expected_version: i64,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&account.id)
        .bind(expected_version)
        .bind(&account.username)
        .bind(account.subscription_tier.as_str())
        .bind(account.coin_balance)
        .bind(account.withdrawable_balance)
        .bind(account.total_coins_earned)
        .bind(account.upload_rewards_enabled)
        .bind(account.upload_count)
        .bind(account.upload_rewards_earned)
        .bind(account.daily_view_coins)
        .bind(account.monthly_view_coins)
        .bind(account.last_view_coin_reset)
        .bind(account.daily_ads_watched)
        .bind(account.last_ad_watch)
        .bind(account.ad_cooldown_until)
        .bind(account.daily_uploads_count)
        .bind(account.last_upload_date)
        .bind(account.daily_shares_count)
        .bind(account.last_share_date)
        .bind(account.last_spin_date)
        .bind(&account.referred_by)
        .bind(account.referral_count)
        .bind(account.risk_score)
        .bind(account.account_status.as_str())
        .bind(account.coins_frozen)
        .bind(account.freeze_reason.as_deref())
        .bind(account.is_banned)
        .bind(account.ban_reason.as_deref())
        .bind(account.version)
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts
            (id, username, subscription_tier, coin_balance, withdrawable_balance,
             total_coins_earned, upload_rewards_enabled, upload_count,
             upload_rewards_earned, daily_view_coins, monthly_view_coins,
             last_view_coin_reset, daily_ads_watched, last_ad_watch,
             ad_cooldown_until, daily_uploads_count, last_upload_date,
             daily_shares_count, last_share_date, last_spin_date, referred_by,
             referral_count, risk_score, account_status, coins_frozen,
             freeze_reason, is_banned, ban_reason, signup_date, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                    $27, $28, $29, $30)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(account.subscription_tier.as_str())
        .bind(account.coin_balance)
        .bind(account.withdrawable_balance)
        .bind(account.total_coins_earned)
        .bind(account.upload_rewards_enabled)
        .bind(account.upload_count)
        .bind(account.upload_rewards_earned)
        .bind(account.daily_view_coins)
        .bind(account.monthly_view_coins)
        .bind(account.last_view_coin_reset)
        .bind(account.daily_ads_watched)
        .bind(account.last_ad_watch)
        .bind(account.ad_cooldown_until)
        .bind(account.daily_uploads_count)
        .bind(account.last_upload_date)
        .bind(account.daily_shares_count)
        .bind(account.last_share_date)
        .bind(account.last_spin_date)
        .bind(&account.referred_by)
        .bind(account.referral_count)
        .bind(account.risk_score)
        .bind(account.account_status.as_str())
        .bind(account.coins_frozen)
        .bind(account.freeze_reason.as_deref())
        .bind(account.is_banned)
        .bind(account.ban_reason.as_deref())
        .bind(account.signup_date)
        .bind(account.version)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    async fn fetch_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn commit(
        &self,
        account: &Account,
        expected_version: i64,
        record: &Transaction,
    ) -> Result<CommitOutcome, StoreError> {
        let mut tx = self.conn.begin().await?;

        let updated = bind_account_update(sqlx::query(UPDATE_ACCOUNT_SQL), account, expected_version)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        }

        sqlx::query(
            r#"
            INSERT INTO transactions
            (id, account_id, tx_type, amount, balance_after, description,
             related_account, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&record.id)
        .bind(&record.account_id)
        .bind(record.tx_type.as_str())
        .bind(record.amount)
        .bind(record.balance_after)
        .bind(&record.description)
        .bind(record.related_account.as_deref())
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CommitOutcome::Committed)
    }

    async fn update_account(
        &self,
        account: &Account,
        expected_version: i64,
    ) -> Result<CommitOutcome, StoreError> {
        let updated = bind_account_update(sqlx::query(UPDATE_ACCOUNT_SQL), account, expected_version)
            .execute(&self.conn)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(CommitOutcome::Conflict);
        }

        Ok(CommitOutcome::Committed)
    }

    async fn transactions_for(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.conn)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn transaction_count_since(
        &self,
        account_id: &str,
        tx_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM transactions WHERE account_id = $1 AND tx_type = $2 AND created_at >= $3",
        )
        .bind(account_id)
        .bind(tx_type.as_str())
        .bind(since)
        .fetch_one(&self.conn)
        .await?;

        Ok(count)
    }
}

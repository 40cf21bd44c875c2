//! Integration tests for the ledger service over the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::mpsc;

use coinwarden::models::accounts::{Account, AccountStatus};
use coinwarden::models::events::DomainEvent;
use coinwarden::models::transactions::TransactionType;
use coinwarden::repositories::ledger::LedgerStore;
use coinwarden::repositories::memory::MemoryLedgerStore;
use coinwarden::services::events::EventPublisher;
use coinwarden::services::ledger::{draw_spin_reward, LedgerError, LedgerRequestHandler};
use coinwarden::settings::RewardPolicy;

fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn build_handler(
    policy: RewardPolicy,
) -> (
    LedgerRequestHandler,
    Arc<MemoryLedgerStore>,
    mpsc::Receiver<DomainEvent>,
) {
    let store = Arc::new(MemoryLedgerStore::new());
    let (event_tx, event_rx) = mpsc::channel(1024);
    let handler = LedgerRequestHandler::new(
        store.clone(),
        EventPublisher::new(event_tx),
        Arc::new(policy),
    );

    (handler, store, event_rx)
}

async fn seed_account(store: &MemoryLedgerStore, id: &str, balance: i64) -> Account {
    let mut account = Account::new(id.to_string(), format!("user-{}", id), None, test_now());
    account.coin_balance = balance;
    store.insert_account(&account).await.unwrap();

    account
}

#[tokio::test]
async fn award_increases_balance_and_appends_transaction() {
    let (handler, store, mut events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 100).await;

    let record = handler
        .award(
            "a1",
            50,
            TransactionType::Referral,
            "Referral reward".to_string(),
            None,
            test_now(),
        )
        .await
        .unwrap();

    assert_eq!(record.amount, 50);
    assert_eq!(record.balance_after, 150);

    let balance = handler.balance("a1").await.unwrap();
    assert_eq!(balance.coin_balance, 150);
    assert_eq!(balance.total_coins_earned, 50);

    let records = store.transactions_for("a1", 10).await.unwrap();
    assert_eq!(records.len(), 1);

    match events.try_recv().unwrap() {
        DomainEvent::TransactionCreated {
            account_id, amount, ..
        } => {
            assert_eq!(account_id, "a1");
            assert_eq!(amount, 50);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn award_requires_existing_account() {
    let (handler, _store, _events) = build_handler(RewardPolicy::default());

    let result = handler
        .award(
            "missing",
            10,
            TransactionType::Referral,
            "Referral reward".to_string(),
            None,
            test_now(),
        )
        .await;

    assert!(matches!(result, Err(LedgerError::AccountNotFound)));
}

#[tokio::test]
async fn award_rejects_non_positive_amounts() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 0).await;

    let result = handler
        .award(
            "a1",
            0,
            TransactionType::Referral,
            "Referral reward".to_string(),
            None,
            test_now(),
        )
        .await;

    assert!(matches!(result, Err(LedgerError::Validation(_))));
}

#[tokio::test]
async fn deduct_boundary_conditions() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 40).await;

    let overdraw = handler
        .deduct(
            "a1",
            41,
            TransactionType::Purchase,
            "Sticker pack".to_string(),
            None,
            test_now(),
        )
        .await;
    assert!(matches!(overdraw, Err(LedgerError::InsufficientBalance)));
    assert_eq!(handler.balance("a1").await.unwrap().coin_balance, 40);

    let exact = handler
        .deduct(
            "a1",
            40,
            TransactionType::Purchase,
            "Sticker pack".to_string(),
            None,
            test_now(),
        )
        .await
        .unwrap();
    assert_eq!(exact.amount, -40);
    assert_eq!(exact.balance_after, 0);

    let empty = handler
        .deduct(
            "a1",
            1,
            TransactionType::Purchase,
            "Sticker pack".to_string(),
            None,
            test_now(),
        )
        .await;
    assert!(matches!(empty, Err(LedgerError::InsufficientBalance)));
    assert_eq!(handler.balance("a1").await.unwrap().coin_balance, 0);
}

#[tokio::test]
async fn balance_always_equals_transaction_sum() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 25).await;

    handler
        .award("a1", 100, TransactionType::AdWatch, "ad".into(), None, test_now())
        .await
        .unwrap();
    handler
        .deduct("a1", 30, TransactionType::VoteCast, "vote".into(), None, test_now())
        .await
        .unwrap();
    handler
        .award("a1", 7, TransactionType::SpinWheel, "spin".into(), None, test_now())
        .await
        .unwrap();

    let balance = handler.balance("a1").await.unwrap().coin_balance;

    let mut records = store.transactions_for("a1", 100).await.unwrap();
    records.reverse();

    let mut running = 25;
    for record in &records {
        running += record.amount;
        assert_eq!(record.balance_after, running);
    }
    assert_eq!(balance, running);
}

#[tokio::test]
async fn concurrent_awards_keep_ledger_consistent() {
    let policy = RewardPolicy {
        commit_retry_limit: 64,
        ..RewardPolicy::default()
    };
    let (handler, store, _events) = build_handler(policy);
    seed_account(&store, "a1", 0).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let handler = handler.clone();
        tasks.push(tokio::spawn(async move {
            handler
                .award("a1", 5, TransactionType::AdWatch, "ad".into(), None, Utc::now())
                .await
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(handler.balance("a1").await.unwrap().coin_balance, 80);

    let mut records = store.transactions_for("a1", 100).await.unwrap();
    assert_eq!(records.len(), 16);
    records.reverse();

    let mut running = 0;
    for record in &records {
        running += record.amount;
        assert_eq!(record.balance_after, running);
    }
}

#[tokio::test]
async fn view_reward_clamps_to_remaining_daily_headroom() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 0).await;

    // 19900 views -> 190 coins, leaving 10 of the 200 daily cap.
    let first = handler
        .claim_view_reward("a1", 19_900, test_now())
        .await
        .unwrap();
    assert!(first.awarded);
    assert_eq!(first.coins, 190);

    // Computed reward is 50 but only 10 coins of headroom remain.
    let second = handler
        .claim_view_reward("a1", 5_000, test_now())
        .await
        .unwrap();
    assert!(second.awarded);
    assert_eq!(second.coins, 10);

    // Exactly at the cap now.
    let third = handler
        .claim_view_reward("a1", 1_000, test_now())
        .await
        .unwrap();
    assert!(!third.awarded);
    assert_eq!(third.reason.as_deref(), Some("Daily cap reached"));
}

#[tokio::test]
async fn view_reward_honors_monthly_cap() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    let mut account = seed_account(&store, "a1", 0).await;
    account.monthly_view_coins = 1_995;
    store.update_account(&account, 0).await.unwrap();

    let outcome = handler
        .claim_view_reward("a1", 1_000, test_now())
        .await
        .unwrap();
    assert!(outcome.awarded);
    assert_eq!(outcome.coins, 5);

    let denied = handler
        .claim_view_reward("a1", 1_000, test_now())
        .await
        .unwrap();
    assert!(!denied.awarded);
    assert_eq!(denied.reason.as_deref(), Some("Monthly cap reached"));
}

#[tokio::test]
async fn view_counters_reset_at_calendar_boundaries() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    let mut account = seed_account(&store, "a1", 0).await;
    account.daily_view_coins = 200;
    account.last_view_coin_reset = test_now();
    store.update_account(&account, 0).await.unwrap();

    // Same day: still capped.
    let denied = handler
        .claim_view_reward("a1", 1_000, test_now())
        .await
        .unwrap();
    assert!(!denied.awarded);

    // Next calendar day: daily counter resets.
    let next_day = test_now() + Duration::days(1);
    let awarded = handler
        .claim_view_reward("a1", 1_000, next_day)
        .await
        .unwrap();
    assert!(awarded.awarded);
    assert_eq!(awarded.coins, 10);

    // Month boundary resets the monthly counter.
    let mut account = store.fetch_account("a1").await.unwrap().unwrap();
    account.monthly_view_coins = 2_000;
    let version = account.version;
    account.version += 1;
    store.update_account(&account, version).await.unwrap();

    let next_month = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
    let outcome = handler
        .claim_view_reward("a1", 1_000, next_month)
        .await
        .unwrap();
    assert!(outcome.awarded);

    let account = store.fetch_account("a1").await.unwrap().unwrap();
    assert_eq!(account.monthly_view_coins, 10);
}

#[tokio::test]
async fn ad_cooldown_blocks_fourth_watch() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 0).await;

    let start = test_now();
    for i in 0..3 {
        handler
            .watch_ad("a1", start + Duration::minutes(i))
            .await
            .unwrap();
    }

    let blocked = handler.watch_ad("a1", start + Duration::minutes(3)).await;
    match blocked {
        Err(LedgerError::CooldownActive { remaining_minutes }) => {
            assert!(remaining_minutes > 0);
        }
        other => panic!("expected cooldown, got {:?}", other),
    }

    // Balance unchanged by the blocked watch.
    assert_eq!(handler.balance("a1").await.unwrap().coin_balance, 30);

    // After the cooldown window the next watch goes through.
    let outcome = handler
        .watch_ad("a1", start + Duration::minutes(20))
        .await
        .unwrap();
    assert_eq!(outcome.coins_earned, 10);
    assert_eq!(outcome.daily_ads_watched, 4);
}

#[tokio::test]
async fn ad_daily_limit_resets_next_day() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 0).await;

    let start = test_now();
    for i in 0..3 {
        handler
            .watch_ad("a1", start + Duration::minutes(i))
            .await
            .unwrap();
    }
    handler
        .watch_ad("a1", start + Duration::minutes(20))
        .await
        .unwrap();
    handler
        .watch_ad("a1", start + Duration::minutes(21))
        .await
        .unwrap();

    // Free tier allows five per day.
    let blocked = handler.watch_ad("a1", start + Duration::minutes(22)).await;
    assert!(matches!(
        blocked,
        Err(LedgerError::DailyLimitReached { limit: 5 })
    ));

    let outcome = handler
        .watch_ad("a1", start + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(outcome.daily_ads_watched, 1);
}

#[tokio::test]
async fn spin_limited_to_one_per_day() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "a1", 0).await;

    let outcome = handler.spin("a1", test_now()).await.unwrap();
    assert!([5, 10, 20, 50].contains(&outcome.coins_won));

    let again = handler.spin("a1", test_now() + Duration::hours(3)).await;
    assert!(matches!(again, Err(LedgerError::AlreadySpunToday)));

    let next_day = handler.spin("a1", test_now() + Duration::days(1)).await;
    assert!(next_day.is_ok());
}

#[test]
fn spin_rewards_come_from_the_configured_table() {
    let policy = RewardPolicy::default();

    for _ in 0..200 {
        let coins = draw_spin_reward(&policy.spin_rewards);
        assert!([5, 10, 20, 50].contains(&coins));
    }
}

#[tokio::test]
async fn upload_rewards_cap_with_one_time_bonus() {
    let policy = RewardPolicy {
        max_upload_posts: 3,
        ..RewardPolicy::default()
    };
    let (handler, store, _events) = build_handler(policy);
    seed_account(&store, "a1", 0).await;

    let first = handler.claim_upload_reward("a1", test_now()).await.unwrap();
    assert!(first.awarded);
    assert_eq!(first.coins, 50);
    assert!(!first.bonus_awarded);

    handler.claim_upload_reward("a1", test_now()).await.unwrap();

    // Reaching the maximum within the signup window grants the bonus once.
    let third = handler.claim_upload_reward("a1", test_now()).await.unwrap();
    assert!(third.awarded);
    assert!(third.bonus_awarded);
    assert_eq!(third.coins, 250);

    let fourth = handler.claim_upload_reward("a1", test_now()).await.unwrap();
    assert!(!fourth.awarded);
    assert_eq!(fourth.reason.as_deref(), Some("Max upload limit reached"));
}

#[tokio::test]
async fn upload_bonus_skipped_outside_signup_window() {
    let policy = RewardPolicy {
        max_upload_posts: 2,
        ..RewardPolicy::default()
    };
    let (handler, store, _events) = build_handler(policy);
    seed_account(&store, "a1", 0).await;

    let late = test_now() + Duration::days(8);
    handler.claim_upload_reward("a1", late).await.unwrap();
    let second = handler.claim_upload_reward("a1", late).await.unwrap();

    assert!(second.awarded);
    assert!(!second.bonus_awarded);
    assert_eq!(second.coins, 50);
}

#[tokio::test]
async fn upload_rewards_disabled_at_earning_ceiling() {
    let policy = RewardPolicy {
        reward_earning_ceiling: 100,
        ..RewardPolicy::default()
    };
    let (handler, store, _events) = build_handler(policy);
    let mut account = seed_account(&store, "a1", 0).await;
    account.total_coins_earned = 150;
    store.update_account(&account, 0).await.unwrap();

    let denied = handler.claim_upload_reward("a1", test_now()).await.unwrap();
    assert!(!denied.awarded);
    assert_eq!(denied.reason.as_deref(), Some("Upload rewards limit reached"));

    // The flag is now permanently off.
    let account = store.fetch_account("a1").await.unwrap().unwrap();
    assert!(!account.upload_rewards_enabled);

    let again = handler.claim_upload_reward("a1", test_now()).await.unwrap();
    assert_eq!(again.reason.as_deref(), Some("Upload rewards disabled"));
}

#[tokio::test]
async fn frozen_account_accepts_only_administrative_corrections() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    let mut account = seed_account(&store, "a1", 100).await;
    account.coins_frozen = true;
    account.account_status = AccountStatus::CoinsFrozen;
    store.update_account(&account, 0).await.unwrap();

    let award = handler
        .award("a1", 10, TransactionType::AdWatch, "ad".into(), None, test_now())
        .await;
    assert!(matches!(award, Err(LedgerError::AccountFrozen)));

    let adjust = handler
        .adjust("a1", -100, "Clawback after fraud review".into(), test_now())
        .await
        .unwrap();
    assert_eq!(adjust.balance_after, 0);
}

#[tokio::test]
async fn suspended_account_rejected_entirely() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    let mut account = seed_account(&store, "a1", 100).await;
    account.account_status = AccountStatus::Suspended;
    account.is_banned = true;
    store.update_account(&account, 0).await.unwrap();

    let award = handler
        .award("a1", 10, TransactionType::AdWatch, "ad".into(), None, test_now())
        .await;
    assert!(matches!(award, Err(LedgerError::AccountSuspended)));

    let adjust = handler
        .adjust("a1", 10, "Correction".into(), test_now())
        .await;
    assert!(matches!(adjust, Err(LedgerError::AccountSuspended)));
}

#[tokio::test]
async fn gift_moves_coins_between_accounts() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "sender", 100).await;
    seed_account(&store, "recipient", 0).await;

    handler
        .send_gift("sender", "recipient", 40, Some("gg".into()), test_now())
        .await
        .unwrap();

    assert_eq!(handler.balance("sender").await.unwrap().coin_balance, 60);

    let recipient = handler.balance("recipient").await.unwrap();
    assert_eq!(recipient.coin_balance, 40);
    assert_eq!(recipient.withdrawable_balance, 40);

    let sent = store.transactions_for("sender", 10).await.unwrap();
    assert_eq!(sent[0].tx_type, TransactionType::GiftSent);
    assert_eq!(sent[0].amount, -40);

    let received = store.transactions_for("recipient", 10).await.unwrap();
    assert_eq!(received[0].tx_type, TransactionType::GiftReceived);
    assert_eq!(received[0].amount, 40);
}

#[tokio::test]
async fn failed_gift_compensates_the_sender() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());
    seed_account(&store, "sender", 100).await;
    let mut recipient = seed_account(&store, "recipient", 0).await;
    recipient.account_status = AccountStatus::Suspended;
    recipient.is_banned = true;
    store.update_account(&recipient, 0).await.unwrap();

    let result = handler
        .send_gift("sender", "recipient", 40, None, test_now())
        .await;
    assert!(matches!(result, Err(LedgerError::AccountSuspended)));

    // Deduct plus compensating adjustment leave the sender whole.
    assert_eq!(handler.balance("sender").await.unwrap().coin_balance, 100);

    let mut records = store.transactions_for("sender", 10).await.unwrap();
    records.reverse();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].tx_type, TransactionType::GiftSent);
    assert_eq!(records[1].tx_type, TransactionType::AdminAdjustment);
    assert_eq!(records[1].amount, 40);
}

#[tokio::test]
async fn create_account_pays_welcome_and_referral_rewards() {
    let (handler, store, _events) = build_handler(RewardPolicy::default());

    let referrer = handler
        .create_account("alice".to_string(), None, test_now())
        .await
        .unwrap();
    assert_eq!(referrer.coin_balance, 100);

    let referred = handler
        .create_account("bob".to_string(), Some(referrer.id.clone()), test_now())
        .await
        .unwrap();
    assert_eq!(referred.coin_balance, 100);
    assert_eq!(referred.referred_by.as_deref(), Some(referrer.id.as_str()));

    let referrer = store.fetch_account(&referrer.id).await.unwrap().unwrap();
    assert_eq!(referrer.coin_balance, 200);
    assert_eq!(referrer.referral_count, 1);
}

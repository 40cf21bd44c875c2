use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::ledger::LedgerStore;
use super::signals::SignalStore;
use super::{CommitOutcome, StoreError};
use crate::models::accounts::Account;
use crate::models::fraud::{FraudIncident, FraudType};
use crate::models::sessions::Session;
use crate::models::transactions::{Transaction, TransactionType};

/// In-memory ledger store with the same versioned-commit contract as the
/// Postgres store. Backs the test suite and local development; the account
/// entry lock makes commit/update atomic per account.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    accounts: Arc<DashMap<String, Account>>,
    transactions: Arc<DashMap<String, Vec<Transaction>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn fetch_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).map(|entry| entry.clone()))
    }

    async fn commit(
        &self,
        account: &Account,
        expected_version: i64,
        record: &Transaction,
    ) -> Result<CommitOutcome, StoreError> {
        let mut entry = match self.accounts.get_mut(&account.id) {
            Some(entry) => entry,
            None => return Err(StoreError::Corrupt(format!("unknown account: {}", account.id))),
        };

        if entry.version != expected_version {
            return Ok(CommitOutcome::Conflict);
        }

        *entry = account.clone();
        self.transactions
            .entry(account.id.clone())
            .or_default()
            .push(record.clone());

        Ok(CommitOutcome::Committed)
    }

    async fn update_account(
        &self,
        account: &Account,
        expected_version: i64,
    ) -> Result<CommitOutcome, StoreError> {
        let mut entry = match self.accounts.get_mut(&account.id) {
            Some(entry) => entry,
            None => return Err(StoreError::Corrupt(format!("unknown account: {}", account.id))),
        };

        if entry.version != expected_version {
            return Ok(CommitOutcome::Conflict);
        }

        *entry = account.clone();

        Ok(CommitOutcome::Committed)
    }

    async fn transactions_for(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut records = self
            .transactions
            .get(account_id)
            .map(|entry| entry.clone())
            .unwrap_or_default();

        records.reverse();
        records.truncate(limit.max(0) as usize);

        Ok(records)
    }

    async fn transaction_count_since(
        &self,
        account_id: &str,
        tx_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let count = self
            .transactions
            .get(account_id)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|t| t.tx_type == tx_type && t.created_at >= since)
                    .count()
            })
            .unwrap_or(0);

        Ok(count as i64)
    }
}

/// In-memory session and incident log counterpart of the Postgres signal
/// store.
#[derive(Clone, Default)]
pub struct MemorySignalStore {
    sessions: Arc<RwLock<Vec<Session>>>,
    incidents: Arc<RwLock<Vec<FraudIncident>>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn latest_located_session(
        &self,
        account_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .iter()
            .filter(|s| s.account_id == account_id && s.coordinates().is_some())
            .max_by_key(|s| s.last_activity)
            .cloned())
    }

    async fn sessions_matching(
        &self,
        ip_address: &str,
        device_id: &str,
        exclude_account: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .iter()
            .filter(|s| {
                s.account_id != exclude_account
                    && (s.ip_address == ip_address || s.device_id == device_id)
                    && s.last_activity >= since
            })
            .cloned()
            .collect())
    }

    async fn shares_fingerprint(
        &self,
        account_id: &str,
        ip_address: &str,
        device_id: &str,
    ) -> Result<bool, StoreError> {
        let sessions = self.sessions.read().await;

        Ok(sessions.iter().any(|s| {
            s.account_id == account_id
                && (s.ip_address == ip_address || s.device_id == device_id)
        }))
    }

    async fn anonymizing_session_count(&self, account_id: &str) -> Result<i64, StoreError> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .iter()
            .filter(|s| s.account_id == account_id && s.ip_class.is_anonymizing())
            .count() as i64)
    }

    async fn distinct_device_count(&self, account_id: &str) -> Result<i64, StoreError> {
        let sessions = self.sessions.read().await;

        let mut devices: Vec<&str> = sessions
            .iter()
            .filter(|s| s.account_id == account_id)
            .map(|s| s.device_id.as_str())
            .collect();
        devices.sort_unstable();
        devices.dedup();

        Ok(devices.len() as i64)
    }

    async fn insert_incident(&self, incident: &FraudIncident) -> Result<(), StoreError> {
        self.incidents.write().await.push(incident.clone());
        Ok(())
    }

    async fn fetch_incident(&self, id: &str) -> Result<Option<FraudIncident>, StoreError> {
        let incidents = self.incidents.read().await;

        Ok(incidents.iter().find(|i| i.id == id).cloned())
    }

    async fn incidents_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FraudIncident>, StoreError> {
        let incidents = self.incidents.read().await;

        Ok(incidents
            .iter()
            .filter(|i| i.account_id == account_id && i.created_at >= since)
            .cloned()
            .collect())
    }

    async fn recent_incident_exists(
        &self,
        account_id: &str,
        fraud_type: FraudType,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let incidents = self.incidents.read().await;

        Ok(incidents.iter().any(|i| {
            i.account_id == account_id && i.fraud_type == fraud_type && i.created_at >= since
        }))
    }

    async fn update_incident_review(&self, incident: &FraudIncident) -> Result<(), StoreError> {
        let mut incidents = self.incidents.write().await;

        match incidents.iter_mut().find(|i| i.id == incident.id) {
            Some(stored) => {
                stored.action_taken = incident.action_taken;
                stored.action_details = incident.action_details.clone();
                stored.status = incident.status;
                stored.reviewed_by = incident.reviewed_by.clone();
                stored.reviewed_at = incident.reviewed_at;
                stored.review_notes = incident.review_notes.clone();
                Ok(())
            }
            None => Err(StoreError::Corrupt(format!(
                "unknown incident: {}",
                incident.id
            ))),
        }
    }
}

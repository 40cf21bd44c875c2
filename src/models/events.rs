use serde::Serialize;

use super::fraud::{AutomatedAction, FraudType, Severity};
use super::transactions::TransactionType;

/// Domain events fanned out to downstream consumers (notifications,
/// analytics). Publication is best-effort; a failed publish never rolls back
/// the mutation that produced it.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    TransactionCreated {
        account_id: String,
        transaction_id: String,
        tx_type: TransactionType,
        amount: i64,
        balance_after: i64,
    },
    FraudIncidentCreated {
        account_id: String,
        incident_id: String,
        fraud_type: FraudType,
        severity: Severity,
    },
    AccountActioned {
        account_id: String,
        action: AutomatedAction,
        reason: String,
    },
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::StoreError;
use crate::models::fraud::{
    AutomatedAction, DetectionMethod, Evidence, FraudIncident, FraudType, ReviewStatus, Severity,
};
use crate::models::sessions::{GeoLocation, GeoPoint, IpClass, Session};

/// Per-session fingerprints and the fraud-incident log. Sessions never
/// mutate balances; incidents are append-only apart from their review
/// fields.
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// The account's most recent session that carries coordinates.
    async fn latest_located_session(
        &self,
        account_id: &str,
    ) -> Result<Option<Session>, StoreError>;

    /// Sessions of *other* accounts sharing the IP or device id, active
    /// since `since`.
    async fn sessions_matching(
        &self,
        ip_address: &str,
        device_id: &str,
        exclude_account: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError>;

    /// Whether `account_id` has any session with this IP or device id.
    async fn shares_fingerprint(
        &self,
        account_id: &str,
        ip_address: &str,
        device_id: &str,
    ) -> Result<bool, StoreError>;

    async fn anonymizing_session_count(&self, account_id: &str) -> Result<i64, StoreError>;

    async fn distinct_device_count(&self, account_id: &str) -> Result<i64, StoreError>;

    async fn insert_incident(&self, incident: &FraudIncident) -> Result<(), StoreError>;

    async fn fetch_incident(&self, id: &str) -> Result<Option<FraudIncident>, StoreError>;

    async fn incidents_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FraudIncident>, StoreError>;

    async fn recent_incident_exists(
        &self,
        account_id: &str,
        fraud_type: FraudType,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Persists the review fields of an already-logged incident.
    async fn update_incident_review(&self, incident: &FraudIncident) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgSignalStore {
    conn: PgPool,
}

impl PgSignalStore {
    pub fn new(conn: PgPool) -> Self {
        PgSignalStore { conn }
    }
}

fn session_from_row(row: &PgRow) -> Result<Session, StoreError> {
    let ip_class: String = row.try_get("ip_class")?;
    let reasons: Option<String> = row.try_get("suspicious_reasons")?;
    let lat: Option<f64> = row.try_get("lat")?;
    let lon: Option<f64> = row.try_get("lon")?;

    let suspicious_reasons = match reasons {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(format!("suspicious reasons: {}", e)))?,
        None => Vec::new(),
    };

    Ok(Session {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        device_id: row.try_get("device_id")?,
        ip_address: row.try_get("ip_address")?,
        ip_class: IpClass::parse(&ip_class)
            .ok_or_else(|| StoreError::Corrupt(format!("ip class: {}", ip_class)))?,
        isp: row.try_get("isp")?,
        location: GeoLocation {
            country: row.try_get("country")?,
            region: row.try_get("region")?,
            city: row.try_get("city")?,
            coordinates: match (lat, lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
                _ => None,
            },
        },
        user_agent: row.try_get("user_agent")?,
        is_suspicious: row.try_get("is_suspicious")?,
        suspicious_reasons,
        login_at: row.try_get("login_at")?,
        last_activity: row.try_get("last_activity")?,
    })
}

fn incident_from_row(row: &PgRow) -> Result<FraudIncident, StoreError> {
    let fraud_type: String = row.try_get("fraud_type")?;
    let severity: String = row.try_get("severity")?;
    let action: String = row.try_get("action_taken")?;
    let status: String = row.try_get("status")?;
    let detection: String = row.try_get("detection")?;
    let evidence: Option<String> = row.try_get("evidence")?;

    let evidence = match evidence {
        Some(raw) => Some(
            serde_json::from_str(&raw)
                .map_err(|e| StoreError::Corrupt(format!("evidence: {}", e)))?,
        ),
        None => None,
    };

    Ok(FraudIncident {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        fraud_type: FraudType::parse(&fraud_type)
            .ok_or_else(|| StoreError::Corrupt(format!("fraud type: {}", fraud_type)))?,
        severity: Severity::parse(&severity)
            .ok_or_else(|| StoreError::Corrupt(format!("severity: {}", severity)))?,
        description: row.try_get("description")?,
        evidence,
        ip_address: row.try_get("ip_address")?,
        device_id: row.try_get("device_id")?,
        action_taken: AutomatedAction::parse(&action)
            .ok_or_else(|| StoreError::Corrupt(format!("action: {}", action)))?,
        action_details: row.try_get("action_details")?,
        status: ReviewStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("review status: {}", status)))?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at: row.try_get("reviewed_at")?,
        review_notes: row.try_get("review_notes")?,
        risk_contribution: row.try_get("risk_contribution")?,
        detection: DetectionMethod::parse(&detection)
            .ok_or_else(|| StoreError::Corrupt(format!("detection method: {}", detection)))?,
        created_at: row.try_get("created_at")?,
    })
}

fn encode_evidence(evidence: &Option<Evidence>) -> Result<Option<String>, StoreError> {
    evidence
        .as_ref()
        .map(|e| serde_json::to_string(e).map_err(|e| StoreError::Corrupt(e.to_string())))
        .transpose()
}

#[async_trait]
impl SignalStore for PgSignalStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let reasons = serde_json::to_string(&session.suspicious_reasons)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sessions
            (id, account_id, device_id, ip_address, ip_class, isp, country,
             region, city, lat, lon, user_agent, is_suspicious,
             suspicious_reasons, login_at, last_activity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16)
            "#,
        )
        .bind(&session.id)
        .bind(&session.account_id)
        .bind(&session.device_id)
        .bind(&session.ip_address)
        .bind(session.ip_class.as_str())
        .bind(session.isp.as_deref())
        .bind(session.location.country.as_deref())
        .bind(session.location.region.as_deref())
        .bind(session.location.city.as_deref())
        .bind(session.location.coordinates.map(|c| c.lat))
        .bind(session.location.coordinates.map(|c| c.lon))
        .bind(session.user_agent.as_deref())
        .bind(session.is_suspicious)
        .bind(reasons)
        .bind(session.login_at)
        .bind(session.last_activity)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    async fn latest_located_session(
        &self,
        account_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM sessions
            WHERE account_id = $1 AND lat IS NOT NULL AND lon IS NOT NULL
            ORDER BY last_activity DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.conn)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn sessions_matching(
        &self,
        ip_address: &str,
        device_id: &str,
        exclude_account: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM sessions
            WHERE account_id != $1
              AND (ip_address = $2 OR device_id = $3)
              AND last_activity >= $4
            ORDER BY last_activity DESC
            "#,
        )
        .bind(exclude_account)
        .bind(ip_address)
        .bind(device_id)
        .bind(since)
        .fetch_all(&self.conn)
        .await?;

        rows.iter().map(session_from_row).collect()
    }

    async fn shares_fingerprint(
        &self,
        account_id: &str,
        ip_address: &str,
        device_id: &str,
    ) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(1) FROM sessions
            WHERE account_id = $1 AND (ip_address = $2 OR device_id = $3)
            "#,
        )
        .bind(account_id)
        .bind(ip_address)
        .bind(device_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(count > 0)
    }

    async fn anonymizing_session_count(&self, account_id: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM sessions WHERE account_id = $1 AND ip_class IN ('vpn', 'proxy', 'tor')",
        )
        .bind(account_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(count)
    }

    async fn distinct_device_count(&self, account_id: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT device_id) FROM sessions WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(count)
    }

    async fn insert_incident(&self, incident: &FraudIncident) -> Result<(), StoreError> {
        let evidence = encode_evidence(&incident.evidence)?;

        sqlx::query(
            r#"
            INSERT INTO fraud_incidents
            (id, account_id, fraud_type, severity, description, evidence,
             ip_address, device_id, action_taken, action_details, status,
             reviewed_by, reviewed_at, review_notes, risk_contribution,
             detection, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17)
            "#,
        )
        .bind(&incident.id)
        .bind(&incident.account_id)
        .bind(incident.fraud_type.as_str())
        .bind(incident.severity.as_str())
        .bind(&incident.description)
        .bind(evidence)
        .bind(incident.ip_address.as_deref())
        .bind(incident.device_id.as_deref())
        .bind(incident.action_taken.as_str())
        .bind(incident.action_details.as_deref())
        .bind(incident.status.as_str())
        .bind(incident.reviewed_by.as_deref())
        .bind(incident.reviewed_at)
        .bind(incident.review_notes.as_deref())
        .bind(incident.risk_contribution)
        .bind(incident.detection.as_str())
        .bind(incident.created_at)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    async fn fetch_incident(&self, id: &str) -> Result<Option<FraudIncident>, StoreError> {
        let row = sqlx::query("SELECT * FROM fraud_incidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        row.as_ref().map(incident_from_row).transpose()
    }

    async fn incidents_since(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FraudIncident>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM fraud_incidents
            WHERE account_id = $1 AND created_at >= $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .bind(since)
        .fetch_all(&self.conn)
        .await?;

        rows.iter().map(incident_from_row).collect()
    }

    async fn recent_incident_exists(
        &self,
        account_id: &str,
        fraud_type: FraudType,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(1) FROM fraud_incidents
            WHERE account_id = $1 AND fraud_type = $2 AND created_at >= $3
            "#,
        )
        .bind(account_id)
        .bind(fraud_type.as_str())
        .bind(since)
        .fetch_one(&self.conn)
        .await?;

        Ok(count > 0)
    }

    async fn update_incident_review(&self, incident: &FraudIncident) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE fraud_incidents SET
                action_taken = $2,
                action_details = $3,
                status = $4,
                reviewed_by = $5,
                reviewed_at = $6,
                review_notes = $7
            WHERE id = $1
            "#,
        )
        .bind(&incident.id)
        .bind(incident.action_taken.as_str())
        .bind(incident.action_details.as_deref())
        .bind(incident.status.as_str())
        .bind(incident.reviewed_by.as_deref())
        .bind(incident.reviewed_at)
        .bind(incident.review_notes.as_deref())
        .execute(&self.conn)
        .await?;

        Ok(())
    }
}

use std::time::Duration;

use async_trait::async_trait;

use crate::models::sessions::{GeoPoint, IpClass};

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("lookup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// What the reputation provider knows about an IP address.
#[derive(Clone, Debug)]
pub struct IpIntel {
    pub class: IpClass,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub coordinates: Option<GeoPoint>,
    pub isp: Option<String>,
}

/// External IP reputation lookup. Callers treat any error as "no signal"
/// (fail-open); only an explicit classification may count against a user.
#[async_trait]
pub trait IpReputationResolver: Send + Sync {
    async fn resolve(&self, ip_address: &str) -> Result<IpIntel, ResolverError>;
}

/// ipapi-style JSON endpoint: `GET {base}/{ip}/json/`. The request timeout
/// bounds how long a slow provider can hold up a login.
pub struct HttpIpReputationResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIpReputationResolver {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(HttpIpReputationResolver { client, base_url })
    }

    fn classify(threat: &serde_json::Value) -> IpClass {
        if threat["is_tor"].as_bool().unwrap_or(false) {
            IpClass::Tor
        } else if threat["is_vpn"].as_bool().unwrap_or(false) {
            IpClass::Vpn
        } else if threat["is_proxy"].as_bool().unwrap_or(false) {
            IpClass::Proxy
        } else if threat["is_datacenter"].as_bool().unwrap_or(false) {
            IpClass::Datacenter
        } else {
            IpClass::Residential
        }
    }
}

#[async_trait]
impl IpReputationResolver for HttpIpReputationResolver {
    async fn resolve(&self, ip_address: &str) -> Result<IpIntel, ResolverError> {
        let payload: serde_json::Value = self
            .client
            .get(format!("{}/{}/json/", self.base_url, ip_address))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if payload["error"].as_bool().unwrap_or(false) {
            return Err(ResolverError::Malformed(
                payload["reason"].as_str().unwrap_or("unknown").to_string(),
            ));
        }

        let coordinates = match (payload["latitude"].as_f64(), payload["longitude"].as_f64()) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        };

        Ok(IpIntel {
            class: Self::classify(&payload["threat"]),
            country: payload["country_name"].as_str().map(str::to_string),
            region: payload["region"].as_str().map(str::to_string),
            city: payload["city"].as_str().map(str::to_string),
            coordinates,
            isp: payload["org"].as_str().map(str::to_string),
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IpClass {
    Residential,
    Datacenter,
    Vpn,
    Proxy,
    Tor,
    Unknown,
}

impl IpClass {
    /// VPN, proxy and Tor exits hide the real origin of the traffic.
    pub fn is_anonymizing(&self) -> bool {
        matches!(self, IpClass::Vpn | IpClass::Proxy | IpClass::Tor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpClass::Residential => "residential",
            IpClass::Datacenter => "datacenter",
            IpClass::Vpn => "vpn",
            IpClass::Proxy => "proxy",
            IpClass::Tor => "tor",
            IpClass::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "residential" => Some(IpClass::Residential),
            "datacenter" => Some(IpClass::Datacenter),
            "vpn" => Some(IpClass::Vpn),
            "proxy" => Some(IpClass::Proxy),
            "tor" => Some(IpClass::Tor),
            "unknown" => Some(IpClass::Unknown),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Great-circle distance in kilometers (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

/// One record per login/device context. Read by the fraud detectors; never
/// touches balances.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    pub id: String,
    pub account_id: String,
    pub device_id: String,
    pub ip_address: String,
    pub ip_class: IpClass,
    pub isp: Option<String>,
    pub location: GeoLocation,
    pub user_agent: Option<String>,
    pub is_suspicious: bool,
    pub suspicious_reasons: Vec<String>,
    pub login_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(
        account_id: &str,
        device_id: &str,
        ip_address: &str,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Session {
            id: uuid::Uuid::new_v4().hyphenated().to_string(),
            account_id: account_id.to_string(),
            device_id: device_id.to_string(),
            ip_address: ip_address.to_string(),
            ip_class: IpClass::Unknown,
            isp: None,
            location: GeoLocation::default(),
            user_agent,
            is_suspicious: false,
            suspicious_reasons: Vec::new(),
            login_at: now,
            last_activity: now,
        }
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.location.coordinates
    }
}

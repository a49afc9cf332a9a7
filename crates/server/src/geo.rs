//! IP-to-organization lookup via ip-api.com

use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use career_assistant_config::GeoConfig;
use career_assistant_core::{Error, GeoInfo, GeoLookupProvider, Result};

/// `GET {endpoint}` with `{ip}` substituted
pub struct IpApiLookup {
    endpoint: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl IpApiLookup {
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            timeout_ms: config.timeout_ms,
            client,
        })
    }

    fn url_for(&self, ip: IpAddr) -> String {
        self.endpoint.replace("{ip}", &ip.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    org: Option<String>,
}

impl IpApiResponse {
    fn into_geo(self) -> Result<GeoInfo> {
        if self.status != "success" {
            return Err(Error::InvalidResponse(
                self.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        Ok(GeoInfo {
            organization: non_empty(self.org).or_else(|| non_empty(self.isp)),
            city: non_empty(self.city),
            region: non_empty(self.region_name),
            country: non_empty(self.country),
        })
    }
}

#[async_trait]
impl GeoLookupProvider for IpApiLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoInfo> {
        let response = self
            .client
            .get(self.url_for(ip))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout_ms)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::Upstream {
                status: response.status().as_u16(),
                detail: String::new(),
            });
        }

        response
            .json::<IpApiResponse>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?
            .into_geo()
    }
}

/// Addresses that never resolve to an organization
pub fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation())
        },
        IpAddr::V6(v6) => {
            let unique_local = (v6.segments()[0] & 0xfe00) == 0xfc00;
            let link_local = (v6.segments()[0] & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        },
    }
}

//! IP enrichment capability

use async_trait::async_trait;
use std::net::IpAddr;

use crate::signals::GeoInfo;
use crate::Result;

/// Resolves an address to the organization and place that own it.
///
/// Callers treat every error as "no company info".
#[async_trait]
pub trait GeoLookupProvider: Send + Sync + 'static {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoInfo>;
}

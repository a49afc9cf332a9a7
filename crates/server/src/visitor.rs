//! Visitor Signal Collector
//!
//! Builds [`VisitorSignals`] from request headers, browser telemetry and an
//! optional geo lookup. Lookup failures degrade to "no company info".

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::time::Duration;

use career_assistant_core::{BrowserTelemetry, GeoLookupProvider, VisitorSignals};

use crate::geo::is_public;

/// Client address from proxy headers, first hop wins
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .or_else(|| header("x-real-ip"))
        .or_else(|| header("x-nf-client-connection-ip"))
        .and_then(|v| v.trim().parse().ok())
}

/// Collect signals for one request
pub async fn collect(
    headers: &HeaderMap,
    telemetry: Option<&BrowserTelemetry>,
    geo: Option<&dyn GeoLookupProvider>,
    geo_timeout: Duration,
    now: DateTime<Utc>,
) -> VisitorSignals {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    let mut signals = VisitorSignals::empty(now);
    signals.referrer_url = header("referer");
    signals.user_agent = header("user-agent");
    if let Some(telemetry) = telemetry {
        signals = signals.with_telemetry(telemetry);
    }

    let (Some(geo), Some(ip)) = (geo, client_ip(headers)) else {
        return signals;
    };
    if !is_public(&ip) {
        tracing::debug!(%ip, "Skipping geo lookup for non-public address");
        return signals;
    }

    match tokio::time::timeout(geo_timeout, geo.lookup(ip)).await {
        Ok(Ok(info)) => {
            tracing::debug!(
                %ip,
                organization = ?info.organization,
                "Geo lookup resolved"
            );
            signals.with_geo(&info)
        },
        Ok(Err(e)) => {
            tracing::warn!(%ip, error = %e, "Geo lookup failed");
            signals
        },
        Err(_) => {
            tracing::warn!(%ip, timeout_ms = geo_timeout.as_millis() as u64, "Geo lookup timed out");
            signals
        },
    }
}

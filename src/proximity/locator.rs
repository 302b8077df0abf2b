// src/proximity/locator.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::geo::Coordinates;

/// Best-effort source of the requester's live position.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
    fn name(&self) -> &'static str;
}

/// Always fails. Used server-side, where there is no device to ask.
pub struct UnavailableLocator;

#[async_trait]
impl DeviceLocator for UnavailableLocator {
    async fn locate(&self) -> Result<Coordinates> {
        Err(anyhow!("geolocation unavailable"))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Returns a fixed position (demos, tests).
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl DeviceLocator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates> {
        Ok(self.0)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Ask the locator once, bounded by `timeout`. Any failure (denied, invalid
/// fix, timeout) comes back as `None`.
pub async fn locate_within(locator: &dyn DeviceLocator, timeout: Duration) -> Option<Coordinates> {
    match tokio::time::timeout(timeout, locator.locate()).await {
        Ok(Ok(c)) if c.is_valid() => Some(c),
        Ok(Ok(c)) => {
            tracing::warn!(target: "proximity", locator = locator.name(), ?c, "invalid coordinates from locator");
            None
        }
        Ok(Err(e)) => {
            tracing::info!(target: "proximity", locator = locator.name(), error = %e, "geolocation failed");
            None
        }
        Err(_) => {
            tracing::info!(
                target: "proximity",
                locator = locator.name(),
                timeout_ms = timeout.as_millis() as u64,
                "geolocation timed out"
            );
            None
        }
    }
}

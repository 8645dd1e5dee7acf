//! Sources of a live device coordinate.

use std::future::Future;
use std::sync::Arc;

use reqwest::{Client, Url};
use sandhai_core::Coordinate;
use serde::Deserialize;

use super::http::{build_client, parse_base_url};
use crate::error::{ClientBuildError, SensorError};

/// Something that can report where the device is right now.
///
/// Implementations need not enforce a deadline; [`super::LocationStore`]
/// bounds every read with its own timeout.
pub trait LocationSensor: Send + Sync {
    fn read(&self) -> impl Future<Output = Result<Coordinate, SensorError>> + Send;
}

impl<T: LocationSensor + ?Sized> LocationSensor for Arc<T> {
    async fn read(&self) -> Result<Coordinate, SensorError> {
        (**self).read().await
    }
}

/// Approximate device position from an ip-api compatible endpoint.
#[derive(Debug)]
pub struct IpLocator {
    client: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocator {
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if the HTTP client cannot be built or the
    /// base URL does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientBuildError> {
        let base = parse_base_url(base_url)?;
        let endpoint = base.join("json").map_err(|e| ClientBuildError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            endpoint,
        })
    }

    async fn lookup(&self) -> Result<Coordinate, SensorError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SensorError::Unavailable(e.to_string()))?;

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| SensorError::Unavailable(format!("unreadable locator response: {e}")))?;

        if body.status != "success" {
            return Err(SensorError::Unavailable(
                body.message
                    .unwrap_or_else(|| format!("locator status '{}'", body.status)),
            ));
        }

        Coordinate::from_parts(body.lat, body.lon).ok_or_else(|| {
            SensorError::Unavailable("locator returned no usable coordinate".to_string())
        })
    }
}

impl LocationSensor for IpLocator {
    async fn read(&self) -> Result<Coordinate, SensorError> {
        self.lookup().await
    }
}

/// The sensor chosen at startup.
#[derive(Debug)]
pub enum Sensor {
    Ip(IpLocator),
    /// A coordinate supplied by the caller, e.g. from a GPS fix on the command line.
    Fixed(Coordinate),
    Disabled,
}

impl LocationSensor for Sensor {
    async fn read(&self) -> Result<Coordinate, SensorError> {
        match self {
            Sensor::Ip(locator) => locator.read().await,
            Sensor::Fixed(coordinate) => Ok(*coordinate),
            Sensor::Disabled => Err(SensorError::Unavailable(
                "no location sensor configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_sensor_reports_its_coordinate() {
        let here = Coordinate::new(11.0168, 76.9558).unwrap();
        assert_eq!(Sensor::Fixed(here).read().await, Ok(here));
    }

    #[tokio::test]
    async fn disabled_sensor_is_unavailable() {
        assert!(matches!(
            Sensor::Disabled.read().await,
            Err(SensorError::Unavailable(_))
        ));
    }

    #[test]
    fn ip_locator_targets_json_endpoint() {
        let locator = IpLocator::new("http://ip-api.example.com", 5, "test").unwrap();
        assert_eq!(locator.endpoint.as_str(), "http://ip-api.example.com/json");
    }
}

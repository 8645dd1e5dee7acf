//! Coordinate → human-readable place lookup.

use std::future::Future;
use std::sync::Arc;

use reqwest::{Client, Url};
use sandhai_core::Coordinate;
use serde::Deserialize;

use super::http::{build_client, parse_base_url};
use crate::error::{ClientBuildError, GeocodeError};

/// Place names for a coordinate. Either part may be missing from the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPlace {
    pub city: Option<String>,
    pub area: Option<String>,
}

pub trait ReverseGeocoder: Send + Sync {
    fn reverse(
        &self,
        at: Coordinate,
    ) -> impl Future<Output = Result<ResolvedPlace, GeocodeError>> + Send;
}

impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Arc<T> {
    async fn reverse(&self, at: Coordinate) -> Result<ResolvedPlace, GeocodeError> {
        (**self).reverse(at).await
    }
}

/// Client for a Nominatim-compatible `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    road: Option<String>,
}

impl Address {
    fn into_place(self) -> ResolvedPlace {
        ResolvedPlace {
            city: first_present([self.city, self.town, self.village]),
            area: first_present([self.suburb, self.neighbourhood, self.road]),
        }
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_owned())
        .find(|s| !s.is_empty())
}

impl NominatimGeocoder {
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] if the HTTP client cannot be built or
    /// `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientBuildError> {
        let endpoint = parse_base_url(base_url)?
            .join("reverse")
            .map_err(|e| ClientBuildError::InvalidUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            endpoint,
        })
    }

    fn reverse_url(&self, at: Coordinate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &at.latitude.to_string())
            .append_pair("lon", &at.longitude.to_string())
            .append_pair("zoom", "18")
            .append_pair("addressdetails", "1");
        url
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, at: Coordinate) -> Result<ResolvedPlace, GeocodeError> {
        let url = self.reverse_url(at);
        let body: ReverseResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        body.address
            .map(Address::into_place)
            .ok_or_else(|| GeocodeError::MissingAddress {
                context: at.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder(base: &str) -> NominatimGeocoder {
        NominatimGeocoder::new(base, 5, "sandhai-test/0.1").expect("geocoder")
    }

    #[test]
    fn reverse_url_carries_coordinate_and_detail_flags() {
        let url = geocoder("https://nominatim.example.org")
            .reverse_url(Coordinate::new(13.08, 80.27).unwrap());
        assert_eq!(
            url.as_str(),
            "https://nominatim.example.org/reverse?format=json&lat=13.08&lon=80.27&zoom=18&addressdetails=1"
        );
    }

    #[test]
    fn reverse_url_keeps_base_path() {
        let url = geocoder("https://geo.example.org/nominatim/")
            .reverse_url(Coordinate::new(1.5, 2.5).unwrap());
        assert!(url.as_str().starts_with("https://geo.example.org/nominatim/reverse?"));
    }

    #[test]
    fn town_stands_in_for_missing_city() {
        let place = Address {
            town: Some("Tambaram".to_string()),
            neighbourhood: Some("Selaiyur".to_string()),
            ..Address::default()
        }
        .into_place();
        assert_eq!(place.city.as_deref(), Some("Tambaram"));
        assert_eq!(place.area.as_deref(), Some("Selaiyur"));
    }

    #[test]
    fn blank_fields_are_skipped() {
        let place = Address {
            city: Some("  ".to_string()),
            village: Some("Mamallapuram".to_string()),
            ..Address::default()
        }
        .into_place();
        assert_eq!(place.city.as_deref(), Some("Mamallapuram"));
        assert!(place.area.is_none());
    }
}

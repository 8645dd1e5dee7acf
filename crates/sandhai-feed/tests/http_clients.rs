//! Integration tests for the Nominatim geocoder and ip-api locator using wiremock.

use sandhai_core::Coordinate;
use sandhai_feed::location::{IpLocator, LocationSensor, NominatimGeocoder, ReverseGeocoder};
use sandhai_feed::{GeocodeError, SensorError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "sandhai-test/0.1";

fn chennai() -> Coordinate {
    Coordinate::new(13.0827, 80.2707).expect("valid coordinate")
}

#[tokio::test]
async fn reverse_geocode_reads_city_and_suburb() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "display_name": "Egmore, Chennai, Tamil Nadu, India",
        "address": {
            "suburb": "Egmore",
            "city": "Chennai",
            "state": "Tamil Nadu",
            "country": "India"
        }
    });

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(query_param("lat", "13.0827"))
        .and(query_param("lon", "80.2707"))
        .and(header("user-agent", UA))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&server.uri(), 5, UA).expect("geocoder");
    let place = geocoder.reverse(chennai()).await.expect("should geocode");

    assert_eq!(place.city.as_deref(), Some("Chennai"));
    assert_eq!(place.area.as_deref(), Some("Egmore"));
}

#[tokio::test]
async fn reverse_geocode_falls_through_to_village_and_road() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "address": { "village": "Kovalam", "road": "East Coast Road" }
    });

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&server.uri(), 5, UA).expect("geocoder");
    let place = geocoder.reverse(chennai()).await.expect("should geocode");

    assert_eq!(place.city.as_deref(), Some("Kovalam"));
    assert_eq!(place.area.as_deref(), Some("East Coast Road"));
}

#[tokio::test]
async fn reverse_geocode_without_address_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Unable to geocode" })),
        )
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&server.uri(), 5, UA).expect("geocoder");
    let err = geocoder.reverse(chennai()).await.unwrap_err();
    assert!(matches!(err, GeocodeError::MissingAddress { .. }));
}

#[tokio::test]
async fn reverse_geocode_server_error_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&server.uri(), 5, UA).expect("geocoder");
    let err = geocoder.reverse(chennai()).await.unwrap_err();
    assert!(matches!(err, GeocodeError::Http(_)));
}

#[tokio::test]
async fn ip_locator_reads_coordinate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "city": "Chennai",
            "lat": 13.0878,
            "lon": 80.2785
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::new(&server.uri(), 5, UA).expect("locator");
    let coordinate = locator.read().await.expect("should locate");
    assert_eq!(coordinate, Coordinate::new(13.0878, 80.2785).unwrap());
}

#[tokio::test]
async fn ip_locator_failure_status_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::new(&server.uri(), 5, UA).expect("locator");
    assert_eq!(
        locator.read().await,
        Err(SensorError::Unavailable("private range".to_string()))
    );
}

#[tokio::test]
async fn ip_locator_out_of_range_coordinate_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 123.0,
            "lon": 80.0
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::new(&server.uri(), 5, UA).expect("locator");
    assert!(matches!(
        locator.read().await,
        Err(SensorError::Unavailable(_))
    ));
}

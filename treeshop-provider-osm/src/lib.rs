//! Transport provider backed by OpenStreetMap services: Nominatim for
//! geocoding and OSRM for driving routes.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use treeshop_core::{
    model::{Coordinate, Route, TravelMode},
    ports::{GeocodePort, PortError, RoutePort, TransportProvider},
};

/// Public Nominatim instance.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
/// Public OSRM demo server.
pub const OSRM_URL: &str = "https://router.project-osrm.org";

/// Single hit from /search?format=json
#[derive(Debug, Deserialize)]
struct Place {
    // Nominatim sends coordinates as strings
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Response from /route/v1/{profile}/{coordinates}
#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<RouteEntry>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    /// seconds
    duration: f64,
    /// meters
    distance: f64,
}

/// Address and postal code lookup through Nominatim.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    country_codes: Option<String>,
}

impl NominatimGeocoder {
    /// Create a geocoder against the public Nominatim instance.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: NOMINATIM_URL.to_owned(),
            country_codes: None,
        }
    }

    /// Point the geocoder at another Nominatim deployment.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url.into());
        self
    }

    /// Restrict matches to comma-separated ISO 3166-1 alpha-2 codes, e.g. `us`.
    #[must_use]
    pub fn with_country_codes(mut self, codes: impl Into<String>) -> Self {
        let codes = codes.into();
        self.country_codes = (!codes.trim().is_empty()).then_some(codes);
        self
    }
}

#[async_trait]
impl GeocodePort for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, PortError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let mut req = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")]);
        if let Some(codes) = &self.country_codes {
            req = req.query(&[("countrycodes", codes.as_str())]);
        }

        let places = fetch_json::<Vec<Place>>(req).await?;
        let Some(place) = places.into_iter().next() else {
            tracing::debug!(query, "no geocoding match");
            return Ok(None);
        };

        let coordinate = Coordinate {
            latitude: parse_degrees(&place.lat)?,
            longitude: parse_degrees(&place.lon)?,
        };
        tracing::debug!(query, place = %place.display_name, ?coordinate, "geocoded");
        Ok(Some(coordinate))
    }
}

/// Driving directions through an OSRM server.
pub struct OsrmRouter {
    client: Client,
    base_url: String,
}

impl OsrmRouter {
    /// Create a router against the public OSRM demo server.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OSRM_URL.to_owned(),
        }
    }

    /// Point the router at another OSRM deployment.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url.into());
        self
    }
}

#[async_trait]
impl RoutePort for OsrmRouter {
    async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TravelMode,
    ) -> Result<Option<Route>, PortError> {
        let profile = match mode {
            TravelMode::Driving => "driving",
        };
        // OSRM wants lon,lat pairs
        let url = format!(
            "{}/route/v1/{profile}/{},{};{},{}",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude
        );

        let resp = self
            .client
            .get(url)
            .query(&[("overview", "false")])
            .send()
            .await?;
        // OSRM reports NoRoute with a 400 and a JSON body; only server errors are fatal
        let resp = if resp.status().is_server_error() {
            resp.error_for_status()?
        } else {
            resp
        };
        let body = resp.json::<RouteResponse>().await?;

        match body.code.as_str() {
            "Ok" => Ok(body.routes.into_iter().next().map(|entry| Route {
                expected_travel_secs: entry.duration,
                distance_meters: entry.distance,
            })),
            "NoRoute" | "NoSegment" => {
                tracing::debug!(code = %body.code, "no route between points");
                Ok(None)
            }
            other => Err(PortError::UnexpectedResponse(format!(
                "OSRM returned {other}: {}",
                body.message.unwrap_or_default()
            ))),
        }
    }
}

/// Where the provider sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Nominatim base URL.
    pub geocoder_url: String,
    /// OSRM base URL.
    pub router_url: String,
    /// Comma-separated country codes; empty means worldwide.
    pub country_codes: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoder_url: NOMINATIM_URL.to_owned(),
            router_url: OSRM_URL.to_owned(),
            country_codes: String::new(),
        }
    }
}

/// Build the provider bundle against the public OpenStreetMap services.
#[must_use]
pub fn provider(client: Client) -> TransportProvider {
    provider_with(client, &Endpoints::default())
}

/// Build the provider bundle against the given deployments.
#[must_use]
pub fn provider_with(client: Client, endpoints: &Endpoints) -> TransportProvider {
    let geocoder = NominatimGeocoder::new(client.clone())
        .with_base_url(endpoints.geocoder_url.as_str())
        .with_country_codes(endpoints.country_codes.as_str());
    let router = OsrmRouter::new(client).with_base_url(endpoints.router_url.as_str());

    TransportProvider {
        name: String::from("openstreetmap"),
        geocoder: Arc::new(geocoder),
        router: Arc::new(router),
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}

fn parse_degrees(raw: &str) -> Result<f64, PortError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|err| PortError::UnexpectedResponse(format!("bad coordinate {raw:?}: {err}")))
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const YARD: Coordinate = Coordinate {
        latitude: 45.52,
        longitude: -122.68,
    };
    const SITE: Coordinate = Coordinate {
        latitude: 45.31,
        longitude: -122.97,
    };

    #[tokio::test]
    async fn geocodes_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "97140"))
            .and(query_param("countrycodes", "us"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"lat": "45.3573", "lon": "-122.8401", "display_name": "Sherwood, Oregon, 97140"},
                {"lat": "0", "lon": "0", "display_name": "ignored"}
            ])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(Client::new())
            .with_base_url(format!("{}/", server.uri()))
            .with_country_codes("us");

        let coordinate = geocoder
            .geocode("97140")
            .await
            .expect("request succeeds")
            .expect("match found");
        assert!((coordinate.latitude - 45.3573).abs() < 1e-9);
        assert!((coordinate.longitude + 122.8401).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_search_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(Client::new()).with_base_url(server.uri());
        let result = geocoder.geocode("00000").await.expect("request succeeds");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn geocoder_server_error_is_port_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(Client::new()).with_base_url(server.uri());
        let result = geocoder.geocode("97140").await;
        assert!(matches!(result, Err(PortError::Network(_))));
    }

    #[tokio::test]
    async fn malformed_coordinate_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"lat": "north-ish", "lon": "-122.8"}])),
            )
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(Client::new()).with_base_url(server.uri());
        let result = geocoder.geocode("97140").await;
        assert!(matches!(result, Err(PortError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn routes_with_lon_lat_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/route/v1/driving/-122.68,45.52;-122.97,45.31"))
            .and(query_param("overview", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "Ok",
                "routes": [{"duration": 5400.0, "distance": 98_000.0}]
            })))
            .mount(&server)
            .await;

        let router = OsrmRouter::new(Client::new()).with_base_url(server.uri());
        let route = router
            .route(YARD, SITE, TravelMode::Driving)
            .await
            .expect("request succeeds")
            .expect("route found");
        assert!((route.expected_travel_secs - 5400.0).abs() < f64::EPSILON);
        assert!((route.distance_meters - 98_000.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn no_route_code_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/route/v1/driving/.+"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "NoRoute",
                "message": "Impossible route between points"
            })))
            .mount(&server)
            .await;

        let router = OsrmRouter::new(Client::new()).with_base_url(server.uri());
        let route = router
            .route(YARD, SITE, TravelMode::Driving)
            .await
            .expect("request succeeds");
        assert!(route.is_none());
    }

    #[tokio::test]
    async fn unknown_code_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/route/v1/driving/.+"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "InvalidQuery",
                "message": "Query string malformed"
            })))
            .mount(&server)
            .await;

        let router = OsrmRouter::new(Client::new()).with_base_url(server.uri());
        let result = router.route(YARD, SITE, TravelMode::Driving).await;
        assert!(matches!(result, Err(PortError::UnexpectedResponse(_))));
    }

    #[test]
    fn public_bundle_is_named() {
        let bundle = provider(Client::new());
        assert_eq!(bundle.name, "openstreetmap");
    }

    #[tokio::test]
    async fn bundle_uses_configured_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("countrycodes", "ca"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"lat": "45.52", "lon": "-122.68"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/route/v1/driving/.+"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "Ok",
                "routes": [{"duration": 1800.0, "distance": 30000.0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bundle = provider_with(
            Client::new(),
            &Endpoints {
                geocoder_url: server.uri(),
                router_url: server.uri(),
                country_codes: String::from("ca"),
            },
        );

        let found = bundle
            .geocoder
            .geocode("V6B 1A1")
            .await
            .expect("request succeeds");
        assert_eq!(found, Some(YARD));
        let route = bundle
            .router
            .route(YARD, SITE, TravelMode::Driving)
            .await
            .expect("request succeeds")
            .expect("route found");
        assert!((route.expected_travel_secs - 1800.0).abs() < f64::EPSILON);
    }
}

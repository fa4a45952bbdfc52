//! Geocoder adapter.
//!
//! Resolves a free-text postal address to coordinates through a
//! MapQuest-compatible geocoding endpoint. Every failure mode (missing API
//! key, network error, HTTP error, unresolved address, malformed payload)
//! degrades to "no coordinates" — geocoding is best-effort and must never
//! fail a physician query.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[allow(async_fn_in_trait)]
pub trait Geocode {
    async fn geocode(&self, address: &str) -> Option<GeoPoint>;
}

pub struct MapQuestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl MapQuestClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    async fn fetch(&self, key: &str, address: &str) -> Result<Value> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", key), ("location", address)])
            .send()
            .await
            .with_context(|| format!("geocoding request failed for '{address}'"))?
            .error_for_status()
            .with_context(|| format!("geocoding returned an error status for '{address}'"))?;
        response
            .json()
            .await
            .with_context(|| format!("invalid geocoding JSON for '{address}'"))
    }
}

impl Geocode for MapQuestClient {
    async fn geocode(&self, address: &str) -> Option<GeoPoint> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::warn!("geocoding API key is not set; skipping geocoding");
            return None;
        };
        match self.fetch(key, address).await {
            Ok(body) => {
                let point = parse_geocode_response(&body);
                if point.is_none() {
                    tracing::warn!(address, "geocoder could not resolve address");
                }
                point
            }
            Err(err) => {
                tracing::warn!(address, error = %err, "geocoding failed");
                None
            }
        }
    }
}

/// Pull the best-guess coordinate out of a MapQuest geocoding response.
/// MapQuest reports unresolved addresses as (0, 0); treat that as no result.
fn parse_geocode_response(body: &Value) -> Option<GeoPoint> {
    let lat_lng = body
        .get("results")?
        .get(0)?
        .get("locations")?
        .get(0)?
        .get("latLng")?;
    let lat = lat_lng.get("lat")?.as_f64()?;
    let lon = lat_lng.get("lng")?.as_f64()?;
    if lat == 0.0 && lon == 0.0 {
        return None;
    }
    Some(GeoPoint { lat, lon })
}

/// Geocode every address concurrently, preserving input order. Individual
/// failures surface as `None` without disturbing their siblings.
pub async fn geocode_all<G: Geocode>(geocoder: &G, addresses: &[String]) -> Vec<Option<GeoPoint>> {
    futures::future::join_all(addresses.iter().map(|address| geocoder.geocode(address))).await
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, Geocode, geocode_all, parse_geocode_response};
    use serde_json::json;

    #[test]
    fn parses_the_first_location_of_the_first_result() {
        let body = json!({
            "results": [{
                "locations": [
                    {"latLng": {"lat": 32.7767, "lng": -96.7970}},
                    {"latLng": {"lat": 0.0, "lng": 0.0}}
                ]
            }]
        });
        assert_eq!(
            parse_geocode_response(&body),
            Some(GeoPoint {
                lat: 32.7767,
                lon: -96.7970
            })
        );
    }

    #[test]
    fn zero_zero_is_the_unresolved_sentinel() {
        let body = json!({
            "results": [{"locations": [{"latLng": {"lat": 0.0, "lng": 0.0}}]}]
        });
        assert_eq!(parse_geocode_response(&body), None);
    }

    #[test]
    fn malformed_payloads_yield_none() {
        for body in [
            json!({}),
            json!({"results": []}),
            json!({"results": [{"locations": []}]}),
            json!({"results": [{"locations": [{"latLng": {"lat": "x", "lng": "y"}}]}]}),
        ] {
            assert_eq!(parse_geocode_response(&body), None);
        }
    }

    struct Scripted;

    impl Geocode for Scripted {
        async fn geocode(&self, address: &str) -> Option<GeoPoint> {
            match address {
                "bad" => None,
                _ => Some(GeoPoint { lat: 1.0, lon: 2.0 }),
            }
        }
    }

    #[tokio::test]
    async fn fan_out_preserves_order_and_isolates_failures() {
        let addresses = vec![
            "a".to_string(),
            "bad".to_string(),
            "c".to_string(),
        ];
        let points = geocode_all(&Scripted, &addresses).await;
        assert_eq!(points.len(), 3);
        assert!(points[0].is_some());
        assert!(points[1].is_none());
        assert!(points[2].is_some());
    }
}

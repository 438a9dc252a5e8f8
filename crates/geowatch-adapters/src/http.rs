//! HTTP position source
//!
//! `GET {base_url}/clinicianstatus/{entity_id}` answers with a GeoJSON
//! FeatureCollection: the first feature is the entity's current position
//! (Point), the second its assigned safety zone (Polygon). Anything else is
//! treated as a failed lookup.

use async_trait::async_trait;
use geowatch_adapter_api::{Observation, PositionSource, SourceError, SourceResult};
use geowatch_api::{Position, Ring, Zone};
use geowatch_util::EntityId;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Path segment under the base URL that serves entity status
pub const STATUS_PATH: &str = "clinicianstatus";

/// Position source backed by the status HTTP API
#[derive(Debug, Clone)]
pub struct HttpPositionSource {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpPositionSource {
    /// Create a source for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> SourceResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// URL queried for one entity.
    ///
    /// The id always becomes exactly one path segment: `/`, `?` and `#` are
    /// percent-encoded and dot segments are refused.
    pub fn status_url(&self, entity_id: &EntityId) -> SourceResult<Url> {
        let id = entity_id.as_str();
        if matches!(id, "" | "." | "..") {
            return Err(SourceError::InvalidUrl(format!(
                "entity id {:?} cannot be used as a path segment",
                id
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(STATUS_PATH)
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    async fn fetch(&self, entity_id: &EntityId) -> SourceResult<Observation> {
        let url = self.status_url(entity_id)?;
        debug!(entity_id = %entity_id, url = %url, "Fetching entity status");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                entity_id: entity_id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(e))?;
        parse_feature_collection(&body)
    }
}

impl HttpPositionSource {
    fn map_error(&self, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Point { coordinates: Vec<f64> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Other,
}

/// Parse a status response body into a position and zone
pub fn parse_feature_collection(body: &str) -> SourceResult<Observation> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| SourceError::Malformed(format!("Invalid GeoJSON: {}", e)))?;

    let [location, zone, ..] = collection.features.as_slice() else {
        return Err(SourceError::Malformed(format!(
            "Expected at least 2 features, got {}",
            collection.features.len()
        )));
    };

    let position = match &location.geometry {
        Some(Geometry::Point { coordinates }) => match coordinates.as_slice() {
            [lon, lat, ..] => Position::from_lon_lat(*lon, *lat),
            _ => return Err(SourceError::Malformed("Point needs two coordinates".into())),
        },
        _ => return Err(SourceError::Malformed("First feature is not a Point".into())),
    };

    let rings = match &zone.geometry {
        Some(Geometry::Polygon { coordinates }) => coordinates
            .iter()
            .map(|ring| parse_ring(ring))
            .collect::<SourceResult<Vec<Ring>>>()?,
        _ => return Err(SourceError::Malformed("Second feature is not a Polygon".into())),
    };

    Ok(Observation::new(position, Zone::new(rings)))
}

fn parse_ring(ring: &[Vec<f64>]) -> SourceResult<Ring> {
    ring.iter()
        .map(|vertex| match vertex.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(SourceError::Malformed("Polygon vertex needs two coordinates".into())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [-122.25, 37.87] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[-122.3, 37.8], [-122.2, 37.8], [-122.2, 37.9], [-122.3, 37.9], [-122.3, 37.8]],
                        [[-122.26, 37.86], [-122.24, 37.86], [-122.24, 37.88], [-122.26, 37.86]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_point_and_polygon() {
        let observation = parse_feature_collection(VALID).unwrap();
        assert_eq!(observation.position, Position::new(37.87, -122.25));
        assert_eq!(observation.zone.rings.len(), 2);
        assert_eq!(observation.zone.rings[0][0], [-122.3, 37.8]);
        assert_eq!(observation.zone.holes().len(), 1);
    }

    #[test]
    fn extra_features_are_ignored() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        let extra = value["features"][0].clone();
        value["features"].as_array_mut().unwrap().push(extra);

        assert!(parse_feature_collection(&value.to_string()).is_ok());
    }

    #[test]
    fn fewer_than_two_features_is_malformed() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(body),
            Err(SourceError::Malformed(_))
        ));
        assert!(parse_feature_collection(r#"{"type":"FeatureCollection"}"#).is_err());
    }

    #[test]
    fn wrong_geometry_types_are_malformed() {
        let swapped = r#"{"features":[
            {"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"geometry":{"type":"Point","coordinates":[0.5,0.5]}}
        ]}"#;
        assert!(parse_feature_collection(swapped).is_err());

        let multi = r#"{"features":[
            {"geometry":{"type":"Point","coordinates":[0.5,0.5]}},
            {"geometry":{"type":"MultiPolygon","coordinates":[]}}
        ]}"#;
        assert!(parse_feature_collection(multi).is_err());

        let null_geometry = r#"{"features":[
            {"geometry":null},
            {"geometry":{"type":"Polygon","coordinates":[]}}
        ]}"#;
        assert!(parse_feature_collection(null_geometry).is_err());
    }

    #[test]
    fn short_coordinates_are_malformed() {
        let body = r#"{"features":[
            {"geometry":{"type":"Point","coordinates":[0.5]}},
            {"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        assert!(parse_feature_collection(body).is_err());
    }

    #[test]
    fn empty_polygon_yields_empty_zone() {
        let body = r#"{"features":[
            {"geometry":{"type":"Point","coordinates":[0.5,0.5]}},
            {"geometry":{"type":"Polygon","coordinates":[]}}
        ]}"#;
        assert!(parse_feature_collection(body).unwrap().zone.is_empty());
    }

    #[test]
    fn not_json_is_malformed() {
        assert!(matches!(
            parse_feature_collection("<html>502</html>"),
            Err(SourceError::Malformed(_))
        ));
    }

    fn source(base_url: &str) -> HttpPositionSource {
        HttpPositionSource::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn status_url_joins_base_and_id() {
        assert_eq!(
            source("http://localhost:8080/")
                .status_url(&EntityId::from(3u64))
                .unwrap()
                .as_str(),
            "http://localhost:8080/clinicianstatus/3"
        );
        assert_eq!(
            source("https://api.example.com/v1")
                .status_url(&EntityId::new("ward-7"))
                .unwrap()
                .as_str(),
            "https://api.example.com/v1/clinicianstatus/ward-7"
        );
    }

    #[tokio::test]
    async fn status_url_keeps_id_in_one_segment() {
        let url = source("http://h:8080")
            .status_url(&EntityId::new("../admin?x=1#frag"))
            .unwrap();

        assert_eq!(url.host_str(), Some("h"));
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], "clinicianstatus");
        assert!(segments[1].contains("%2F"));
        assert!(segments[1].contains("%3F"));
    }

    #[tokio::test]
    async fn dot_segment_ids_are_refused() {
        let source = source("http://h:8080");
        for id in [".", ".."] {
            assert!(matches!(
                source.status_url(&EntityId::new(id)),
                Err(SourceError::InvalidUrl(_))
            ));
        }
    }

    #[tokio::test]
    async fn unparsable_base_url_is_rejected() {
        let result = HttpPositionSource::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(SourceError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 on loopback is discard and is normally closed
        let source = HttpPositionSource::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = source.fetch(&EntityId::new("1")).await;
        assert!(matches!(
            result,
            Err(SourceError::Transport(_)) | Err(SourceError::Timeout(_))
        ));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dataset fetching.
//!
//! Datasets are published either over HTTP or as files next to the server.
//! Both paths return a [`FeatureCollection`]; `Feature` and bare `Geometry`
//! documents are wrapped into a one-feature collection.

use geojson::{Feature, FeatureCollection, GeoJson};
use std::path::PathBuf;
use std::time::Duration;

/// Where a dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` are URLs, anything else is a path
    /// (an optional `file://` prefix is stripped).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            let path = raw.strip_prefix("file://").unwrap_or(raw);
            DataSource::File(PathBuf::from(path))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches and parses GeoJSON datasets.
#[derive(Clone)]
pub struct DatasetLoader {
    http: reqwest::Client,
    timeout: Duration,
}

impl DatasetLoader {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Network(e.to_string()))?;
        Ok(Self { http, timeout })
    }

    /// Fetch a dataset and return it as a feature collection.
    pub async fn fetch(&self, source: &DataSource) -> Result<FeatureCollection, LoadError> {
        tracing::debug!(source = %source, "Fetching dataset");

        let body = match tokio::time::timeout(self.timeout, self.fetch_body(source)).await {
            Ok(body) => body?,
            Err(_) => return Err(LoadError::Timeout(self.timeout.as_secs())),
        };

        let collection = parse_collection(&body)?;
        tracing::info!(
            source = %source,
            features = collection.features.len(),
            "Fetched dataset"
        );
        Ok(collection)
    }

    async fn fetch_body(&self, source: &DataSource) -> Result<String, LoadError> {
        match source {
            DataSource::Url(url) => {
                let response = self.http.get(url).send().await.map_err(|e| {
                    if e.is_timeout() {
                        LoadError::Timeout(self.timeout.as_secs())
                    } else {
                        LoadError::Network(e.to_string())
                    }
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Status(status.as_u16()));
                }

                response
                    .text()
                    .await
                    .map_err(|e| LoadError::Network(e.to_string()))
            }
            DataSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Parse a GeoJSON document into a feature collection.
pub fn parse_collection(body: &str) -> Result<FeatureCollection, LoadError> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|e: geojson::Error| LoadError::Parse(e.to_string()))?;

    Ok(match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(feature) => single(feature),
        GeoJson::Geometry(geometry) => single(Feature::from(geometry)),
    })
}

fn single(feature: Feature) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }
}

/// Errors from fetching a dataset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to read file: {0}")]
    Io(String),

    #[error("Failed to parse GeoJSON: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            DataSource::parse("https://example.org/kk.geojson"),
            DataSource::Url("https://example.org/kk.geojson".to_string())
        );
        assert_eq!(
            DataSource::parse("data/shp_kk2.geojson"),
            DataSource::File(PathBuf::from("data/shp_kk2.geojson"))
        );
        assert_eq!(
            DataSource::parse("file:///srv/getaci.geojson"),
            DataSource::File(PathBuf::from("/srv/getaci.geojson"))
        );
    }

    #[test]
    fn test_parse_feature_wrapped() {
        let body = r#"{"type":"Feature","properties":{"a":1},"geometry":{"type":"Point","coordinates":[1,2]}}"#;
        let collection = parse_collection(body).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert!(collection.features[0].properties.is_some());
    }

    #[test]
    fn test_parse_geometry_wrapped() {
        let body = r#"{"type":"Point","coordinates":[1,2]}"#;
        let collection = parse_collection(body).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert!(collection.features[0].geometry.is_some());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_collection("<html>404</html>"),
            Err(LoadError::Parse(_))
        ));
        assert!(matches!(
            parse_collection(r#"{"type":"Nope"}"#),
            Err(LoadError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let loader = DatasetLoader::new(Duration::from_secs(5)).unwrap();
        let result = loader
            .fetch(&DataSource::File(PathBuf::from("data/does-not-exist.geojson")))
            .await;
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Layer loading and lookup service.
//!
//! Handles the load workflow:
//! 1. Claim the dataset's slot in the session
//! 2. Fetch the dataset on a spawned, abortable task
//! 3. Reproject Web Mercator datasets to EPSG:4326
//! 4. Attach the layer (unless a remove cancelled the load meanwhile)

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Crs, Dataset, FeatureHit, GeometryError, Layer, Popup, Style};
use crate::services::loader::{DataSource, DatasetLoader, LoadError};
use crate::services::session::{BeginError, LayerSession};
use crate::services::walker::{GeometryWalker, InvalidCoordinatePolicy, TransformReport};
use geo::Point;
use geojson::FeatureCollection;
use std::sync::Arc;

/// Outcome of a load request.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub layer: Arc<Layer>,
    /// The dataset was already displayed; nothing was fetched.
    pub already_active: bool,
}

/// Fetches datasets and turns them into displayable layers.
#[derive(Clone)]
pub struct LayerService {
    loader: DatasetLoader,
    kawasan_source: DataSource,
    getaci_source: DataSource,
    policy: InvalidCoordinatePolicy,
}

impl LayerService {
    pub fn new(config: &Config) -> std::result::Result<Self, LoadError> {
        Ok(Self {
            loader: DatasetLoader::new(config.fetch_timeout)?,
            kawasan_source: DataSource::parse(&config.kawasan_source),
            getaci_source: DataSource::parse(&config.getaci_source),
            policy: config.invalid_coordinates,
        })
    }

    pub fn source(&self, dataset: Dataset) -> &DataSource {
        match dataset {
            Dataset::Kawasan => &self.kawasan_source,
            Dataset::Getaci => &self.getaci_source,
        }
    }

    /// Load a dataset into the session.
    ///
    /// Returns the displayed layer without fetching if the dataset is
    /// already active. A concurrent load of the same dataset is a conflict.
    pub async fn load_layer(&self, session: &LayerSession, dataset: Dataset) -> Result<LoadOutcome> {
        let mut ticket = match session.begin_loading(dataset) {
            Ok(ticket) => ticket,
            Err(BeginError::AlreadyActive(layer)) => {
                tracing::debug!(dataset = %dataset, "Layer already displayed");
                return Ok(LoadOutcome {
                    layer,
                    already_active: true,
                });
            }
            Err(BeginError::AlreadyLoading) => {
                return Err(AppError::Conflict(format!(
                    "Dataset '{}' is already loading",
                    dataset
                )));
            }
        };

        let service = self.clone();
        let task = tokio::spawn(async move { service.build_layer(dataset).await });
        ticket.set_abort(task.abort_handle());

        match task.await {
            Ok(Ok(layer)) => match ticket.settle_active(layer) {
                Some(layer) => Ok(LoadOutcome {
                    layer,
                    already_active: false,
                }),
                None => Err(AppError::LoadCancelled),
            },
            Ok(Err(e)) => {
                tracing::warn!(dataset = %dataset, error = %e, "Dataset load failed");
                let message = e.to_string();
                ticket.settle_failed(message.clone());
                Err(AppError::DatasetLoad(message))
            }
            Err(join_error) if join_error.is_cancelled() => Err(AppError::LoadCancelled),
            Err(join_error) => Err(AppError::Internal(anyhow::anyhow!(
                "Load task for '{}' failed: {}",
                dataset,
                join_error
            ))),
        }
    }

    /// Fetch and prepare a layer. Does not touch the session.
    pub async fn build_layer(&self, dataset: Dataset) -> std::result::Result<Layer, LayerError> {
        let collection = self.loader.fetch(self.source(dataset)).await?;
        let (collection, source_crs, report) = to_wgs84(dataset, collection, self.policy)?;
        Ok(Layer::new(dataset, collection, source_crs, report))
    }

    /// Every feature of every displayed layer containing the point.
    pub fn lookup(&self, session: &LayerSession, longitude: f64, latitude: f64) -> Vec<FeatureHit> {
        let point = Point::new(longitude, latitude);
        session
            .active_layers()
            .iter()
            .flat_map(|layer| {
                layer.features_at(point).map(move |feature| FeatureHit {
                    dataset: layer.dataset,
                    popup: Popup::for_feature(layer.dataset, &feature.properties),
                    style: match layer.dataset {
                        Dataset::Kawasan => Style::for_properties(Some(&feature.properties)),
                        Dataset::Getaci => Style::base(),
                    },
                })
            })
            .collect()
    }
}

/// Bring a fetched collection into EPSG:4326.
///
/// A legacy `crs` member, when present, overrides the dataset's default
/// source CRS. Geographic collections are passed through untouched.
pub fn to_wgs84(
    dataset: Dataset,
    collection: FeatureCollection,
    policy: InvalidCoordinatePolicy,
) -> std::result::Result<(FeatureCollection, Crs, TransformReport), LayerError> {
    let declared = Crs::declared_name(collection.foreign_members.as_ref());
    let source_crs = match declared {
        None => dataset.source_crs(),
        Some(name) => {
            let crs = Crs::from_name(name)
                .ok_or_else(|| LayerError::UnsupportedCrs(name.to_string()))?;
            if crs != dataset.source_crs() {
                tracing::warn!(
                    dataset = %dataset,
                    declared = %crs,
                    expected = %dataset.source_crs(),
                    "Dataset declares an unexpected CRS"
                );
            }
            crs
        }
    };

    match source_crs {
        Crs::Wgs84 => Ok((collection, source_crs, TransformReport::default())),
        Crs::WebMercator => {
            let mut walker = GeometryWalker::new(policy);
            let collection = walker.transform_collection(collection)?;
            let report = walker.into_report();
            if report.invalid_leaves > 0 {
                tracing::warn!(
                    dataset = %dataset,
                    invalid = report.invalid_leaves,
                    dropped = report.dropped_features,
                    "Dataset contains coordinates outside the Web Mercator domain"
                );
            }
            Ok((collection, source_crs, report))
        }
    }
}

/// Errors from preparing a layer.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::parse_collection;

    #[test]
    fn test_wgs84_passes_through() {
        let collection = parse_collection(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[107.7,-7.2]}}
            ]}"#,
        )
        .unwrap();
        let (out, crs, report) =
            to_wgs84(Dataset::Getaci, collection.clone(), InvalidCoordinatePolicy::Keep).unwrap();
        assert_eq!(crs, Crs::Wgs84);
        assert_eq!(out, collection);
        assert_eq!(report.leaves, 0);
    }

    #[test]
    fn test_declared_crs_overrides_default() {
        let collection = parse_collection(
            r#"{"type":"FeatureCollection",
                "crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::3857"}},
                "features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0,0]}}
            ]}"#,
        )
        .unwrap();
        let (out, crs, report) =
            to_wgs84(Dataset::Getaci, collection, InvalidCoordinatePolicy::Keep).unwrap();
        assert_eq!(crs, Crs::WebMercator);
        assert_eq!(report.leaves, 1);
        assert!(out.foreign_members.is_none());
    }

    #[test]
    fn test_unknown_crs_rejected() {
        let collection = parse_collection(
            r#"{"type":"FeatureCollection",
                "crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::32748"}},
                "features":[]}"#,
        )
        .unwrap();
        let result = to_wgs84(Dataset::Kawasan, collection, InvalidCoordinatePolicy::Keep);
        assert!(matches!(result, Err(LayerError::UnsupportedCrs(_))));
    }
}

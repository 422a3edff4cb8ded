// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Datasets and displayed layers.

use super::coord::Crs;
use super::popup::Popup;
use super::style::Style;
use crate::services::walker::TransformReport;
use chrono::{DateTime, SecondsFormat, Utc};
use geo::{CoordsIter, Intersects, MultiPolygon, Point, Polygon};
use geojson::{FeatureCollection, JsonObject};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The datasets the viewer can overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Kawasan Konservasi (conservation area) boundaries, published in Web Mercator.
    Kawasan,
    /// Getaci layer, published in geographic coordinates.
    Getaci,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Kawasan, Dataset::Getaci];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Kawasan => "kawasan",
            Dataset::Getaci => "getaci",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// CRS the published file uses when it does not declare one.
    pub fn source_crs(&self) -> Crs {
        match self {
            Dataset::Kawasan => Crs::WebMercator,
            Dataset::Getaci => Crs::Wgs84,
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Area geometry of a feature, used for click lookups.
#[derive(Debug, Clone)]
pub enum AreaGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl AreaGeometry {
    /// Build from a GeoJSON geometry. Points and lines have no area and yield
    /// `None`, as do areas with non-finite coordinates.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Option<Self> {
        let area = match &geometry.value {
            geojson::Value::Polygon(_) => Polygon::<f64>::try_from(geometry.value.clone())
                .ok()
                .map(AreaGeometry::Polygon),
            geojson::Value::MultiPolygon(_) => {
                MultiPolygon::<f64>::try_from(geometry.value.clone())
                    .ok()
                    .map(AreaGeometry::MultiPolygon)
            }
            _ => None,
        }?;
        area.is_finite().then_some(area)
    }

    fn is_finite(&self) -> bool {
        let finite = |c: geo::Coord<f64>| c.x.is_finite() && c.y.is_finite();
        match self {
            AreaGeometry::Polygon(p) => p.coords_iter().all(finite),
            AreaGeometry::MultiPolygon(mp) => mp.coords_iter().all(finite),
        }
    }

    /// Check whether a point lies inside or on the boundary.
    pub fn intersects(&self, point: &Point<f64>) -> bool {
        match self {
            AreaGeometry::Polygon(p) => point.intersects(p),
            AreaGeometry::MultiPolygon(mp) => point.intersects(mp),
        }
    }
}

/// A feature of a displayed layer, indexed for lookups.
#[derive(Debug, Clone)]
pub struct LayerFeature {
    pub area: AreaGeometry,
    pub properties: JsonObject,
}

/// A dataset that has been fetched, transformed and attached to the map.
#[derive(Debug, Clone)]
pub struct Layer {
    pub dataset: Dataset,
    /// Transformed collection, EPSG:4326.
    pub collection: FeatureCollection,
    pub areas: Vec<LayerFeature>,
    pub source_crs: Crs,
    pub report: TransformReport,
    pub loaded_at: DateTime<Utc>,
}

impl Layer {
    pub fn new(
        dataset: Dataset,
        collection: FeatureCollection,
        source_crs: Crs,
        report: TransformReport,
    ) -> Self {
        let areas = collection
            .features
            .iter()
            .filter_map(|feature| {
                let area = AreaGeometry::from_geojson(feature.geometry.as_ref()?)?;
                Some(LayerFeature {
                    area,
                    properties: feature.properties.clone().unwrap_or_default(),
                })
            })
            .collect();

        Self {
            dataset,
            collection,
            areas,
            source_crs,
            report,
            loaded_at: Utc::now(),
        }
    }

    /// Features whose area contains the point (longitude, latitude).
    pub fn features_at(&self, point: Point<f64>) -> impl Iterator<Item = &LayerFeature> + '_ {
        self.areas.iter().filter(move |f| f.area.intersects(&point))
    }

    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            dataset: self.dataset,
            feature_count: self.collection.features.len(),
            area_count: self.areas.len(),
            source_crs: self.source_crs.to_string(),
            invalid_coordinates: self.report.invalid_leaves,
            dropped_features: self.report.dropped_features,
            loaded_at: self.loaded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Summary of a displayed layer for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LayerSummary {
    pub dataset: Dataset,
    pub feature_count: usize,
    pub area_count: usize,
    pub source_crs: String,
    pub invalid_coordinates: usize,
    pub dropped_features: usize,
    pub loaded_at: String,
}

/// A lookup hit: which layer, what to show, how to draw it.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeatureHit {
    pub dataset: Dataset,
    pub popup: Popup,
    pub style: Style,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geometry walker: reprojects every coordinate of a GeoJSON document.
//!
//! Walks coordinate trees depth-first, left to right, converting each leaf
//! from EPSG:3857 to EPSG:4326. Nesting, ordering and every non-coordinate
//! member are preserved, with two exceptions:
//! - bounding boxes present on the input are recomputed from the output
//! - the legacy `crs` member is removed, since output is always EPSG:4326

use crate::models::{Coordinate, CoordinatePair, GeometryError, GeometryNode};
use crate::services::projection;
use geojson::{Bbox, Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do with a feature containing coordinates that do not convert
/// to a valid longitude/latitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidCoordinatePolicy {
    /// Write the converted value through (NaN serializes as `null`).
    #[default]
    Keep,
    /// Omit the whole feature from the output.
    DropFeature,
}

impl FromStr for InvalidCoordinatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "drop-feature" | "drop" => Ok(Self::DropFeature),
            other => Err(format!("unknown invalid-coordinate policy '{}'", other)),
        }
    }
}

/// Counters accumulated over one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub leaves: usize,
    pub invalid_leaves: usize,
    pub dropped_features: usize,
    pub recomputed_bboxes: usize,
}

/// Stateful walker. One instance per document; read the report afterwards.
#[derive(Debug, Default)]
pub struct GeometryWalker {
    policy: InvalidCoordinatePolicy,
    report: TransformReport,
}

/// Transform a single coordinate tree with the default policy.
pub fn transform(node: GeometryNode) -> GeometryNode {
    GeometryWalker::default().transform_node(node)
}

impl GeometryWalker {
    pub fn new(policy: InvalidCoordinatePolicy) -> Self {
        Self {
            policy,
            report: TransformReport::default(),
        }
    }

    pub fn report(&self) -> &TransformReport {
        &self.report
    }

    pub fn into_report(self) -> TransformReport {
        self.report
    }

    /// Convert every leaf of the tree. Branches keep their length and order.
    pub fn transform_node(&mut self, node: GeometryNode) -> GeometryNode {
        match node {
            GeometryNode::Leaf(coordinate) => GeometryNode::Leaf(self.transform_leaf(coordinate)),
            GeometryNode::Branch(children) => GeometryNode::Branch(
                children
                    .into_iter()
                    .map(|child| self.transform_node(child))
                    .collect(),
            ),
        }
    }

    fn transform_leaf(&mut self, coordinate: Coordinate) -> Coordinate {
        self.report.leaves += 1;
        let pair = projection::convert_checked(coordinate.pair).unwrap_or_else(|converted| {
            self.report.invalid_leaves += 1;
            converted
        });
        Coordinate {
            pair,
            trailing: coordinate.trailing,
        }
    }

    /// Transform the coordinates of a geometry value.
    pub fn transform_value(&mut self, value: Value) -> Result<Value, GeometryError> {
        let value = match value {
            Value::Point(point) => {
                let node = self.transform_node(GeometryNode::from_point(point)?);
                Value::Point(node.into_point()?)
            }
            Value::MultiPoint(points) => {
                let node = self.transform_node(GeometryNode::from_line(points)?);
                Value::MultiPoint(node.into_line()?)
            }
            Value::LineString(line) => {
                let node = self.transform_node(GeometryNode::from_line(line)?);
                Value::LineString(node.into_line()?)
            }
            // Same nesting depth as a polygon: a list of lines
            Value::MultiLineString(lines) => {
                let node = self.transform_node(GeometryNode::from_polygon(lines)?);
                Value::MultiLineString(node.into_polygon()?)
            }
            Value::Polygon(rings) => {
                let node = self.transform_node(GeometryNode::from_polygon(rings)?);
                Value::Polygon(node.into_polygon()?)
            }
            Value::MultiPolygon(polygons) => {
                let node = self.transform_node(GeometryNode::from_polygons(polygons)?);
                Value::MultiPolygon(node.into_polygons()?)
            }
            Value::GeometryCollection(geometries) => Value::GeometryCollection(
                geometries
                    .into_iter()
                    .map(|g| self.transform_geometry(g))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(value)
    }

    pub fn transform_geometry(&mut self, geometry: Geometry) -> Result<Geometry, GeometryError> {
        let value = self.transform_value(geometry.value)?;
        let bbox = geometry.bbox.and_then(|old| {
            let mut bounds = Bounds::default();
            bounds.include_value(&value);
            self.recompute_bbox(&old, &bounds)
        });
        Ok(Geometry {
            bbox,
            value,
            foreign_members: geometry.foreign_members,
        })
    }

    /// Transform a feature. Returns `None` when the policy drops it.
    pub fn transform_feature(&mut self, feature: Feature) -> Result<Option<Feature>, GeometryError> {
        let invalid_before = self.report.invalid_leaves;

        let geometry = feature
            .geometry
            .map(|g| self.transform_geometry(g))
            .transpose()?;

        if self.policy == InvalidCoordinatePolicy::DropFeature
            && self.report.invalid_leaves > invalid_before
        {
            tracing::warn!(
                id = ?feature.id,
                invalid = self.report.invalid_leaves - invalid_before,
                "Dropping feature with invalid coordinates"
            );
            self.report.dropped_features += 1;
            return Ok(None);
        }

        let bbox = feature.bbox.and_then(|old| {
            let mut bounds = Bounds::default();
            if let Some(g) = &geometry {
                bounds.include_value(&g.value);
            }
            self.recompute_bbox(&old, &bounds)
        });

        Ok(Some(Feature {
            bbox,
            geometry,
            id: feature.id,
            properties: feature.properties,
            foreign_members: feature.foreign_members,
        }))
    }

    pub fn transform_collection(
        &mut self,
        collection: FeatureCollection,
    ) -> Result<FeatureCollection, GeometryError> {
        let mut features = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            if let Some(f) = self.transform_feature(feature)? {
                features.push(f);
            }
        }

        let bbox = collection.bbox.and_then(|old| {
            let mut bounds = Bounds::default();
            for g in features.iter().filter_map(|f| f.geometry.as_ref()) {
                bounds.include_value(&g.value);
            }
            self.recompute_bbox(&old, &bounds)
        });

        let foreign_members = collection.foreign_members.and_then(|mut members| {
            members.shift_remove("crs");
            (!members.is_empty()).then_some(members)
        });

        tracing::debug!(
            features = features.len(),
            leaves = self.report.leaves,
            invalid = self.report.invalid_leaves,
            "Transformed feature collection"
        );

        Ok(FeatureCollection {
            bbox,
            features,
            foreign_members,
        })
    }

    /// New box from the output bounds. 3D boxes keep their z range since z
    /// is not reprojected. Returns `None` when the geometry has no finite
    /// coordinates to bound.
    fn recompute_bbox(&mut self, old: &Bbox, bounds: &Bounds) -> Option<Bbox> {
        let Some((min, max)) = bounds.extent() else {
            tracing::warn!(bbox = ?old, "Dropping bbox with no finite coordinates to bound");
            return None;
        };
        self.report.recomputed_bboxes += 1;
        if old.len() == 6 {
            Some(vec![min.x, min.y, old[2], max.x, max.y, old[5]])
        } else {
            Some(vec![min.x, min.y, max.x, max.y])
        }
    }
}

/// Running 2D extent over finite positions.
#[derive(Debug, Default)]
struct Bounds {
    extent: Option<(CoordinatePair, CoordinatePair)>,
}

impl Bounds {
    fn include(&mut self, position: &[f64]) {
        let (x, y) = match position {
            [x, y, ..] if x.is_finite() && y.is_finite() => (*x, *y),
            _ => return,
        };
        self.extent = Some(match self.extent {
            None => (CoordinatePair::new(x, y), CoordinatePair::new(x, y)),
            Some((min, max)) => (
                CoordinatePair::new(min.x.min(x), min.y.min(y)),
                CoordinatePair::new(max.x.max(x), max.y.max(y)),
            ),
        });
    }

    fn include_value(&mut self, value: &Value) {
        match value {
            Value::Point(p) => self.include(p),
            Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().for_each(|p| self.include(p)),
            Value::MultiLineString(lines) | Value::Polygon(lines) => lines
                .iter()
                .flatten()
                .for_each(|p| self.include(p)),
            Value::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| self.include(p)),
            Value::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| self.include_value(&g.value))
            }
        }
    }

    fn extent(&self) -> Option<(CoordinatePair, CoordinatePair)> {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::projection::{convert, HALF_CIRCUMFERENCE};
    use approx::assert_abs_diff_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    fn leaf_pair(node: &GeometryNode) -> CoordinatePair {
        match node {
            GeometryNode::Leaf(c) => c.pair,
            GeometryNode::Branch(_) => panic!("expected leaf"),
        }
    }

    fn shape(node: &GeometryNode) -> Vec<usize> {
        // Lengths of every branch, depth-first
        let mut out = Vec::new();
        fn walk(node: &GeometryNode, out: &mut Vec<usize>) {
            if let GeometryNode::Branch(children) = node {
                out.push(children.len());
                children.iter().for_each(|c| walk(c, out));
            }
        }
        walk(node, &mut out);
        out
    }

    #[test]
    fn test_empty_branch() {
        assert_eq!(
            transform(GeometryNode::Branch(vec![])),
            GeometryNode::Branch(vec![])
        );
    }

    #[test]
    fn test_single_leaf() {
        let out = transform(GeometryNode::leaf(11991412.0, -868265.0));
        assert_eq!(
            leaf_pair(&out),
            convert(CoordinatePair::new(11991412.0, -868265.0))
        );
    }

    #[test]
    fn test_polygon_with_holes_shape() {
        let rings = vec![
            vec![
                vec![11990000.0, -805000.0],
                vec![11995000.0, -805000.0],
                vec![11995000.0, -800000.0],
                vec![11990000.0, -800000.0],
                vec![11990000.0, -805000.0],
            ],
            vec![
                vec![11991000.0, -804000.0],
                vec![11992000.0, -804000.0],
                vec![11991000.0, -803000.0],
                vec![11991000.0, -804000.0],
            ],
        ];
        let input = GeometryNode::from_polygon(rings).unwrap();
        let output = transform(input.clone());

        assert_eq!(shape(&input), shape(&output));
        assert_eq!(shape(&output), vec![2, 5, 4]);

        let mut inputs = Vec::new();
        input.for_each_leaf(&mut |c| inputs.push(c.pair));
        let mut outputs = Vec::new();
        output.for_each_leaf(&mut |c| outputs.push(c.pair));
        for (i, o) in inputs.iter().zip(&outputs) {
            assert_eq!(*o, convert(*i));
            assert_ne!(i, o);
        }
    }

    #[test]
    fn test_trailing_altitude_preserved() {
        let node = GeometryNode::from_point(vec![0.0, 0.0, 1234.5]).unwrap();
        let out = transform(node).into_point().unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], 1234.5);
    }

    #[test]
    fn test_invalid_leaf_reported_once() {
        let mut walker = GeometryWalker::default();
        let node = GeometryNode::Branch(vec![
            GeometryNode::leaf(0.0, 0.0),
            GeometryNode::leaf(f64::NAN, 0.0),
            GeometryNode::leaf(0.0, HALF_CIRCUMFERENCE),
        ]);
        let out = walker.transform_node(node);
        assert_eq!(walker.report().leaves, 3);
        assert_eq!(walker.report().invalid_leaves, 1);

        // Written through under the default policy
        if let GeometryNode::Branch(children) = &out {
            assert!(leaf_pair(&children[1]).x.is_nan());
            assert!(leaf_pair(&children[2]).y.is_finite());
        } else {
            panic!("expected branch");
        }
    }

    /// Counts WARN events seen while installed.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_one_warning_per_invalid_leaf() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));

        let out = tracing::subscriber::with_default(subscriber, || {
            transform(GeometryNode::Branch(vec![
                GeometryNode::leaf(f64::NAN, 0.0),
                GeometryNode::leaf(0.0, HALF_CIRCUMFERENCE),
                GeometryNode::leaf(0.0, f64::NAN),
            ]))
        });

        // y = X converts to about 85.0511, which is in range
        assert_eq!(warnings.load(Ordering::SeqCst), 2);
        if let GeometryNode::Branch(children) = &out {
            assert_abs_diff_eq!(leaf_pair(&children[1]).y, 85.05112877946931, epsilon = 1e-9);
        } else {
            panic!("expected branch");
        }
    }

    #[test]
    fn test_geometry_collection() {
        let value = Value::GeometryCollection(vec![
            Geometry::new(Value::Point(vec![0.0, 0.0])),
            Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![1000.0, 1000.0]])),
        ]);
        let mut walker = GeometryWalker::default();
        let out = walker.transform_value(value).unwrap();
        assert_eq!(walker.report().leaves, 3);
        match out {
            Value::GeometryCollection(gs) => assert_eq!(gs.len(), 2),
            _ => panic!("expected geometry collection"),
        }
    }

    #[test]
    fn test_bbox_recomputed() {
        let mut geometry = Geometry::new(Value::LineString(vec![
            vec![-HALF_CIRCUMFERENCE / 2.0, 0.0],
            vec![HALF_CIRCUMFERENCE / 2.0, 1000.0],
        ]));
        geometry.bbox = Some(vec![-1.0e7, 0.0, 1.0e7, 1000.0]);

        let mut walker = GeometryWalker::default();
        let out = walker.transform_geometry(geometry).unwrap();
        let bbox = out.bbox.unwrap();
        assert_eq!(bbox.len(), 4);
        assert_abs_diff_eq!(bbox[0], -90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox[2], 90.0, epsilon = 1e-9);
        assert!(bbox[3] > bbox[1]);
        assert_eq!(walker.report().recomputed_bboxes, 1);
    }

    #[test]
    fn test_bbox_keeps_z_range() {
        let mut geometry = Geometry::new(Value::Point(vec![0.0, 0.0, 50.0]));
        geometry.bbox = Some(vec![0.0, 0.0, 50.0, 0.0, 0.0, 50.0]);
        let out = GeometryWalker::default()
            .transform_geometry(geometry)
            .unwrap();
        let bbox = out.bbox.unwrap();
        assert_eq!(bbox.len(), 6);
        assert_eq!(bbox[2], 50.0);
        assert_eq!(bbox[5], 50.0);
    }

    #[test]
    fn test_absent_bbox_stays_absent() {
        let geometry = Geometry::new(Value::Point(vec![10.0, 10.0]));
        let out = GeometryWalker::default()
            .transform_geometry(geometry)
            .unwrap();
        assert!(out.bbox.is_none());
    }

    #[test]
    fn test_drop_feature_policy() {
        let good = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![0.0, 0.0]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        let bad = Feature {
            geometry: Some(Geometry::new(Value::Point(vec![3.0e7, 0.0]))),
            ..good.clone()
        };
        let collection = FeatureCollection {
            bbox: None,
            features: vec![good.clone(), bad.clone()],
            foreign_members: None,
        };

        let mut keep = GeometryWalker::new(InvalidCoordinatePolicy::Keep);
        let out = keep.transform_collection(collection.clone()).unwrap();
        assert_eq!(out.features.len(), 2);
        assert_eq!(keep.report().dropped_features, 0);

        let mut drop = GeometryWalker::new(InvalidCoordinatePolicy::DropFeature);
        let out = drop.transform_collection(collection).unwrap();
        assert_eq!(out.features.len(), 1);
        assert_eq!(drop.report().dropped_features, 1);
        assert_eq!(drop.report().invalid_leaves, 1);
    }

    #[test]
    fn test_crs_member_removed() {
        let members = json!({
            "name": "shp_kk2",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::3857" } }
        });
        let collection = FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: members.as_object().cloned(),
        };
        let out = GeometryWalker::default()
            .transform_collection(collection)
            .unwrap();
        let members = out.foreign_members.unwrap();
        assert!(members.get("crs").is_none());
        assert_eq!(members["name"], "shp_kk2");
    }

    #[test]
    fn test_null_geometry_passes_through() {
        let feature = Feature {
            bbox: None,
            geometry: None,
            id: Some(geojson::feature::Id::Number(7.into())),
            properties: json!({ "Nama_kk": "x" }).as_object().cloned(),
            foreign_members: None,
        };
        let out = GeometryWalker::default()
            .transform_feature(feature.clone())
            .unwrap()
            .unwrap();
        assert_eq!(out, feature);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "keep".parse::<InvalidCoordinatePolicy>(),
            Ok(InvalidCoordinatePolicy::Keep)
        );
        assert_eq!(
            "drop-feature".parse::<InvalidCoordinatePolicy>(),
            Ok(InvalidCoordinatePolicy::DropFeature)
        );
        assert!("reject".parse::<InvalidCoordinatePolicy>().is_err());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tagged coordinate trees.
//!
//! GeoJSON coordinates nest to a depth fixed by the geometry type: a point is
//! a single position, a line string a list of positions, a polygon a list of
//! rings, a multipolygon a list of polygons. [`GeometryNode`] stores that
//! nesting explicitly so the walker never has to guess whether an array is a
//! position or a list of positions.

use super::coord::CoordinatePair;
use geojson::{LineStringType, PointType, PolygonType, Position};

/// A single position: the planar pair plus any trailing components
/// (altitude, measure) which are carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub pair: CoordinatePair,
    pub trailing: Vec<f64>,
}

impl Coordinate {
    pub fn new(pair: CoordinatePair) -> Self {
        Self {
            pair,
            trailing: Vec::new(),
        }
    }

    /// Build from a GeoJSON position. Positions need at least two components.
    pub fn from_position(position: Position) -> Result<Self, GeometryError> {
        if position.len() < 2 {
            return Err(GeometryError::ShortPosition(position.len()));
        }
        let pair = CoordinatePair::new(position[0], position[1]);
        let trailing = position[2..].to_vec();
        Ok(Self { pair, trailing })
    }

    pub fn into_position(self) -> Position {
        let mut position = Vec::with_capacity(2 + self.trailing.len());
        position.push(self.pair.x);
        position.push(self.pair.y);
        position.extend(self.trailing);
        position
    }
}

/// A coordinate tree: either a leaf position or an ordered list of subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryNode {
    Leaf(Coordinate),
    Branch(Vec<GeometryNode>),
}

impl GeometryNode {
    pub fn leaf(x: f64, y: f64) -> Self {
        GeometryNode::Leaf(Coordinate::new(CoordinatePair::new(x, y)))
    }

    /// Visit every leaf, depth-first, left to right.
    pub fn for_each_leaf<F: FnMut(&Coordinate)>(&self, f: &mut F) {
        match self {
            GeometryNode::Leaf(c) => f(c),
            GeometryNode::Branch(children) => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
        }
    }

    // ─── From GeoJSON ────────────────────────────────────────────

    pub fn from_point(point: PointType) -> Result<Self, GeometryError> {
        Coordinate::from_position(point).map(GeometryNode::Leaf)
    }

    pub fn from_line(line: LineStringType) -> Result<Self, GeometryError> {
        line.into_iter()
            .map(Self::from_point)
            .collect::<Result<Vec<_>, _>>()
            .map(GeometryNode::Branch)
    }

    pub fn from_polygon(rings: PolygonType) -> Result<Self, GeometryError> {
        rings
            .into_iter()
            .map(Self::from_line)
            .collect::<Result<Vec<_>, _>>()
            .map(GeometryNode::Branch)
    }

    pub fn from_polygons(polygons: Vec<PolygonType>) -> Result<Self, GeometryError> {
        polygons
            .into_iter()
            .map(Self::from_polygon)
            .collect::<Result<Vec<_>, _>>()
            .map(GeometryNode::Branch)
    }

    // ─── Back to GeoJSON ─────────────────────────────────────────

    pub fn into_point(self) -> Result<PointType, GeometryError> {
        match self {
            GeometryNode::Leaf(c) => Ok(c.into_position()),
            GeometryNode::Branch(_) => Err(GeometryError::ShapeMismatch("position")),
        }
    }

    pub fn into_line(self) -> Result<LineStringType, GeometryError> {
        self.into_children("list of positions")?
            .into_iter()
            .map(Self::into_point)
            .collect()
    }

    pub fn into_polygon(self) -> Result<PolygonType, GeometryError> {
        self.into_children("list of rings")?
            .into_iter()
            .map(Self::into_line)
            .collect()
    }

    pub fn into_polygons(self) -> Result<Vec<PolygonType>, GeometryError> {
        self.into_children("list of polygons")?
            .into_iter()
            .map(Self::into_polygon)
            .collect()
    }

    fn into_children(self, expected: &'static str) -> Result<Vec<GeometryNode>, GeometryError> {
        match self {
            GeometryNode::Branch(children) => Ok(children),
            GeometryNode::Leaf(_) => Err(GeometryError::ShapeMismatch(expected)),
        }
    }
}

/// Errors from building or unpacking coordinate trees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Position has {0} components, at least 2 are required")]
    ShortPosition(usize),

    #[error("Coordinate tree does not match the geometry type (expected {0})")]
    ShapeMismatch(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_position_rejected() {
        assert_eq!(
            GeometryNode::from_point(vec![1.0]),
            Err(GeometryError::ShortPosition(1))
        );
        assert_eq!(
            GeometryNode::from_line(vec![vec![1.0, 2.0], vec![]]),
            Err(GeometryError::ShortPosition(0))
        );
    }

    #[test]
    fn test_trailing_components_kept() {
        let node = GeometryNode::from_point(vec![1.0, 2.0, 350.5]).unwrap();
        match &node {
            GeometryNode::Leaf(c) => {
                assert_eq!(c.pair, CoordinatePair::new(1.0, 2.0));
                assert_eq!(c.trailing, vec![350.5]);
            }
            GeometryNode::Branch(_) => panic!("expected leaf"),
        }
        assert_eq!(node.into_point().unwrap(), vec![1.0, 2.0, 350.5]);
    }

    #[test]
    fn test_polygon_shape() {
        let rings = vec![
            vec![
                vec![0.0, 0.0],
                vec![4.0, 0.0],
                vec![4.0, 4.0],
                vec![0.0, 0.0],
            ],
            vec![vec![1.0, 1.0], vec![2.0, 1.0], vec![1.0, 1.0]],
        ];
        let node = GeometryNode::from_polygon(rings.clone()).unwrap();
        let mut leaves = 0;
        node.for_each_leaf(&mut |_| leaves += 1);
        assert_eq!(leaves, 7);
        assert_eq!(node.into_polygon().unwrap(), rings);
    }

    #[test]
    fn test_shape_mismatch() {
        let node = GeometryNode::leaf(1.0, 2.0);
        assert_eq!(
            node.into_line(),
            Err(GeometryError::ShapeMismatch("list of positions"))
        );

        let line = GeometryNode::Branch(vec![GeometryNode::leaf(1.0, 2.0)]);
        assert_eq!(
            line.into_point(),
            Err(GeometryError::ShapeMismatch("position"))
        );
    }

    #[test]
    fn test_empty_branch_round_trip() {
        let node = GeometryNode::from_polygons(vec![]).unwrap();
        assert_eq!(node, GeometryNode::Branch(vec![]));
        assert!(node.into_polygons().unwrap().is_empty());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod coord;
pub mod geometry;
pub mod layer;
pub mod popup;
pub mod style;

pub use coord::{CoordinatePair, Crs};
pub use geometry::{Coordinate, GeometryError, GeometryNode};
pub use layer::{Dataset, FeatureHit, Layer, LayerSummary};
pub use popup::Popup;
pub use style::{ConservationFunction, Style};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinate pairs and reference systems.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// An ordered (x, y) pair.
///
/// In EPSG:3857 `x` is easting and `y` is northing, in meters. In EPSG:4326
/// `x` is longitude and `y` is latitude, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CoordinatePair {
    pub x: f64,
    pub y: f64,
}

impl CoordinatePair {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both components are finite and the pair lies inside the
    /// geographic domain (longitude within ±180, latitude strictly between
    /// the poles).
    pub fn is_valid_geographic(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (-180.0..=180.0).contains(&self.x)
            && self.y > -90.0
            && self.y < 90.0
    }
}

impl From<(f64, f64)> for CoordinatePair {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// The two coordinate reference systems datasets arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:3857, meters.
    WebMercator,
    /// EPSG:4326, degrees.
    Wgs84,
}

impl Crs {
    pub fn epsg_code(&self) -> u32 {
        match self {
            Crs::WebMercator => 3857,
            Crs::Wgs84 => 4326,
        }
    }

    /// Recognise a legacy GeoJSON `crs` name such as `EPSG:3857`,
    /// `urn:ogc:def:crs:EPSG::3857` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Some(Crs::Wgs84);
        }
        let code = upper.rsplit(':').next()?;
        match code {
            "3857" | "900913" | "3785" => Some(Crs::WebMercator),
            "4326" => Some(Crs::Wgs84),
            _ => None,
        }
    }

    /// Name declared by a document's legacy `crs` foreign member, if any.
    pub fn declared_name(members: Option<&geojson::JsonObject>) -> Option<&str> {
        members?.get("crs")?.get("properties")?.get("name")?.as_str()
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conservation-area categories and their map styles.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Feature property holding the conservation function code.
pub const FUNCTION_PROPERTY: &str = "Fungsi_kk";

/// Conservation area function (`Fungsi_kk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ConservationFunction {
    /// Cagar Alam (nature reserve)
    #[serde(rename = "CA")]
    CagarAlam,
    /// Suaka Margasatwa (wildlife sanctuary)
    #[serde(rename = "SM")]
    SuakaMargasatwa,
    /// Taman Buru (hunting park)
    #[serde(rename = "TB")]
    TamanBuru,
    /// Taman Nasional (national park)
    #[serde(rename = "TN")]
    TamanNasional,
    /// Taman Wisata Alam (nature recreation park)
    #[serde(rename = "TWA")]
    TamanWisataAlam,
    /// Kawasan Suaka Alam / Kawasan Pelestarian Alam
    #[serde(rename = "KSA/KPA")]
    KsaKpa,
    /// Taman Hutan Raya (grand forest park)
    #[serde(rename = "Tahura")]
    Tahura,
}

impl ConservationFunction {
    pub const ALL: [ConservationFunction; 7] = [
        ConservationFunction::CagarAlam,
        ConservationFunction::SuakaMargasatwa,
        ConservationFunction::TamanBuru,
        ConservationFunction::TamanNasional,
        ConservationFunction::TamanWisataAlam,
        ConservationFunction::KsaKpa,
        ConservationFunction::Tahura,
    ];

    /// Match the exact code used in the dataset. Codes are case sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConservationFunction::CagarAlam => "CA",
            ConservationFunction::SuakaMargasatwa => "SM",
            ConservationFunction::TamanBuru => "TB",
            ConservationFunction::TamanNasional => "TN",
            ConservationFunction::TamanWisataAlam => "TWA",
            ConservationFunction::KsaKpa => "KSA/KPA",
            ConservationFunction::Tahura => "Tahura",
        }
    }

    pub fn fill_color(&self) -> &'static str {
        match self {
            ConservationFunction::CagarAlam => "#ffa500",
            ConservationFunction::SuakaMargasatwa => "#ffff00",
            ConservationFunction::TamanBuru => "#a52a2a",
            ConservationFunction::TamanNasional => "#ff0000",
            ConservationFunction::TamanWisataAlam => "#00f",
            ConservationFunction::KsaKpa => "#800080",
            ConservationFunction::Tahura => "#808080",
        }
    }

    pub fn style(&self) -> Style {
        Style {
            fill_color: Some(self.fill_color().to_string()),
            ..Style::base()
        }
    }
}

/// Path style handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
    pub fill_opacity: f64,
    /// `None` leaves the renderer's default fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

impl Style {
    /// Shared by every category and by the fallback.
    pub fn base() -> Self {
        Self {
            weight: 0.0,
            opacity: Some(2.0),
            color: "white".to_string(),
            dash_array: None,
            fill_opacity: 0.3,
            fill_color: None,
        }
    }

    /// Style applied while the pointer hovers a feature.
    pub fn highlight() -> Self {
        Self {
            weight: 1.0,
            opacity: None,
            color: "#ffffff".to_string(),
            dash_array: Some(String::new()),
            fill_opacity: 0.3,
            fill_color: None,
        }
    }

    /// Style for a feature's properties, falling back to [`Style::base`]
    /// when the function code is missing or unknown.
    pub fn for_properties(properties: Option<&geojson::JsonObject>) -> Self {
        properties
            .and_then(|p| p.get(FUNCTION_PROPERTY))
            .and_then(|v| v.as_str())
            .and_then(ConservationFunction::from_code)
            .map(|f| f.style())
            .unwrap_or_else(Style::base)
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Popup content shown when a feature is clicked.

use super::layer::Dataset;
use geojson::JsonObject;
use serde::Serialize;
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Title of conservation-area popups.
const KAWASAN_TITLE: &str = "Kawasan Konservasi";
const GETACI_TITLE: &str = "Getaci";

/// (label, property) rows of the conservation-area popup.
const KAWASAN_ROWS: [(&str, &str); 3] = [
    ("Nama KK", "Nama_kk"),
    ("Fungsi KK", "Fungsi_kk"),
    ("Pengelola", "Satker"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Popup {
    pub title: String,
    pub rows: Vec<PopupRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

impl Popup {
    /// Build the popup for a feature of the given dataset.
    pub fn for_feature(dataset: Dataset, properties: &JsonObject) -> Self {
        match dataset {
            Dataset::Kawasan => Self::kawasan(properties),
            Dataset::Getaci => Self::generic(GETACI_TITLE, properties),
        }
    }

    fn kawasan(properties: &JsonObject) -> Self {
        let rows = KAWASAN_ROWS
            .iter()
            .map(|(label, key)| PopupRow {
                label: label.to_string(),
                value: properties.get(*key).map(scalar_text).unwrap_or_default(),
            })
            .collect();

        Self {
            title: KAWASAN_TITLE.to_string(),
            rows,
        }
    }

    /// One row per scalar property, in document order. Nested objects and
    /// arrays are skipped.
    fn generic(title: &str, properties: &JsonObject) -> Self {
        let rows = properties
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(k, v)| PopupRow {
                label: k.clone(),
                value: scalar_text(v),
            })
            .collect();

        Self {
            title: title.to_string(),
            rows,
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

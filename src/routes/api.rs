// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the map viewer.

use crate::error::{AppError, Result};
use crate::models::{
    ConservationFunction, CoordinatePair, Dataset, FeatureHit, LayerSummary, Style,
};
use crate::services::projection;
use crate::services::session::{Detached, LayerState, LayerStatus};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/layers", get(list_layers))
        .route(
            "/api/layers/{dataset}",
            get(get_layer).post(load_layer).delete(remove_layer),
        )
        .route("/api/lookup", get(lookup))
        .route("/api/legend", get(legend))
}

fn parse_dataset(raw: &str) -> Result<Dataset> {
    Dataset::from_name(raw)
        .ok_or_else(|| AppError::NotFound(format!("Unknown dataset '{}'", raw)))
}

// ─── Layer Status ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LayersResponse {
    pub layers: Vec<LayerEntry>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LayerEntry {
    pub dataset: Dataset,
    pub status: LayerStatus,
    pub source: String,
    pub layer: Option<LayerSummary>,
    /// Message of the last failed load, cleared by a remove.
    pub error: Option<String>,
}

/// Status of every dataset.
async fn list_layers(State(state): State<Arc<AppState>>) -> Json<LayersResponse> {
    let layers = Dataset::ALL
        .into_iter()
        .map(|dataset| {
            let layer_state = state.session.state(dataset);
            let (layer, error) = match &layer_state {
                LayerState::Active(layer) => (Some(layer.summary()), None),
                LayerState::Failed(message) => {
                    (None, Some(format!("Request Failed: {}", message)))
                }
                LayerState::Idle | LayerState::Loading => (None, None),
            };
            LayerEntry {
                dataset,
                status: layer_state.status(),
                source: state.layer_service.source(dataset).to_string(),
                layer,
                error,
            }
        })
        .collect();

    Json(LayersResponse { layers })
}

// ─── Load / Remove ───────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoadResponse {
    pub already_active: bool,
    pub layer: LayerSummary,
}

/// Fetch, reproject and display a dataset.
async fn load_layer(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> Result<Json<LoadResponse>> {
    let dataset = parse_dataset(&dataset)?;
    tracing::info!(dataset = %dataset, "Load requested");

    let outcome = state
        .layer_service
        .load_layer(&state.session, dataset)
        .await?;

    Ok(Json(LoadResponse {
        already_active: outcome.already_active,
        layer: outcome.layer.summary(),
    }))
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RemoveResponse {
    /// A displayed layer was taken off the map.
    pub removed: bool,
    /// A load in flight was cancelled.
    pub cancelled_load: bool,
}

/// Remove a dataset from the map. Also cancels a running load and clears a
/// recorded failure.
async fn remove_layer(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> Result<Json<RemoveResponse>> {
    let dataset = parse_dataset(&dataset)?;

    let detached = state.session.detach_layer(dataset);
    Ok(Json(RemoveResponse {
        removed: matches!(detached, Detached::Layer(_)),
        cancelled_load: matches!(detached, Detached::CancelledLoad),
    }))
}

/// Transformed GeoJSON of a displayed layer.
async fn get_layer(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> Result<impl IntoResponse> {
    let dataset = parse_dataset(&dataset)?;
    let layer = state
        .session
        .active_layer(dataset)
        .ok_or_else(|| AppError::NotFound(format!("Layer '{}' is not displayed", dataset)))?;

    let body = serde_json::to_vec(&layer.collection)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode layer: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, "application/geo+json")], body))
}

// ─── Lookup ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct LookupQuery {
    lon: f64,
    lat: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LookupResponse {
    pub longitude: f64,
    pub latitude: f64,
    /// The clicked point in Web Mercator meters.
    pub web_mercator: CoordinatePair,
    pub hits: Vec<FeatureHit>,
}

/// Popups for every displayed feature containing the clicked point.
async fn lookup(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<LookupResponse>> {
    let Query(params) = params.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let point = CoordinatePair::new(params.lon, params.lat);
    if !point.is_valid_geographic() {
        return Err(AppError::BadRequest(
            "'lon' must be within [-180, 180] and 'lat' within (-90, 90)".to_string(),
        ));
    }

    let hits = state
        .layer_service
        .lookup(&state.session, point.x, point.y);
    tracing::debug!(lon = point.x, lat = point.y, hits = hits.len(), "Lookup");

    Ok(Json(LookupResponse {
        longitude: point.x,
        latitude: point.y,
        web_mercator: projection::project(point),
        hits,
    }))
}

// ─── Legend ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LegendResponse {
    pub categories: Vec<LegendEntry>,
    /// Style for features with a missing or unknown category.
    pub fallback: Style,
    /// Style applied on hover.
    pub highlight: Style,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LegendEntry {
    pub code: ConservationFunction,
    pub style: Style,
}

async fn legend() -> Json<LegendResponse> {
    let categories = ConservationFunction::ALL
        .into_iter()
        .map(|code| LegendEntry {
            code,
            style: code.style(),
        })
        .collect();

    Json(LegendResponse {
        categories,
        fallback: Style::base(),
        highlight: Style::highlight(),
    })
}

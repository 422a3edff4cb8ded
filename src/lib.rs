// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kawasan-Map: conservation areas of Indonesia on a web map
//!
//! This crate provides the backend for the map viewer. Datasets published
//! in Web Mercator (EPSG:3857) are reprojected to geographic coordinates
//! (EPSG:4326) so the viewer can overlay them on a basemap.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{LayerService, LayerSession};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub layer_service: LayerService,
    /// Layers displayed on the map, shared by every viewer.
    pub session: LayerSession,
}

impl AppState {
    /// Build state with an empty session.
    pub fn new(config: Config) -> Result<Self, services::LoadError> {
        let layer_service = LayerService::new(&config)?;
        Ok(Self {
            config,
            layer_service,
            session: LayerSession::new(),
        })
    }
}

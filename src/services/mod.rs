// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod layers;
pub mod loader;
pub mod projection;
pub mod session;
pub mod walker;

pub use layers::{LayerError, LayerService, LoadOutcome};
pub use loader::{DataSource, DatasetLoader, LoadError};
pub use session::{LayerSession, LayerState, LayerStatus};
pub use walker::{GeometryWalker, InvalidCoordinatePolicy, TransformReport};

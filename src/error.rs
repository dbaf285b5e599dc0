use thiserror::Error;

use crate::types::{BoundingBox, EntityId};

/// Rejected [`crate::WorldConfig`] values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell size must be positive and finite, got {0}")]
    NonPositiveCellSize(f32),
    #[error("grid must have at least one cell, got {columns}x{rows}")]
    EmptyGrid { columns: usize, rows: usize },
    #[error("gravity must not be negative, got {0}")]
    NegativeGravity(i32),
    #[error("smoothing factor must be in (0, 1], got {0}")]
    SmoothingFactorOutOfRange(f32),
    #[error("viewport must have a positive size, got {width}x{height}")]
    NonPositiveViewport { width: f32, height: f32 },
}

/// Errors returned by [`crate::PhysicsWorld`] operations.
#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    /// The entity is not (or no longer) registered with the world.
    #[error("entity {0:?} is not registered")]
    UnknownEntity(EntityId),
    #[error("bounding box {0:?} must have finite coordinates and positive extents")]
    InvalidBox(BoundingBox),
    #[error("invalid world config: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

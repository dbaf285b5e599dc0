//! gridstep: grid-indexed collision and step-wise movement for 2D platformers

pub mod active;
pub mod api;
pub mod body;
pub mod changes;
pub mod error;
pub mod grid;
pub mod jump;
pub mod narrowphase;
pub mod signal;
pub mod types;
pub mod world;

pub use crate::api::*;
pub use crate::body::{EntityDesc, PhysicsState};
pub use crate::changes::{Change, ChangeQueue};
pub use crate::error::{ConfigError, PhysicsError};
pub use crate::grid::SpatialGrid;
pub use crate::signal::{ListenerId, Signal};
pub use crate::types::*;
pub use crate::world::PhysicsWorld;

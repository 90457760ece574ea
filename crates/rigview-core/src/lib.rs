//! Rigview Core - Foundational types for the rigview scene viewer
//!
//! This crate provides the types that the graph and runtime crates depend on:
//! - `Point3`, `Rotation3`, `Transformation` - rigid-body math in f64
//! - `FrameId`, `RelationId` - stable arena handles
//! - Error types and Result alias

mod error;
mod id;
mod math;

pub use error::{Result, RigviewError};
pub use id::{FrameId, RelationId};
pub use math::{Point3, Rotation3, Transformation, EPSILON};

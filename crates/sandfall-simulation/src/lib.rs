//! Cell data for the Sandfall simulation
//!
//! This crate provides the foundational data types shared by the engine and
//! any renderer:
//! - Material kinds and their base colors (MaterialType)
//! - Per-cell physical parameters and motion state (Physics)
//! - Scaffolding stability record (Support)
//! - The cell itself (Cell)

mod cell;
mod material;
mod physics;

pub use cell::{Cell, Support};
pub use material::MaterialType;
pub use physics::Physics;

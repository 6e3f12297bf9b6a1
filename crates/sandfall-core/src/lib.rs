pub mod behavior;
pub mod world;

// Re-export the cell data crate so callers need a single dependency
pub mod simulation {
    pub use sandfall_simulation::*;
}

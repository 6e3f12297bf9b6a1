//! Sandfall headless driver - scripted scenarios printed to the terminal

pub mod config;
pub mod scenario;

pub use config::{HeadlessConfig, RunConfig};
pub use scenario::{Scenario, render_ascii};

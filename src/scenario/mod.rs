//! Scenarios, the runner that executes them, and the built-in suite.

pub mod context;
pub mod model;
pub mod runner;
pub mod suite;

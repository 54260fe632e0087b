//! Application layer: the top-up control loop and the connection supervisor
//! that keeps its message channel alive.

pub mod engine;
pub mod supervisor;

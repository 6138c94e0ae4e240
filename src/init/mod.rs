//! Search initialization
//!
//! A single-flight primitive and the initializer built on it, which turns
//! configuration into a ready-to-use search client exactly once.

mod initializer;
mod single_flight;

pub use initializer::{InitOptions, InitOutcome, InitializationState, SearchInitializer};
pub use single_flight::{FlightStatus, SingleFlight};

//! Reading sources for the ECG monitor.
//!
//! A source yields one reading at a time in generation order. The only
//! source shipped here is the synthetic generator used by the simulator.

pub mod generator;

pub use generator::{ReadingGenerator, IRREGULAR_PERIOD};

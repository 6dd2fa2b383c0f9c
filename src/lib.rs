//! Cellular-automaton traffic simulation
//!
//! A discrete-time, discrete-space traffic model built on the
//! Nagel-Schreckenberg update rule, extended with a signalized four-way
//! junction, multi-lane approaches, dedicated right-turn lanes and
//! probabilistic turning.

pub mod simulation;
pub mod stats;
pub mod viz;

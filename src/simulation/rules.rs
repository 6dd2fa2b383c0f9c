//! Velocity update rules
//!
//! The scheduler is generic over the rule so alternative car-following
//! models can be plugged in without touching the movement machinery.

use rand::{Rng, RngCore};

/// A velocity update rule applied to every car once per tick
pub trait UpdateRule {
    /// Compute a car's next velocity from its current velocity and the
    /// distance to the nearest obstacle ahead
    fn next_velocity(
        &self,
        velocity: u32,
        gap: u32,
        vmax: u32,
        brake_probability: f64,
        rng: &mut dyn RngCore,
    ) -> u32;
}

/// The classic Nagel-Schreckenberg rule
///
/// Accelerate by one up to `vmax`, clamp to the space available ahead,
/// then brake by one with probability `brake_probability`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NagelSchreckenberg;

impl UpdateRule for NagelSchreckenberg {
    fn next_velocity(
        &self,
        velocity: u32,
        gap: u32,
        vmax: u32,
        brake_probability: f64,
        rng: &mut dyn RngCore,
    ) -> u32 {
        let accelerated = (velocity + 1).min(vmax);
        let clamped = accelerated.min(gap.saturating_sub(1));
        if rng.random::<f64>() < brake_probability {
            clamped.saturating_sub(1)
        } else {
            clamped
        }
    }
}

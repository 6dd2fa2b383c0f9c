//! Traffic light state machine
//!
//! Each light is an independent cyclic timer. Lights sharing the same
//! durations still keep their own timers; nothing outside the timer can
//! force a transition.

/// Phase of a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPhase {
    Red,
    Yellow,
    Green,
}

impl LightPhase {
    /// Next phase in the cycle Red -> Green -> Yellow -> Red
    pub fn next(self) -> LightPhase {
        match self {
            LightPhase::Red => LightPhase::Green,
            LightPhase::Green => LightPhase::Yellow,
            LightPhase::Yellow => LightPhase::Red,
        }
    }
}

/// Per-phase durations in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightTiming {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
}

/// A signal placed on a single cell
///
/// Starts Red with the timer at zero. Only the Red phase blocks traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficLight {
    pub phase: LightPhase,
    /// Ticks spent in the current phase
    pub timer: u32,
    pub timing: LightTiming,
}

impl TrafficLight {
    pub fn new(timing: LightTiming) -> Self {
        Self {
            phase: LightPhase::Red,
            timer: 0,
            timing,
        }
    }

    /// Duration of the current phase
    pub fn duration(&self) -> u32 {
        match self.phase {
            LightPhase::Red => self.timing.red,
            LightPhase::Yellow => self.timing.yellow,
            LightPhase::Green => self.timing.green,
        }
    }

    /// Advance the timer by one tick, transitioning when the phase expires
    pub fn advance(&mut self) {
        self.timer += 1;
        if self.timer >= self.duration() {
            self.phase = self.phase.next();
            self.timer = 0;
        }
    }

    pub fn is_red(&self) -> bool {
        self.phase == LightPhase::Red
    }
}

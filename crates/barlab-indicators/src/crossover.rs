//! Crossover detection between two series.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Relative gap below which two series values count as equal.
pub const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Compare two series values, treating rounding-level differences as a touch.
///
/// Averages of the same prices taken over different windows can disagree
/// in the last few bits; those must not register as one side being above.
pub fn tolerant_cmp(a: f64, b: f64) -> Ordering {
    let tolerance = RELATIVE_TOLERANCE * a.abs().max(b.abs());
    let diff = a - b;
    if diff > tolerance {
        Ordering::Greater
    } else if diff < -tolerance {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Direction of a crossing of series A over series B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossDirection {
    /// A moved from at-or-below B to strictly above
    Up,
    /// A moved from at-or-above B to strictly below
    Down,
}

impl CrossDirection {
    /// Numeric form: +1 for up, -1 for down.
    pub fn signum(self) -> i8 {
        match self {
            CrossDirection::Up => 1,
            CrossDirection::Down => -1,
        }
    }
}

/// Streaming crossover of two series.
///
/// A touch (A == B within [`RELATIVE_TOLERANCE`]) does not reset the reference side, so A going
/// above, touching, and coming back above produces no second signal.
/// Both inputs must be defined on the current and the previous update.
#[derive(Debug, Clone, Default)]
pub struct CrossOver {
    /// Sign of the last non-zero A - B, or 0 if only touches were seen.
    /// `None` when the previous update had an undefined input.
    reference: Option<i8>,
    current: Option<CrossDirection>,
}

impl CrossOver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current values of both series.
    pub fn update(&mut self, a: Option<f64>, b: Option<f64>) -> Option<CrossDirection> {
        let (Some(a), Some(b)) = (a, b) else {
            self.reference = None;
            self.current = None;
            return None;
        };

        let sign: i8 = match tolerant_cmp(a, b) {
            Ordering::Greater => 1,
            Ordering::Less => -1,
            Ordering::Equal => 0,
        };

        self.current = match self.reference {
            Some(reference) if sign > 0 && reference <= 0 => Some(CrossDirection::Up),
            Some(reference) if sign < 0 && reference >= 0 => Some(CrossDirection::Down),
            _ => None,
        };

        if sign != 0 || self.reference.is_none() {
            self.reference = Some(sign);
        }

        self.current
    }

    /// Signal produced by the last update.
    pub fn current(&self) -> Option<CrossDirection> {
        self.current
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

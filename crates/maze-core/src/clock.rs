//! Step counter for the robot simulation.
//!
//! The clock is the single source of truth for how many robot steps have
//! run since the maze was generated. It advances once per step with checked
//! arithmetic and is reset whenever a new maze is generated.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Step counter would overflow.
    #[error("step counter overflow: cannot advance beyond u64::MAX")]
    StepOverflow,
}

/// Counts completed robot steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepClock {
    /// Number of steps completed (0 before the first step).
    step: u64,
}

impl StepClock {
    /// Create a clock at step 0.
    pub const fn new() -> Self {
        Self { step: 0 }
    }

    /// Return the number of completed steps.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Advance by one step and return the new step number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::StepOverflow`] if the counter is at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.step = self.step.checked_add(1).ok_or(ClockError::StepOverflow)?;
        Ok(self.step)
    }

    /// Return to step 0.
    pub const fn reset(&mut self) {
        self.step = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_advances() {
        let mut clock = StepClock::new();
        assert_eq!(clock.step(), 0);
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.step(), 2);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut clock = StepClock::new();
        clock.advance().unwrap();
        clock.reset();
        assert_eq!(clock, StepClock::default());
    }

    #[test]
    fn overflow_is_reported() {
        let mut clock = StepClock { step: u64::MAX };
        assert!(matches!(clock.advance(), Err(ClockError::StepOverflow)));
        assert_eq!(clock.step(), u64::MAX);
    }
}

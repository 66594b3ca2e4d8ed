//! Step callback that reports run progress through tracing.
//!
//! Every step is logged at debug level; every `report_every` steps (and on
//! arrival at End) an info line summarises where the robot is.

use maze_agents::StepOutcome;
use maze_core::runner::StepCallback;
use maze_core::simulation::{Simulation, StepSummary};
use tracing::{debug, info};

/// Callback that logs robot progress.
pub struct ProgressCallback {
    report_every: u64,
    reports: u64,
    blocked: u64,
}

impl ProgressCallback {
    /// Create a callback that reports every `report_every` steps. Zero
    /// disables periodic reports; arrival at End is always reported.
    pub const fn new(report_every: u64) -> Self {
        Self {
            report_every,
            reports: 0,
            blocked: 0,
        }
    }

    /// Number of info-level reports emitted so far.
    pub const fn reports(&self) -> u64 {
        self.reports
    }

    /// Number of steps on which the robot could not move.
    pub const fn blocked(&self) -> u64 {
        self.blocked
    }
}

impl StepCallback for ProgressCallback {
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation) {
        debug!(
            step = summary.step,
            position = %summary.position,
            direction = ?summary.direction,
            "Step complete"
        );

        if matches!(summary.outcome, StepOutcome::Blocked { .. }) {
            self.blocked = self.blocked.saturating_add(1);
        }

        let periodic = summary
            .step
            .checked_rem(self.report_every)
            .is_some_and(|r| r == 0);
        if periodic || summary.at_end {
            self.reports = self.reports.saturating_add(1);
            info!(
                step = summary.step,
                position = %summary.position,
                at_end = summary.at_end,
                blocked = self.blocked,
                state = ?simulation.state(),
                "Robot progress"
            );
        }
    }
}

//! Operator control state for runtime simulation management.
//!
//! The generation and step loops consult this shared state between
//! iterations. An operator (a signal handler, a UI task) can pause and
//! resume the loop, change its speed, or request a clean stop without
//! holding a reference to the simulation itself.
//!
//! Control fields are atomics so the loops read them without locking.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::{MAX_SPEED_PERCENT, SpeedConfig, interval_for_speed};

/// Reason why a simulation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// The robot reached the End cell.
    ReachedEnd,
    /// Reached the configured `max_steps` limit.
    MaxStepsReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Shared operator control state.
///
/// Wrap in [`std::sync::Arc`] to share between the run loop and whatever
/// issues commands.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the run loop is currently paused.
    paused: AtomicBool,

    /// Notification used to wake the run loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Current step interval in milliseconds (runtime-adjustable).
    step_interval_ms: AtomicU64,

    /// Fastest permitted interval.
    min_step_interval_ms: u64,

    /// Slowest permitted interval.
    max_step_interval_ms: u64,

    /// Wall-clock start of the current run, in Unix milliseconds.
    started_at_ms: AtomicI64,

    /// Maximum number of steps (0 = unlimited).
    max_steps: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,

    /// Reason the run ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create operator state from the speed configuration.
    pub fn new(config: &SpeedConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            step_interval_ms: AtomicU64::new(config.step_interval_ms()),
            min_step_interval_ms: config.min_step_interval_ms,
            max_step_interval_ms: config.max_step_interval_ms,
            started_at_ms: AtomicI64::new(Utc::now().timestamp_millis()),
            max_steps: config.max_steps,
            max_real_time_seconds: config.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the run loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the run loop. It sleeps until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the run loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the run loop is no longer paused.
    ///
    /// Returns immediately if not paused. A stop request also releases the
    /// wait so a paused run can still be shut down.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the run ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the run ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Speed
    // -----------------------------------------------------------------------

    /// Get the current step interval in milliseconds.
    pub fn step_interval_ms(&self) -> u64 {
        self.step_interval_ms.load(Ordering::Acquire)
    }

    /// Set the step interval in milliseconds.
    ///
    /// Returns the previous interval on success, or `None` if `ms` lies
    /// outside the configured interval bounds.
    pub fn set_step_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < self.min_step_interval_ms || ms > self.max_step_interval_ms {
            return None;
        }
        Some(self.step_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Set the speed as a percentage (0 slowest, 100 fastest).
    ///
    /// Returns the previous interval on success, or `None` if the
    /// percentage exceeds 100.
    pub fn set_speed_percent(&self, speed_percent: u64) -> Option<u64> {
        if speed_percent > MAX_SPEED_PERCENT {
            return None;
        }
        let ms = interval_for_speed(
            self.min_step_interval_ms,
            self.max_step_interval_ms,
            speed_percent,
        );
        Some(self.step_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Check whether the step limit has been reached.
    ///
    /// Returns `true` if `max_steps > 0` and `current_step >= max_steps`.
    pub const fn step_limit_reached(&self, current_step: u64) -> bool {
        self.max_steps > 0 && current_step >= self.max_steps
    }

    /// Check whether the wall-clock time limit has been reached.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Restart the wall-clock measurement from now.
    ///
    /// The stepping loop calls this when it begins, so time spent generating
    /// the maze does not count against `max_real_time_seconds`.
    pub fn restart_clock(&self) {
        self.started_at_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
    }

    /// Return the wall-clock start time.
    pub fn started_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.started_at_ms.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    /// Return elapsed seconds since the clock was last (re)started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at())
            .num_seconds();
        // Negative if the wall clock stepped backwards.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Get the configured max steps.
    pub const fn max_steps(&self) -> u64 {
        self.max_steps
    }

    /// Get the configured max real-time seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    /// Capture the current control state.
    pub async fn status(&self, steps: u64) -> OperatorStatus {
        OperatorStatus {
            steps,
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            step_interval_ms: self.step_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            max_steps: self.max_steps,
            max_real_time_seconds: self.max_real_time_seconds,
            end_reason: self.end_reason().await,
            started_at: self.started_at().to_rfc3339(),
        }
    }
}

/// Serializable view of the operator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatus {
    /// Steps completed so far.
    pub steps: u64,
    /// Whether the run loop is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current step interval in milliseconds.
    pub step_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Configured maximum steps (0 = unlimited).
    pub max_steps: u64,
    /// Configured maximum real-time seconds (0 = unlimited).
    pub max_real_time_seconds: u64,
    /// The reason the run ended, if applicable.
    pub end_reason: Option<SimulationEndReason>,
    /// RFC 3339 timestamp of when the run started.
    pub started_at: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn speed(max_steps: u64) -> SpeedConfig {
        SpeedConfig {
            max_steps,
            ..SpeedConfig::default()
        }
    }

    #[test]
    fn initial_state_is_not_paused() {
        let state = OperatorState::new(&speed(0));
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.step_interval_ms(), 1000);
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(&speed(0));
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn set_interval_within_bounds() {
        let state = OperatorState::new(&speed(0));
        assert_eq!(state.set_step_interval_ms(200), Some(1000));
        assert_eq!(state.step_interval_ms(), 200);
    }

    #[test]
    fn reject_interval_outside_bounds() {
        let state = OperatorState::new(&speed(0));
        assert!(state.set_step_interval_ms(10).is_none());
        assert!(state.set_step_interval_ms(5000).is_none());
        assert_eq!(state.step_interval_ms(), 1000);
    }

    #[test]
    fn speed_percent_maps_to_interval() {
        let state = OperatorState::new(&speed(0));
        assert_eq!(state.set_speed_percent(100), Some(1000));
        assert_eq!(state.step_interval_ms(), 50);
        assert!(state.set_speed_percent(101).is_none());
        assert_eq!(state.step_interval_ms(), 50);
    }

    #[test]
    fn step_limit_zero_means_unlimited() {
        let state = OperatorState::new(&speed(0));
        assert!(!state.step_limit_reached(999_999));
    }

    #[test]
    fn step_limit_reached() {
        let state = OperatorState::new(&speed(100));
        assert!(!state.step_limit_reached(99));
        assert!(state.step_limit_reached(100));
        assert!(state.step_limit_reached(101));
    }

    #[test]
    fn time_limit_zero_means_unlimited() {
        let state = OperatorState::new(&speed(0));
        assert!(!state.time_limit_reached());
    }

    #[tokio::test]
    async fn restart_clock_moves_start_forward() {
        let state = OperatorState::new(&speed(0));
        let created = state.started_at();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        state.restart_clock();
        assert!(state.started_at() > created);
        assert_eq!(state.elapsed_seconds(), 0);
    }

    #[tokio::test]
    async fn stop_releases_a_paused_wait() {
        let state = OperatorState::new(&speed(0));
        state.pause();
        state.request_stop();
        state.wait_if_paused().await;
        assert!(state.is_stop_requested());
    }

    #[tokio::test]
    async fn status_reflects_end_reason() {
        let state = OperatorState::new(&speed(10));
        state.set_end_reason(SimulationEndReason::ReachedEnd).await;
        let status = state.status(7).await;
        assert_eq!(status.steps, 7);
        assert_eq!(status.max_steps, 10);
        assert_eq!(status.end_reason, Some(SimulationEndReason::ReachedEnd));
    }
}

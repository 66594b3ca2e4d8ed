//! The simulation state gate.
//!
//! [`Simulation`] owns the grid, the robot, and the step clock, and decides
//! which commands are legal in which [`SimulationState`]:
//!
//! ```text
//! Default --begin_generation--> MazeGenerating --(frontier empty)--> MazeGenerated
//!    ^                               |                                    |
//!    +---------cancel_generation-----+                                  start
//!    |                                                                    v
//!    +<--------------reset----------- Stopped <---stop / reached End--- Running
//!                                        +-------------start------------->
//! ```
//!
//! Commands issued in the wrong state return
//! [`SimulationError::InvalidTransition`] and leave everything untouched.
//! Any world or agent defect during generation discards the half-built maze
//! and returns the gate to [`SimulationState::Default`].

use maze_agents::{AgentError, Robot, StepOutcome};
use maze_types::{CellView, Direction, Position, SimulationState};
use maze_world::{BuildProgress, Endpoints, Grid, LocalSegment, MazeBuilder, SizeBounds, WorldError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, StepClock};

/// Errors from the simulation gate.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The command is not permitted in the current state.
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        /// State the simulation was in.
        state: SimulationState,
        /// The rejected command.
        action: &'static str,
    },

    /// The simulation is running but the robot is not on the grid.
    #[error("robot is not placed on the grid")]
    RobotNotPlaced,

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A robot operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The step counter overflowed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

impl SimulationError {
    /// Whether this error indicates a broken maze or robot rather than a
    /// rejected command.
    pub const fn is_defect(&self) -> bool {
        match self {
            Self::InvalidTransition { .. } => false,
            Self::RobotNotPlaced | Self::Clock { .. } => true,
            Self::World { source } => source.is_defect(),
            Self::Agent { source } => source.is_defect(),
        }
    }
}

/// Progress report from [`Simulation::advance_generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProgress {
    /// Frontier cells remain.
    Pending {
        /// Frontier size after this iteration.
        frontier: usize,
    },
    /// The maze is finished and the robot stands on Start.
    Complete(Endpoints),
}

/// What one simulation step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Step number (1 for the first step after generation).
    pub step: u64,
    /// What the robot did.
    pub outcome: StepOutcome,
    /// The robot's cell after the step.
    pub position: Position,
    /// The robot's heading after the step.
    pub direction: Direction,
    /// Whether the robot now stands on End.
    pub at_end: bool,
}

/// Serializable projection of the whole simulation, suitable for a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeSnapshot {
    /// Gate state.
    pub state: SimulationState,
    /// Grid side length.
    pub side_length: usize,
    /// Row-major cell views.
    pub cells: Vec<CellView>,
    /// Start and End, once generation has finished.
    pub endpoints: Option<Endpoints>,
    /// Robot location, if placed.
    pub robot: Option<Position>,
    /// Robot heading.
    pub direction: Direction,
    /// Whether the robot stands on End.
    pub at_end: bool,
    /// Steps completed since generation.
    pub steps: u64,
}

impl MazeSnapshot {
    /// View of the cell at `pos`, if it lies on the grid.
    pub fn cell(&self, pos: Position) -> Option<&CellView> {
        pos.index(self.side_length).and_then(|i| self.cells.get(i))
    }
}

/// Maze plus robot plus the state machine that sequences them.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    bounds: SizeBounds,
    robot: Robot,
    state: SimulationState,
    builder: Option<MazeBuilder>,
    endpoints: Option<Endpoints>,
    clock: StepClock,
}

impl Simulation {
    /// Create an idle simulation with an all-wall grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] (wrapped) if `side_length` is
    /// outside `bounds`, even, or below the supported minimum.
    pub fn new(side_length: usize, bounds: SizeBounds) -> Result<Self, SimulationError> {
        Ok(Self {
            grid: Grid::new(side_length, &bounds)?,
            bounds,
            robot: Robot::new(),
            state: SimulationState::Default,
            builder: None,
            endpoints: None,
            clock: StepClock::new(),
        })
    }

    /// Current gate state.
    pub const fn state(&self) -> SimulationState {
        self.state
    }

    /// The grid.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The robot.
    pub const fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Side length bounds enforced on generation.
    pub const fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    /// Start and End of the finished maze.
    pub const fn endpoints(&self) -> Option<Endpoints> {
        self.endpoints
    }

    /// Steps completed since generation.
    pub const fn steps(&self) -> u64 {
        self.clock.step()
    }

    /// Whether the robot stands on End.
    pub fn is_at_end(&self) -> bool {
        self.robot.is_at_end(&self.grid)
    }

    /// Whether [`begin_generation`](Self::begin_generation) is legal.
    pub const fn can_generate(&self) -> bool {
        matches!(self.state, SimulationState::Default)
    }

    /// Whether [`start`](Self::start) is legal.
    pub fn can_start(&self) -> bool {
        matches!(
            self.state,
            SimulationState::MazeGenerated | SimulationState::Stopped
        ) && !self.is_at_end()
    }

    /// Whether [`stop`](Self::stop) is legal.
    pub const fn can_stop(&self) -> bool {
        matches!(self.state, SimulationState::Running)
    }

    /// Whether [`reset`](Self::reset) is legal.
    pub const fn can_reset(&self) -> bool {
        !matches!(
            self.state,
            SimulationState::MazeGenerating | SimulationState::Running
        )
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Resize and clear the grid, then seed a randomized Prim build.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] unless the state is
    /// `Default`, or a wrapped [`WorldError::InvalidConfig`] for a bad side
    /// length. Neither changes the simulation.
    pub fn begin_generation<R: Rng + ?Sized>(
        &mut self,
        side_length: usize,
        rng: &mut R,
    ) -> Result<(), SimulationError> {
        self.require(self.can_generate(), "generate a maze")?;
        self.grid.reset(side_length, &self.bounds)?;
        self.robot.detach();
        self.endpoints = None;
        self.clock.reset();
        match MazeBuilder::start(&mut self.grid, rng) {
            Ok(builder) => {
                self.builder = Some(builder);
                self.state = SimulationState::MazeGenerating;
                info!(side_length, "Maze generation started");
                Ok(())
            }
            Err(e) => {
                self.grid.clear();
                Err(e.into())
            }
        }
    }

    /// Run one Prim iteration. On the iteration that empties the frontier,
    /// assigns Start and End, places the robot on Start facing North, and
    /// moves to `MazeGenerated`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] unless generating.
    /// Any other error is a defect: the maze is discarded and the state
    /// returns to `Default` before the error is returned.
    pub fn advance_generation<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<GenerationProgress, SimulationError> {
        self.require(
            matches!(self.state, SimulationState::MazeGenerating),
            "advance generation",
        )?;
        let result = self.advance_builder(rng);
        if let Err(ref e) = result {
            warn!(error = %e, "Maze generation failed, discarding grid");
            self.discard_generation();
        }
        result
    }

    fn advance_builder<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<GenerationProgress, SimulationError> {
        let builder = self
            .builder
            .as_mut()
            .ok_or(SimulationError::InvalidTransition {
                state: self.state,
                action: "advance generation",
            })?;
        match builder.advance(&mut self.grid, rng)? {
            BuildProgress::Pending { frontier } => Ok(GenerationProgress::Pending { frontier }),
            BuildProgress::Complete => {
                let Some(builder) = self.builder.take() else {
                    return Err(SimulationError::InvalidTransition {
                        state: self.state,
                        action: "finish generation",
                    });
                };
                let endpoints = builder.finish(&mut self.grid)?;
                self.robot = Robot::new();
                self.robot.place(&mut self.grid, endpoints.start)?;
                self.endpoints = Some(endpoints);
                self.state = SimulationState::MazeGenerated;
                info!(
                    start = %endpoints.start,
                    end = %endpoints.end,
                    "Robot placed on start"
                );
                Ok(GenerationProgress::Complete(endpoints))
            }
        }
    }

    /// Abandon an in-progress generation and clear the grid.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] unless generating.
    pub fn cancel_generation(&mut self) -> Result<(), SimulationError> {
        self.require(
            matches!(self.state, SimulationState::MazeGenerating),
            "cancel generation",
        )?;
        self.discard_generation();
        info!("Maze generation cancelled");
        Ok(())
    }

    /// Generate a complete maze in one call.
    ///
    /// # Errors
    ///
    /// As [`begin_generation`](Self::begin_generation) and
    /// [`advance_generation`](Self::advance_generation).
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        side_length: usize,
        rng: &mut R,
    ) -> Result<Endpoints, SimulationError> {
        self.begin_generation(side_length, rng)?;
        loop {
            if let GenerationProgress::Complete(endpoints) = self.advance_generation(rng)? {
                return Ok(endpoints);
            }
        }
    }

    fn discard_generation(&mut self) {
        self.builder = None;
        self.endpoints = None;
        self.robot.detach();
        self.grid.clear();
        self.state = SimulationState::Default;
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Let the robot move.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] unless the maze is
    /// generated or stopped and the robot has not yet reached End.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        self.require(self.can_start(), "start the robot")?;
        self.state = SimulationState::Running;
        info!(step = self.clock.step(), "Simulation running");
        Ok(())
    }

    /// Halt the robot.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] unless running.
    pub fn stop(&mut self) -> Result<(), SimulationError> {
        self.require(self.can_stop(), "stop the robot")?;
        self.state = SimulationState::Stopped;
        info!(step = self.clock.step(), "Simulation stopped");
        Ok(())
    }

    /// Perform one robot step. Reaching End stops the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] unless running. Other
    /// errors are defects and leave the simulation running so the caller
    /// can inspect it before resetting.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepSummary, SimulationError> {
        self.require(self.can_stop(), "step the robot")?;
        let location = self
            .robot
            .location()
            .ok_or(SimulationError::RobotNotPlaced)?;
        let segment = LocalSegment::around(&self.grid, location)?;
        let outcome = self.robot.step(&mut self.grid, &segment, rng)?;
        let step = self.clock.advance()?;
        let position = self.robot.location().unwrap_or(location);
        let at_end = self.is_at_end();
        debug!(step, %position, direction = ?self.robot.direction(), "Robot step");
        if at_end {
            self.state = SimulationState::Stopped;
            info!(step, %position, "Robot reached the end");
        }
        Ok(StepSummary {
            step,
            outcome,
            position,
            direction: self.robot.direction(),
            at_end,
        })
    }

    // -----------------------------------------------------------------------
    // Reset / projection
    // -----------------------------------------------------------------------

    /// Clear the maze back to all walls and return to `Default`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidTransition`] while generating or
    /// running.
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.require(self.can_reset(), "reset the maze")?;
        self.discard_generation();
        self.clock.reset();
        info!(side_length = self.grid.side_length(), "Maze reset");
        Ok(())
    }

    /// Capture the grid and robot for rendering or serialization.
    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot {
            state: self.state,
            side_length: self.grid.side_length(),
            cells: self.grid.views(),
            endpoints: self.endpoints,
            robot: self.robot.location(),
            direction: self.robot.direction(),
            at_end: self.is_at_end(),
            steps: self.clock.step(),
        }
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), SimulationError> {
        if allowed {
            Ok(())
        } else {
            Err(SimulationError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }
}

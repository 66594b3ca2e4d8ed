//! Error types for the maze engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup, generation, and
//! the stepping run so `main` can propagate with `?`.

/// Top-level error for the maze engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: maze_core::config::ConfigError,
    },

    /// Building the simulation failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: maze_core::simulation::SimulationError,
    },

    /// Generation or stepping failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: maze_core::runner::RunnerError,
    },

    /// Writing output failed.
    #[error("output error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}

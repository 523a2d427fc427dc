//! Error types for the simulation host binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run so
//! `main` can propagate them with `?`.

/// Top-level error for the simulation host.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: atcsim_core::ConfigError,
    },

    /// The engine could not be built from the configuration.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: atcsim_core::SetupError,
    },

    /// The simulation loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: atcsim_core::RunnerError,
    },

    /// The engine task panicked or was cancelled.
    #[error("engine task failed: {message}")]
    Task {
        /// Description of the join failure.
        message: String,
    },
}

//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the tick loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ambience_core::ConfigError,
    },

    /// The rules file could not be read.
    #[error("rules error: {source}")]
    Rules {
        /// The underlying rules file error.
        #[from]
        source: ambience_core::RulesFileError,
    },

    /// The scheduler rejected an operation.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: ambience_core::SchedulerError,
    },

    /// The `host` config section is malformed.
    #[error("host config error: {message}")]
    Host {
        /// Description of the problem.
        message: String,
    },

    /// Logging could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}

//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the battle loop
//! so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: pkbattle_core::config::ConfigError,
    },

    /// The battle could not be built from the configuration.
    #[error("battle error: {source}")]
    Battle {
        /// The underlying battle error.
        #[from]
        source: pkbattle_core::battle::BattleError,
    },

    /// The battle loop refused to run.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: pkbattle_core::runner::RunnerError,
    },
}

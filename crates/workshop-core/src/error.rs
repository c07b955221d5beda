//! Error types for the workshop controller.
//!
//! Every variant here ends the current invocation: the binary prints the
//! message in a highlighted style and exits non-zero. Nothing is retried.

use std::path::PathBuf;

use crate::exercise::ExecMode;

/// A specialized `Result` type for workshop operations.
pub type Result<T> = std::result::Result<T, WorkshopError>;

/// Errors that can occur while driving a workshop invocation.
#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The workshop configuration or menu file could not be read or parsed.
    #[error("Invalid workshop file '{path}': {message}\n\nSuggestion: Check that the file exists and contains valid JSON")]
    ConfigParseError {
        /// Path to the offending file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the workshop author.
        suggestion: String,
    },

    // ========================================================================
    // Selection Errors
    // ========================================================================
    /// The requested exercise is not part of the configured exercise list.
    #[error("No such exercise: '{name}'\n\nSuggestion: Run 'list' to see the available exercises")]
    ExerciseMissing {
        /// The name that failed to resolve.
        name: String,
    },

    /// `run` or `verify` was requested before any exercise was selected.
    #[error("No active exercise. Select one from the menu first.")]
    NoActiveExercise,

    /// `run` or `verify` was invoked without the submission argument.
    #[error("Usage: {app_name} {mode} <submission>")]
    UsageError {
        /// The workshop name shown in the usage line.
        app_name: String,
        /// The mode that was invoked.
        mode: ExecMode,
    },

    /// A custom command name was dispatched but never registered.
    #[error("Unknown command: '{name}'")]
    UnknownCommand {
        /// The command name.
        name: String,
    },

    /// A custom command handler failed.
    #[error("Command '{name}' failed: {message}")]
    CommandError {
        /// The command name.
        name: String,
        /// Rendered error from the handler.
        message: String,
    },

    // ========================================================================
    // Loading Errors
    // ========================================================================
    /// The exercise entry point is missing or is not a regular file.
    #[error("Exercise entry point not found: '{path}'\n\nSuggestion: The workshop installation looks broken; reinstall it")]
    MissingEntryFile {
        /// Path where the entry point was expected.
        path: PathBuf,
    },

    /// The entry point does not describe a usable exercise.
    #[error("'{path}' is not a workshop exercise: {reason}")]
    NotAWorkshopperModule {
        /// Path to the entry point.
        path: PathBuf,
        /// Why the entry point was rejected.
        reason: String,
    },

    // ========================================================================
    // Exercise Execution Errors
    // ========================================================================
    /// The exercise failed to prepare.
    #[error("Error preparing exercise: {message}")]
    PrepareError {
        /// Rendered error from the exercise.
        message: String,
    },

    /// The exercise text could not be loaded.
    #[error("Error loading exercise text: {message}")]
    TextLoadError {
        /// Rendered error from the exercise.
        message: String,
    },

    /// The exercise reported an error while running or verifying.
    #[error("Unexpected error while executing '{mode}': {message}")]
    UnexpectedExecutionError {
        /// The mode that was executing.
        mode: ExecMode,
        /// Rendered error from the exercise.
        message: String,
    },

    /// The exercise's cleanup step failed.
    #[error("Error cleaning up: {message}")]
    CleanupError {
        /// Rendered error from the exercise.
        message: String,
    },

    /// The reference solution could not be loaded.
    #[error("Error loading solution files: {message}")]
    SolutionLoadError {
        /// Rendered error message.
        message: String,
    },

    // ========================================================================
    // General Errors
    // ========================================================================
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid lifecycle transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current phase.
        from: String,
        /// The attempted target phase.
        to: String,
    },
}

impl WorkshopError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ExerciseMissing` error.
    #[must_use]
    pub fn exercise_missing(name: impl Into<String>) -> Self {
        Self::ExerciseMissing { name: name.into() }
    }

    /// Creates a new `UsageError`.
    #[must_use]
    pub fn usage(app_name: impl Into<String>, mode: ExecMode) -> Self {
        Self::UsageError {
            app_name: app_name.into(),
            mode,
        }
    }

    /// Creates a new `MissingEntryFile` error.
    #[must_use]
    pub fn missing_entry(path: impl Into<PathBuf>) -> Self {
        Self::MissingEntryFile { path: path.into() }
    }

    /// Creates a new `NotAWorkshopperModule` error.
    #[must_use]
    pub fn not_an_exercise(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::NotAWorkshopperModule {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wraps a custom command failure.
    #[must_use]
    pub fn command(name: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::CommandError {
            name: name.into(),
            message: format!("{err:#}"),
        }
    }

    /// Wraps an exercise `prepare` failure.
    #[must_use]
    pub fn prepare(err: &anyhow::Error) -> Self {
        Self::PrepareError {
            message: format!("{err:#}"),
        }
    }

    /// Wraps an exercise text loading failure.
    #[must_use]
    pub fn text_load(err: &anyhow::Error) -> Self {
        Self::TextLoadError {
            message: format!("{err:#}"),
        }
    }

    /// Wraps an error reported by `run` or `verify`.
    #[must_use]
    pub fn unexpected(mode: ExecMode, err: &anyhow::Error) -> Self {
        Self::UnexpectedExecutionError {
            mode,
            message: format!("{err:#}"),
        }
    }

    /// Wraps an exercise `end` failure.
    #[must_use]
    pub fn cleanup(err: &anyhow::Error) -> Self {
        Self::CleanupError {
            message: format!("{err:#}"),
        }
    }

    /// Creates a new `SolutionLoadError`.
    #[must_use]
    pub fn solution_load(message: impl std::fmt::Display) -> Self {
        Self::SolutionLoadError {
            message: message.to_string(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if this error was raised by the exercise itself rather
    /// than by the controller or the installation.
    #[must_use]
    pub const fn is_exercise_failure(&self) -> bool {
        matches!(
            self,
            Self::PrepareError { .. }
                | Self::TextLoadError { .. }
                | Self::UnexpectedExecutionError { .. }
                | Self::CleanupError { .. }
                | Self::SolutionLoadError { .. }
        )
    }

    /// Returns `true` if this error points at a broken workshop installation.
    #[must_use]
    pub const fn is_broken_install(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::MissingEntryFile { .. }
                | Self::NotAWorkshopperModule { .. }
        )
    }
}

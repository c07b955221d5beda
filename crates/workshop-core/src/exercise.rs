//! The exercise capability contract.
//!
//! An exercise is foreign code written by the workshop author. The
//! controller only sees it through the [`Exercise`] trait, and creates
//! instances through factories registered by kind in an
//! [`ExerciseRegistry`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ============================================================================
// Modes and text
// ============================================================================

/// How an exercise is being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Run the learner's program without grading it.
    Run,
    /// Grade the learner's submission.
    Verify,
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Verify => write!(f, "verify"),
        }
    }
}

/// Format of instructional text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Markdown source.
    Markdown,
    /// Plain text.
    Text,
}

impl ContentType {
    /// Guesses the content type from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
                Self::Markdown
            }
            _ => Self::Text,
        }
    }
}

/// Instructions for an exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseText {
    /// Format of `text`.
    pub content_type: ContentType,
    /// The instructions.
    pub text: String,
}

impl ExerciseText {
    /// Markdown instructions.
    #[must_use]
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Markdown,
            text: text.into(),
        }
    }

    /// Plain-text instructions.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            text: text.into(),
        }
    }
}

// ============================================================================
// Pass/fail notifications
// ============================================================================

/// A single pass or fail notification emitted during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// One check succeeded.
    Pass(String),
    /// One check failed.
    Fail(String),
}

/// Sends pass/fail notifications back to the controller while an exercise
/// executes. Dropping the reporter ends the stream.
#[derive(Debug, Clone)]
pub struct Reporter {
    sender: mpsc::UnboundedSender<Verdict>,
}

impl Reporter {
    /// Creates a reporter and the receiving end the controller drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Verdict>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Reports a passed check.
    pub fn pass(&self, message: impl Into<String>) {
        // The receiver only goes away once the controller has stopped listening.
        let _ = self.sender.send(Verdict::Pass(message.into()));
    }

    /// Reports a failed check.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.sender.send(Verdict::Fail(message.into()));
    }
}

// ============================================================================
// Exercise metadata
// ============================================================================

/// Everything the controller knows about an exercise before loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseMeta {
    /// Name as written in the exercise list.
    pub name: String,
    /// 1-based position in the exercise list.
    pub number: usize,
    /// Exercise directory.
    pub dir: PathBuf,
    /// Identifier derived from the name.
    pub id: String,
    /// Entry point manifest inside `dir`.
    pub exercise_file: PathBuf,
}

/// Arguments handed to [`Exercise::init`].
#[derive(Debug, Clone)]
pub struct ExerciseContext {
    /// Workshop name.
    pub app_name: String,
    /// Workshop application directory.
    pub app_dir: PathBuf,
    /// Identifier derived from the name.
    pub id: String,
    /// Exercise name as written in the exercise list.
    pub name: String,
    /// Exercise directory.
    pub dir: PathBuf,
    /// 1-based position in the exercise list.
    pub number: usize,
}

// ============================================================================
// Exercise trait
// ============================================================================

/// Capabilities every exercise provides.
///
/// `init` is called exactly once, before any other method. Failures are
/// reported as `anyhow::Error`; the controller decides what they mean.
#[async_trait]
pub trait Exercise: Send + Sync {
    /// Receives the exercise's identity. Called once, synchronously.
    fn init(&mut self, ctx: ExerciseContext);

    /// Readies the exercise before its text is shown.
    async fn prepare(&self) -> anyhow::Result<()>;

    /// Returns the instructional text.
    async fn exercise_text(&self) -> anyhow::Result<ExerciseText>;

    /// Runs the learner's program without grading it.
    ///
    /// Returns whether the run went well; the controller treats any
    /// completed run as successful.
    async fn run(&self, args: &[String], reporter: Reporter) -> anyhow::Result<bool>;

    /// Grades the learner's submission, reporting individual checks
    /// through `reporter`. Returns whether the submission passed.
    async fn verify(&self, args: &[String], reporter: Reporter) -> anyhow::Result<bool>;

    /// Releases anything `run` or `verify` acquired.
    async fn end(&self, mode: ExecMode, passed: bool) -> anyhow::Result<()>;

    /// Reference solution files, in display order.
    async fn solution_files(&self) -> anyhow::Result<Vec<PathBuf>>;

    /// Whether to skip showing the reference solution on pass.
    fn hide_solutions(&self) -> bool {
        false
    }

    /// Whether `run`/`verify` need a submission argument.
    fn require_submission(&self) -> bool {
        true
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Creates an uninitialized exercise from the options in its manifest.
pub type ExerciseFactory =
    Arc<dyn Fn(&serde_json::Map<String, serde_json::Value>) -> anyhow::Result<Box<dyn Exercise>> + Send + Sync>;

/// Exercise factories keyed by the `kind` named in each manifest.
#[derive(Clone, Default)]
pub struct ExerciseRegistry {
    factories: HashMap<String, ExerciseFactory>,
}

impl std::fmt::Debug for ExerciseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&String> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("ExerciseRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl ExerciseRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in kinds registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new().with_kind(crate::program::KIND, crate::program::factory())
    }

    /// Registers a factory for `kind`, replacing any previous one.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>, factory: ExerciseFactory) -> Self {
        self.register(kind, factory);
        self
    }

    /// Registers a factory for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, factory: ExerciseFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Looks up the factory for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&ExerciseFactory> {
        self.factories.get(kind)
    }

    /// Whether `kind` has a factory.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }
}

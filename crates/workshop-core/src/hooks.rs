//! Extension points a workshop author can plug into the controller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::WorkshopConfig;
use crate::console::Console;
use crate::progress::ProgressStore;

// ============================================================================
// Completion hook
// ============================================================================

/// Proof that a completion hook handed control back to the controller.
///
/// Only [`Finalizer::finish`] can produce one, so a hook cannot return
/// without having finalized.
#[derive(Debug)]
#[must_use]
pub struct Ended {
    _private: (),
}

/// Handed to a [`CompletionHook`]. Finishing it lets the controller run
/// cleanup and exit.
#[derive(Debug)]
pub struct Finalizer {
    exercise: String,
}

impl Finalizer {
    pub(crate) fn new(exercise: impl Into<String>) -> Self {
        Self {
            exercise: exercise.into(),
        }
    }

    /// The exercise whose pass completed the workshop.
    #[must_use]
    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    /// Hands control back to the controller.
    pub fn finish(self) -> Ended {
        Ended { _private: () }
    }
}

/// Runs once the learner has passed every exercise, in place of the
/// built-in "finished" message.
#[async_trait]
pub trait CompletionHook: Send + Sync {
    /// Called after the last remaining exercise passes. Must finish the
    /// finalizer to let the invocation end.
    async fn on_complete(&self, console: &mut Console, finalizer: Finalizer) -> Ended;
}

// ============================================================================
// Custom commands
// ============================================================================

/// What a custom command handler can see.
#[derive(Debug)]
pub struct CommandContext<'a> {
    /// Learner-facing output.
    pub console: &'a mut Console,
    /// The workshop configuration.
    pub config: &'a WorkshopConfig,
    /// Learner progress.
    pub store: &'a ProgressStore,
    /// Arguments after the command name.
    pub args: &'a [String],
}

/// Handler behind a custom command.
pub type CommandHandler = Arc<dyn Fn(CommandContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// A named command added by the workshop author, dispatched when the mode
/// matches its name and optionally listed in the menu.
#[derive(Clone)]
pub struct Command {
    name: String,
    in_menu: bool,
    handler: CommandHandler,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("in_menu", &self.in_menu)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Creates a command shown in the menu.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            in_menu: true,
            handler: Arc::new(handler),
        }
    }

    /// Keeps the command out of the menu.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.in_menu = false;
        self
    }

    /// The command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the menu lists this command.
    #[must_use]
    pub const fn in_menu(&self) -> bool {
        self.in_menu
    }

    /// Whether `name` selects this command. Names match exactly.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name == name
    }

    pub(crate) fn call(&self, ctx: CommandContext<'_>) -> anyhow::Result<()> {
        (self.handler)(ctx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_finalizer_finishes() {
        let finalizer = Finalizer::new("two");
        assert_eq!(finalizer.exercise(), "two");
        let _ended: Ended = finalizer.finish();
    }

    #[test]
    fn test_command_matching_and_visibility() {
        let command = Command::new("credits", |_ctx| Ok(()));
        assert!(command.matches("credits"));
        assert!(!command.matches("CREDITS"));
        assert!(!command.matches("credit"));
        assert!(command.in_menu());
        assert!(!command.hidden().in_menu());
    }

    #[test]
    fn test_command_call_sees_args() {
        let command = Command::new("echo", |ctx: CommandContext<'_>| {
            ctx.console.line(ctx.args.join(" "))?;
            Ok(())
        });
        let (mut console, captured) = Console::capture();
        let config = WorkshopConfig::new("learnyou", ".");
        let store = ProgressStore::new("unused");
        command
            .call(CommandContext {
                console: &mut console,
                config: &config,
                store: &store,
                args: &["a".to_string(), "b".to_string()],
            })
            .unwrap();
        assert_eq!(captured.contents(), "a b\n");
    }
}

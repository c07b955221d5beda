//! The exercise lifecycle controller.
//!
//! [`Workshop`] owns the exercise list, the learner's progress and every
//! collaborator, and drives one invocation from mode dispatch through
//! pass/fail handling to cleanup. It never exits the process; callers map
//! the returned [`Outcome`] or error to an exit code.

use std::io::Write;
use std::sync::Arc;

use crossterm::style::Stylize;

use crate::config::{Footer, WorkshopConfig};
use crate::console::Console;
use crate::error::{Result, WorkshopError};
use crate::exercise::{ContentType, ExecMode, Exercise, ExerciseRegistry, Reporter, Verdict};
use crate::hooks::{Command, CommandContext, CompletionHook, Finalizer};
use crate::i18n::{Catalog, Localizer};
use crate::lifecycle::{Lifecycle, Phase};
use crate::loader::{ExerciseLoader, LoadedExercise};
use crate::menu::{Menu, MenuEntry, MenuEvent, MenuLabels, MenuView};
use crate::printer::{TerminalPrinter, TextPrinter};
use crate::progress::ProgressStore;
use crate::solutions;

// ============================================================================
// Modes and outcomes
// ============================================================================

/// What the learner asked the workshop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print `<name>@<version>`.
    Version,
    /// Print usage and the workshop's help file.
    Help,
    /// Print the exercise names, one per line.
    List,
    /// Print the selected exercise name.
    Current,
    /// Select an exercise (or re-select the current one) and print it.
    Select(Option<String>),
    /// Same as `Select`.
    Print(Option<String>),
    /// Grade a submission against the current exercise.
    Verify(Vec<String>),
    /// Run a submission for the current exercise without grading.
    Run(Vec<String>),
    /// Forget all progress.
    Reset,
    /// Anything else: a custom command if one matches, otherwise the menu.
    Other(String, Vec<String>),
    /// Show the interactive menu.
    Menu,
}

impl Mode {
    /// Parses positional arguments: the mode word followed by its arguments.
    #[must_use]
    pub fn from_args(args: &[String]) -> Self {
        let Some((mode, rest)) = args.split_first() else {
            return Self::Menu;
        };
        let name = || (!rest.is_empty()).then(|| rest.join(" "));

        match mode.as_str() {
            "version" | "-v" | "--version" => Self::Version,
            "help" | "-h" | "--help" => Self::Help,
            "list" => Self::List,
            "current" => Self::Current,
            "select" => Self::Select(name()),
            "print" => Self::Print(name()),
            "verify" => Self::Verify(rest.to_vec()),
            "run" => Self::Run(rest.to_vec()),
            "reset" => Self::Reset,
            "" | "menu" => Self::Menu,
            other => Self::Other(other.to_string(), rest.to_vec()),
        }
    }
}

/// How an invocation finished when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0.
    Success,
    /// The submission did not pass.
    Failure,
}

impl Outcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }

    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

// ============================================================================
// Workshop
// ============================================================================

/// A workshop installation and one learner's progress through it.
///
/// A `Workshop` serves a single invocation. Once an exercise has been
/// selected or executed its lifecycle is `Ended`, and another `select` or
/// `execute` on the same value fails with `InvalidStateTransition`; build
/// a fresh `Workshop` per invocation. The informational modes (version,
/// help, list, current, reset) and custom commands do not touch the
/// lifecycle.
pub struct Workshop {
    config: WorkshopConfig,
    loader: ExerciseLoader,
    store: ProgressStore,
    i18n: Box<dyn Localizer>,
    printer: Box<dyn TextPrinter>,
    console: Console,
    completion_hook: Option<Arc<dyn CompletionHook>>,
    commands: Vec<Command>,
    current: Option<String>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Workshop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workshop")
            .field("name", &self.config.name)
            .field("exercises", &self.loader.exercises())
            .field("current", &self.current)
            .field("phase", &self.lifecycle.phase())
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl Workshop {
    /// Opens the workshop described by `config`, reading its exercise list
    /// from disk.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the exercise list is missing,
    /// malformed or empty.
    pub fn open(config: WorkshopConfig, registry: ExerciseRegistry) -> Result<Self> {
        let exercises = config.load_exercises()?;
        Ok(Self::new(config, exercises, registry))
    }

    /// Builds a workshop over an explicit exercise list, with the default
    /// collaborators: progress in `config.data_dir()`, the built-in string
    /// catalog, the terminal printer and standard output.
    #[must_use]
    pub fn new(config: WorkshopConfig, exercises: Vec<String>, registry: ExerciseRegistry) -> Self {
        let loader = ExerciseLoader::new(
            config.name.clone(),
            config.app_dir.clone(),
            config.exercise_dir(),
            exercises,
            registry,
        );
        let store = ProgressStore::new(config.data_dir());
        let i18n = Catalog::load(&config.app_dir, config.languages.clone(), &config.language);
        let printer = TerminalPrinter::new(config.name.clone(), config.app_dir.clone(), config.width);
        let current = store.current();

        Self {
            config,
            loader,
            store,
            i18n: Box::new(i18n),
            printer: Box::new(printer),
            console: Console::stdout(),
            completion_hook: None,
            commands: Vec::new(),
            current,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Stores progress in `store` instead of the configured data directory.
    #[must_use]
    pub fn with_store(mut self, store: ProgressStore) -> Self {
        self.current = store.current();
        self.store = store;
        self
    }

    /// Sends learner-facing output to `console`.
    #[must_use]
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Replaces the string catalog.
    #[must_use]
    pub fn with_localizer(mut self, i18n: impl Localizer + 'static) -> Self {
        self.i18n = Box::new(i18n);
        self
    }

    /// Replaces the text printer.
    #[must_use]
    pub fn with_printer(mut self, printer: impl TextPrinter + 'static) -> Self {
        self.printer = Box::new(printer);
        self
    }

    /// Runs `hook` instead of printing the "finished" message once every
    /// exercise has passed.
    #[must_use]
    pub fn with_completion_hook(mut self, hook: impl CompletionHook + 'static) -> Self {
        self.completion_hook = Some(Arc::new(hook));
        self
    }

    /// Adds a custom command.
    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// The workshop configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkshopConfig {
        &self.config
    }

    /// The ordered exercise list.
    #[must_use]
    pub fn exercises(&self) -> &[String] {
        self.loader.exercises()
    }

    /// The selected exercise, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The learner's progress store.
    #[must_use]
    pub const fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Phase tracking for this invocation.
    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Runs one invocation from raw command-line words. A custom command
    /// whose name equals the first word exactly wins over the built-in
    /// modes; anything else is parsed with [`Mode::from_args`].
    ///
    /// # Errors
    ///
    /// Same as [`Workshop::dispatch`].
    pub async fn dispatch_args(&mut self, args: &[String], menu: &mut dyn Menu) -> Result<Outcome> {
        if let Some((name, rest)) = args.split_first() {
            if self.command(name).is_some() {
                return self.run_command(name, rest);
            }
        }
        self.dispatch(Mode::from_args(args), menu).await
    }

    /// Runs one invocation.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the caller prints it and exits non-zero.
    pub async fn dispatch(&mut self, mode: Mode, menu: &mut dyn Menu) -> Result<Outcome> {
        tracing::info!(?mode, "Dispatching");
        match mode {
            Mode::Version => self.print_version(),
            Mode::Help => self.print_help(),
            Mode::List => self.print_list(),
            Mode::Current => self.print_current(),
            Mode::Select(name) | Mode::Print(name) => self.select(name.as_deref()).await,
            Mode::Verify(args) => self.execute(ExecMode::Verify, &args).await,
            Mode::Run(args) => self.execute(ExecMode::Run, &args).await,
            Mode::Reset => self.reset(),
            Mode::Other(name, args) if self.command(&name).is_some() => {
                self.run_command(&name, &args)
            }
            Mode::Other(..) | Mode::Menu => self.show_menu(menu).await,
        }
    }

    // ========================================================================
    // Informational modes
    // ========================================================================

    fn print_version(&mut self) -> Result<Outcome> {
        self.console
            .line(format!("{}@{}", self.config.name, self.config.version))?;
        Ok(Outcome::Success)
    }

    /// Prints the usage text followed by the workshop's help file, if any.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if output or the help file fails.
    pub fn print_help(&mut self) -> Result<Outcome> {
        let usage = self.i18n.translate("usage", &[]);
        self.printer
            .print_text(&mut self.console, ContentType::Text, &usage)?;
        if let Some(path) = self.config.help_path(self.i18n.language()) {
            self.console.blank()?;
            self.printer.print_file(&mut self.console, &path)?;
        }
        Ok(Outcome::Success)
    }

    fn print_list(&mut self) -> Result<Outcome> {
        for name in self.loader.exercises() {
            self.console.line(name)?;
        }
        Ok(Outcome::Success)
    }

    fn print_current(&mut self) -> Result<Outcome> {
        if let Some(current) = &self.current {
            self.console.line(current)?;
        }
        Ok(Outcome::Success)
    }

    /// Deletes all progress and prints a confirmation.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a progress file exists but cannot be removed.
    pub fn reset(&mut self) -> Result<Outcome> {
        self.store.reset()?;
        self.current = None;
        let title = self.config.display_title();
        self.console.line(
            self.i18n
                .translate("progress.reset", &[("title", title.as_str())]),
        )?;
        Ok(Outcome::Success)
    }

    // ========================================================================
    // Selecting
    // ========================================================================

    fn exercise_title(&self, name: &str) -> String {
        self.i18n
            .lookup(&format!("exercise.{name}"))
            .unwrap_or_else(|| name.to_string())
    }

    /// Selects `name`, or re-selects the current exercise, and prints its
    /// instructions.
    ///
    /// # Errors
    ///
    /// - `NoActiveExercise` if no name is given and nothing is selected.
    /// - `ExerciseMissing` if the name does not resolve; the current
    ///   selection is left untouched.
    /// - Loader errors, `PrepareError` and `TextLoadError`.
    pub async fn select(&mut self, name: Option<&str>) -> Result<Outcome> {
        let target = name
            .map(str::to_string)
            .or_else(|| self.current.clone())
            .ok_or(WorkshopError::NoActiveExercise)?;
        let loaded = self.loader.load(&target)?;
        self.lifecycle.transition(Phase::Selecting)?;

        self.print_banner(&loaded)?;
        self.store.set_current(&loaded.meta.name)?;
        self.current = Some(loaded.meta.name.clone());
        tracing::info!(exercise = %loaded.meta.name, "Exercise selected");

        if let Err(e) = loaded.exercise.prepare().await {
            self.lifecycle.transition(Phase::Errored)?;
            return Err(WorkshopError::prepare(&e));
        }
        let text = match loaded.exercise.exercise_text().await {
            Ok(text) => text,
            Err(e) => {
                self.lifecycle.transition(Phase::Errored)?;
                return Err(WorkshopError::text_load(&e));
            }
        };

        self.printer
            .print_text(&mut self.console, text.content_type, &text.text)?;
        self.print_footer()?;
        self.lifecycle.transition(Phase::Ended)?;
        Ok(Outcome::Success)
    }

    fn print_banner(&mut self, loaded: &LoadedExercise) -> Result<()> {
        let title = self.config.display_title();
        let count = loaded.meta.number.to_string();
        let amount = self.loader.exercises().len().to_string();
        let progress = self.i18n.translate(
            "exercise.banner.progress",
            &[("count", count.as_str()), ("amount", amount.as_str())],
        );
        let rule = "\u{2500}".repeat(title.chars().count() + 2);

        self.console.blank()?;
        self.console.line(format!(" {}", title.as_str().green().bold()))?;
        self.console.line(rule.green().bold())?;
        self.console.line(format!(
            " {}",
            self.exercise_title(&loaded.meta.name).yellow().bold()
        ))?;
        self.console.line(format!(" {}", progress.yellow().italic()))?;
        self.console.blank()?;
        Ok(())
    }

    fn print_footer(&mut self) -> Result<()> {
        match self.config.footer(self.i18n.language()) {
            Footer::Disabled => {}
            Footer::Builtin => {
                let footer = self.i18n.translate("footer", &[]);
                self.console.blank()?;
                self.printer
                    .print_text(&mut self.console, ContentType::Markdown, &footer)?;
            }
            Footer::File(path) => {
                self.console.blank()?;
                self.printer.print_file(&mut self.console, &path)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Executing
    // ========================================================================

    /// Runs or verifies the learner's submission against the current
    /// exercise.
    ///
    /// # Errors
    ///
    /// - `NoActiveExercise`, `ExerciseMissing` or loader errors.
    /// - `UsageError` when a submission is required and `args` is empty; the
    ///   exercise is never invoked.
    /// - `UnexpectedExecutionError` when `verify` reports an error. A `run`
    ///   error is logged and the invocation ends normally.
    /// - `SolutionLoadError` and `CleanupError`.
    pub async fn execute(&mut self, mode: ExecMode, args: &[String]) -> Result<Outcome> {
        let current = self.current.clone().ok_or(WorkshopError::NoActiveExercise)?;
        let loaded = self.loader.load(&current)?;
        if loaded.exercise.require_submission() && args.is_empty() {
            return Err(WorkshopError::usage(&self.config.name, mode));
        }

        self.lifecycle.transition(Phase::Executing)?;
        tracing::info!(exercise = %loaded.meta.name, %mode, "Executing");
        let result = self.invoke(loaded.exercise.as_ref(), mode, args).await?;

        match result {
            Err(e) => {
                self.lifecycle.transition(Phase::Errored)?;
                self.end(loaded.exercise.as_ref(), mode, true).await?;
                match mode {
                    ExecMode::Run => {
                        tracing::warn!(error = %format!("{e:#}"), "Run ended with an error");
                        Ok(Outcome::Success)
                    }
                    ExecMode::Verify => Err(WorkshopError::unexpected(mode, &e)),
                }
            }
            Ok(_) if mode == ExecMode::Run => {
                self.lifecycle.transition(Phase::Passed)?;
                self.end(loaded.exercise.as_ref(), mode, true).await?;
                Ok(Outcome::Success)
            }
            Ok(false) => self.fail(&loaded, mode).await,
            Ok(true) => self.pass(&loaded, mode).await,
        }
    }

    /// Invokes the exercise while printing each verdict as it arrives.
    async fn invoke(
        &mut self,
        exercise: &dyn Exercise,
        mode: ExecMode,
        args: &[String],
    ) -> Result<anyhow::Result<bool>> {
        let (reporter, mut verdicts) = Reporter::channel();
        let console = &mut self.console;

        let execution = async move {
            match mode {
                ExecMode::Run => exercise.run(args, reporter).await,
                ExecMode::Verify => exercise.verify(args, reporter).await,
            }
        };
        let printing = async {
            while let Some(verdict) = verdicts.recv().await {
                match verdict {
                    Verdict::Pass(msg) => console.line(format!("{}{msg}", "\u{2713} ".green().bold()))?,
                    Verdict::Fail(msg) => console.line(format!("{}{msg}", "\u{2717} ".red().bold()))?,
                }
            }
            Ok::<_, std::io::Error>(())
        };

        let (result, printed) = tokio::join!(execution, printing);
        printed?;
        Ok(result)
    }

    async fn fail(&mut self, loaded: &LoadedExercise, mode: ExecMode) -> Result<Outcome> {
        self.lifecycle.transition(Phase::Failed)?;
        tracing::info!(exercise = %loaded.meta.name, "Submission failed");

        let title = self.i18n.translate("solution.fail.title", &[]);
        let message = self
            .i18n
            .translate("solution.fail.message", &[("name", loaded.meta.name.as_str())]);
        self.console.blank()?;
        self.console.line(format!("# {title}").red().bold())?;
        self.console.blank()?;
        self.console.line(message)?;

        self.end(loaded.exercise.as_ref(), mode, false).await?;
        Ok(Outcome::Failure)
    }

    async fn pass(&mut self, loaded: &LoadedExercise, mode: ExecMode) -> Result<Outcome> {
        self.lifecycle.transition(Phase::Passed)?;
        tracing::info!(exercise = %loaded.meta.name, "Submission passed");
        let name = loaded.meta.name.as_str();

        let title = self.i18n.translate("solution.pass.title", &[]);
        let message = self.i18n.translate("solution.pass.message", &[("name", name)]);
        self.console.blank()?;
        self.console.line(format!("# {title}").green().bold())?;
        self.console.blank()?;
        self.console.line(message.bold())?;
        self.console.blank()?;

        if !loaded.exercise.hide_solutions() {
            self.show_solutions(loaded.exercise.as_ref()).await?;
        }

        let completed = self.store.mark_completed(name)?;
        let done = self
            .loader
            .exercises()
            .iter()
            .filter(|exercise| completed.contains(exercise))
            .count();
        let remaining = self.loader.exercises().len().saturating_sub(done);
        tracing::debug!(remaining, "Progress updated");

        if remaining == 0 {
            if let Some(hook) = self.completion_hook.clone() {
                let _ended = hook.on_complete(&mut self.console, Finalizer::new(name)).await;
            } else {
                self.console.line(self.i18n.translate("progress.finished", &[]))?;
            }
        } else {
            self.console
                .line(self.i18n.translate_plural("progress.remaining", remaining))?;
            self.console.line(
                self.i18n
                    .translate("ui.return", &[("appname", self.config.name.as_str())]),
            )?;
        }

        self.end(loaded.exercise.as_ref(), mode, true).await?;
        Ok(Outcome::Success)
    }

    async fn show_solutions(&mut self, exercise: &dyn Exercise) -> Result<()> {
        let files = exercise
            .solution_files()
            .await
            .map_err(|e| WorkshopError::solution_load(format!("{e:#}")))?;
        if files.is_empty() {
            return Ok(());
        }

        self.console
            .line(self.i18n.translate("solution.notes.compare", &[]))?;
        let solutions = solutions::load(&files, self.printer.as_ref()).await?;
        write!(self.console.writer(), "{}", solutions::render(&solutions))?;
        Ok(())
    }

    async fn end(&mut self, exercise: &dyn Exercise, mode: ExecMode, passed: bool) -> Result<()> {
        exercise
            .end(mode, passed)
            .await
            .map_err(|e| WorkshopError::cleanup(&e))?;
        self.lifecycle.transition(Phase::Ended)?;
        self.console.flush()?;
        Ok(())
    }

    // ========================================================================
    // Menu and custom commands
    // ========================================================================

    fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.matches(name))
    }

    /// Runs the custom command called `name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand` if no such command is registered and
    /// `CommandError` if its handler fails.
    pub fn run_command(&mut self, name: &str, args: &[String]) -> Result<Outcome> {
        let command = self
            .command(name)
            .cloned()
            .ok_or_else(|| WorkshopError::UnknownCommand {
                name: name.to_string(),
            })?;
        tracing::info!(command = command.name(), "Running custom command");
        command
            .call(CommandContext {
                console: &mut self.console,
                config: &self.config,
                store: &self.store,
                args,
            })
            .map_err(|e| WorkshopError::command(command.name(), &e))?;
        Ok(Outcome::Success)
    }

    fn menu_view(&self) -> MenuView {
        let completed = self.store.completed();
        let label = |key: &str| self.i18n.translate(key, &[]);

        MenuView {
            title: self.config.display_title(),
            subtitle: self.config.subtitle.clone(),
            exercises: self
                .loader
                .exercises()
                .iter()
                .map(|name| MenuEntry {
                    name: name.clone(),
                    title: self.exercise_title(name),
                    completed: completed.contains(name),
                })
                .collect(),
            extras: self
                .commands
                .iter()
                .filter(|command| command.in_menu())
                .map(|command| command.name().to_string())
                .collect(),
            show_language: self.i18n.languages().len() > 1,
            labels: MenuLabels {
                completed: label("menu.completed"),
                help: label("menu.help"),
                language: label("menu.language"),
                exit: label("menu.exit"),
                prompt: label("menu.prompt"),
                language_prompt: label("menu.language_prompt"),
            },
        }
    }

    /// Shows the menu until the learner picks something that ends the
    /// invocation. Changing the language redraws the menu.
    ///
    /// # Errors
    ///
    /// Returns whatever the chosen action returns, or an I/O error from
    /// the menu itself.
    pub async fn show_menu(&mut self, menu: &mut dyn Menu) -> Result<Outcome> {
        loop {
            let view = self.menu_view();
            match menu.show(&view)? {
                MenuEvent::Select(name) => return self.select(Some(&name)).await,
                MenuEvent::Exit => {
                    self.console.blank()?;
                    return Ok(Outcome::Success);
                }
                MenuEvent::Help => {
                    self.console.blank()?;
                    return self.print_help();
                }
                MenuEvent::Extra(name) => return self.run_command(&name, &[]),
                MenuEvent::Language => {
                    let languages = self.i18n.languages().to_vec();
                    let current = self.i18n.language().to_string();
                    if let Some(lang) = menu.choose_language(&view, &languages, &current)? {
                        self.i18n.change_language(&lang);
                    }
                }
            }
        }
    }
}

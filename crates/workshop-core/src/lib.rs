//! Workshop Core
//!
//! Drives exercise-based terminal workshops: exercise selection, run and
//! verify dispatch, pass/fail reporting, solution display and persisted
//! learner progress.

pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod exercise;
pub mod hooks;
pub mod i18n;
pub mod lifecycle;
pub mod loader;
pub mod menu;
pub mod printer;
pub mod program;
pub mod progress;
pub mod solutions;

pub use config::{Footer, FooterSetting, WorkshopConfig, CONFIG_FILE_NAME, DEFAULT_WIDTH};
pub use console::{strip_ansi, Captured, Console};
pub use controller::{Mode, Outcome, Workshop};
pub use error::{Result, WorkshopError};
pub use exercise::{
    ContentType, ExecMode, Exercise, ExerciseContext, ExerciseFactory, ExerciseMeta,
    ExerciseRegistry, ExerciseText, Reporter, Verdict,
};
pub use hooks::{Command, CommandContext, CommandHandler, CompletionHook, Ended, Finalizer};
pub use i18n::{Catalog, Localizer};
pub use lifecycle::{Lifecycle, Phase};
pub use loader::{dir_from_name, id_from_name, ExerciseLoader, LoadedExercise, ENTRY_FILE_NAME};
pub use menu::{menu_rows, Menu, MenuEntry, MenuEvent, MenuLabels, MenuView, SelectMenu};
pub use printer::{TerminalPrinter, TextPrinter};
pub use program::{ProgramExercise, ProgramOptions};
pub use progress::ProgressStore;
pub use solutions::SolutionFile;

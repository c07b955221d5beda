//! Exercise resolution and loading.
//!
//! Names resolve case-insensitively against the ordered exercise list.
//! Each exercise directory holds an `exercise.json` manifest whose `kind`
//! picks the factory that builds it.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, WorkshopError};
use crate::exercise::{Exercise, ExerciseContext, ExerciseMeta, ExerciseRegistry};

/// Entry point file name inside each exercise directory.
pub const ENTRY_FILE_NAME: &str = "exercise.json";

static WHITESPACE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s").ok());
static NON_WORD: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[^\w]").ok());

/// Derives the exercise identifier: lower-cased, whitespace replaced with
/// `_`, every other non-word character removed.
#[must_use]
pub fn id_from_name(name: &str) -> String {
    let id = name.to_lowercase();
    let id = match WHITESPACE.as_ref() {
        Some(re) => re.replace_all(&id, "_").into_owned(),
        None => id,
    };
    match NON_WORD.as_ref() {
        Some(re) => re.replace_all(&id, "").into_owned(),
        None => id,
    }
}

/// Directory for the exercise called `name`.
#[must_use]
pub fn dir_from_name(exercise_dir: &Path, name: &str) -> PathBuf {
    exercise_dir.join(id_from_name(name))
}

#[derive(Debug, Deserialize)]
struct Manifest {
    kind: String,
    #[serde(flatten)]
    options: serde_json::Map<String, serde_json::Value>,
}

/// An initialized exercise together with its metadata.
pub struct LoadedExercise {
    /// Resolution result the exercise was built from.
    pub meta: ExerciseMeta,
    /// The initialized exercise.
    pub exercise: Box<dyn Exercise>,
}

impl std::fmt::Debug for LoadedExercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedExercise")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Resolves exercise names and builds exercises from their manifests.
#[derive(Debug, Clone)]
pub struct ExerciseLoader {
    app_name: String,
    app_dir: PathBuf,
    exercise_dir: PathBuf,
    exercises: Vec<String>,
    registry: ExerciseRegistry,
}

impl ExerciseLoader {
    /// Creates a loader over the ordered exercise list.
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        app_dir: impl Into<PathBuf>,
        exercise_dir: impl Into<PathBuf>,
        exercises: Vec<String>,
        registry: ExerciseRegistry,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_dir: app_dir.into(),
            exercise_dir: exercise_dir.into(),
            exercises,
            registry,
        }
    }

    /// The ordered exercise list.
    #[must_use]
    pub fn exercises(&self) -> &[String] {
        &self.exercises
    }

    /// Resolves `name` to its metadata, ignoring case and surrounding
    /// whitespace. Returns `None` if no exercise matches.
    #[must_use]
    pub fn meta(&self, name: &str) -> Option<ExerciseMeta> {
        let wanted = name.trim().to_lowercase();
        let (index, name) = self
            .exercises
            .iter()
            .enumerate()
            .find(|(_, candidate)| candidate.trim().to_lowercase() == wanted)?;

        let dir = dir_from_name(&self.exercise_dir, name);
        Some(ExerciseMeta {
            name: name.clone(),
            number: index + 1,
            exercise_file: dir.join(ENTRY_FILE_NAME),
            id: id_from_name(name),
            dir,
        })
    }

    /// Resolves `name` and builds a fresh, initialized exercise for it.
    ///
    /// # Errors
    ///
    /// - `ExerciseMissing` if the name does not resolve.
    /// - `MissingEntryFile` if the manifest is not a regular file.
    /// - `NotAWorkshopperModule` if the manifest is unreadable or names a
    ///   kind with no registered factory.
    pub fn load(&self, name: &str) -> Result<LoadedExercise> {
        let meta = self
            .meta(name)
            .ok_or_else(|| WorkshopError::exercise_missing(name))?;

        let is_file = std::fs::metadata(&meta.exercise_file)
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(WorkshopError::missing_entry(&meta.exercise_file));
        }

        let contents = std::fs::read_to_string(&meta.exercise_file)?;
        let manifest: Manifest = serde_json::from_str(&contents)
            .map_err(|e| WorkshopError::not_an_exercise(&meta.exercise_file, e.to_string()))?;

        let factory = self.registry.get(&manifest.kind).ok_or_else(|| {
            WorkshopError::not_an_exercise(
                &meta.exercise_file,
                format!("no exercise kind '{}' is registered", manifest.kind),
            )
        })?;

        let mut exercise = factory(&manifest.options)
            .map_err(|e| WorkshopError::not_an_exercise(&meta.exercise_file, format!("{e:#}")))?;

        exercise.init(ExerciseContext {
            app_name: self.app_name.clone(),
            app_dir: self.app_dir.clone(),
            id: meta.id.clone(),
            name: meta.name.clone(),
            dir: meta.dir.clone(),
            number: meta.number,
        });

        tracing::debug!(name = %meta.name, kind = %manifest.kind, number = meta.number, "Exercise loaded");
        Ok(LoadedExercise { meta, exercise })
    }
}

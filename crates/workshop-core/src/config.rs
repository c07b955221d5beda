//! Configuration types for a workshop installation.
//!
//! A workshop is a directory containing `workshop.json` and an exercise
//! directory with an ordered `menu.json`. This module loads and validates
//! both, and resolves the paths the rest of the controller works with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkshopError};

/// The workshop config file name.
pub const CONFIG_FILE_NAME: &str = "workshop.json";

/// Name of the ordered exercise list inside the exercise directory.
pub const MENU_FILE_NAME: &str = "menu.json";

/// Default text wrap width.
pub const DEFAULT_WIDTH: usize = 65;

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_exercise_dir() -> String {
    "exercises".to_string()
}

const fn default_width() -> usize {
    DEFAULT_WIDTH
}

fn default_language() -> String {
    "en".to_string()
}

fn default_languages() -> Vec<String> {
    vec![default_language()]
}

/// Footer setting: a file path, or `false` to disable the footer entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FooterSetting {
    /// `true` keeps the built-in footer, `false` disables it.
    Enabled(bool),
    /// A footer file; `{lang}` is replaced with the active language.
    File(String),
}

/// Where the footer printed after the exercise text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Footer {
    /// No footer.
    Disabled,
    /// The localized built-in footer.
    Builtin,
    /// A footer file supplied by the workshop.
    File(PathBuf),
}

/// Main configuration for a workshop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopConfig {
    /// Application name. Names the progress directory and appears in usage text.
    pub name: String,

    /// Version printed by the `version` mode.
    #[serde(default = "default_version")]
    pub version: String,

    /// Title shown in banners and the menu. Defaults to the upper-cased name.
    #[serde(default)]
    pub title: Option<String>,

    /// Subtitle shown under the menu title.
    #[serde(default)]
    pub subtitle: Option<String>,

    /// Exercise directory, relative to the application directory.
    #[serde(default = "default_exercise_dir")]
    pub exercise_dir: String,

    /// Ordered exercise list. Defaults to `<exerciseDir>/menu.json`.
    #[serde(default)]
    pub menu_json: Option<String>,

    /// Wrap width for printed text.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Extra help file printed after the usage text.
    #[serde(default)]
    pub help_file: Option<String>,

    /// Footer printed after the exercise text.
    #[serde(default)]
    pub footer_file: Option<FooterSetting>,

    /// Initial language.
    #[serde(default = "default_language")]
    pub language: String,

    /// Languages offered by the language menu.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Progress directory override. Defaults to `~/.config/<name>`.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Directory the config was loaded from.
    #[serde(skip)]
    pub app_dir: PathBuf,
}

impl WorkshopConfig {
    /// Creates a configuration with defaults for everything but the name.
    #[must_use]
    pub fn new(name: impl Into<String>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            title: None,
            subtitle: None,
            exercise_dir: default_exercise_dir(),
            menu_json: None,
            width: default_width(),
            help_file: None,
            footer_file: None,
            language: default_language(),
            languages: default_languages(),
            data_dir: None,
            app_dir: app_dir.into(),
        }
    }

    /// Loads `workshop.json` from the given application directory.
    ///
    /// # Errors
    ///
    /// Returns `WorkshopError::ConfigParseError` if the file is missing or
    /// malformed, and `WorkshopError::ConfigValidationError` if a value is
    /// out of range.
    pub fn load_from_dir(app_dir: &Path) -> Result<Self> {
        Self::load_from_file(&app_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path. The file's parent
    /// directory becomes the application directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WorkshopError::config_parse(path, format!("failed to read file: {e}")))?;

        let mut config: Self = serde_json::from_str(&contents)
            .map_err(|e| WorkshopError::config_parse(path, e.to_string()))?;
        config.app_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        config.validate()?;

        tracing::debug!(name = %config.name, app_dir = %config.app_dir.display(), "Workshop config loaded");
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WorkshopError::config_validation(
                "name must not be empty",
                "Set a workshop name in your workshop.json",
            ));
        }

        if self.width == 0 {
            return Err(WorkshopError::config_validation(
                "width must be greater than 0",
                "Remove width from your workshop.json to use the default of 65",
            ));
        }

        if self.languages.is_empty() {
            return Err(WorkshopError::config_validation(
                "languages must not be empty",
                "List at least one language, e.g. [\"en\"]",
            ));
        }

        if !self.languages.contains(&self.language) {
            return Err(WorkshopError::config_validation(
                format!("language '{}' is not listed in languages", self.language),
                "Add the language to the languages list in your workshop.json",
            ));
        }

        Ok(())
    }

    /// Title shown in banners.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.name.to_uppercase())
    }

    /// Resolved exercise directory.
    #[must_use]
    pub fn exercise_dir(&self) -> PathBuf {
        self.app_dir.join(&self.exercise_dir)
    }

    /// Resolved path of the ordered exercise list.
    #[must_use]
    pub fn menu_path(&self) -> PathBuf {
        self.menu_json.as_ref().map_or_else(
            || self.exercise_dir().join(MENU_FILE_NAME),
            |p| self.app_dir.join(p),
        )
    }

    /// Resolved progress directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return self.app_dir.join(dir);
        }
        dirs::home_dir().map_or_else(
            || self.app_dir.join(".workshop-data"),
            |home| home.join(".config").join(&self.name),
        )
    }

    /// Resolves the help file for `lang`, if configured and present.
    #[must_use]
    pub fn help_path(&self, lang: &str) -> Option<PathBuf> {
        self.help_file
            .as_deref()
            .map(|file| self.app_dir.join(file.replace("{lang}", lang)))
            .filter(|path| path.is_file())
    }

    /// Resolves the footer for `lang`.
    ///
    /// A configured file that does not exist falls back to the built-in footer.
    #[must_use]
    pub fn footer(&self, lang: &str) -> Footer {
        match &self.footer_file {
            Some(FooterSetting::Enabled(false)) => Footer::Disabled,
            Some(FooterSetting::File(file)) => {
                let path = self.app_dir.join(file.replace("{lang}", lang));
                if path.is_file() {
                    Footer::File(path)
                } else {
                    Footer::Builtin
                }
            }
            Some(FooterSetting::Enabled(true)) | None => Footer::Builtin,
        }
    }

    /// Loads the ordered exercise list, dropping `//` comment entries.
    pub fn load_exercises(&self) -> Result<Vec<String>> {
        let path = self.menu_path();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| WorkshopError::config_parse(&path, format!("failed to read file: {e}")))?;
        let entries: Vec<String> = serde_json::from_str(&contents)
            .map_err(|e| WorkshopError::config_parse(&path, e.to_string()))?;

        let exercises: Vec<String> = entries
            .into_iter()
            .filter(|entry| !entry.starts_with("//"))
            .collect();

        if exercises.is_empty() {
            return Err(WorkshopError::config_validation(
                format!("'{}' lists no exercises", path.display()),
                "Add at least one exercise name to menu.json",
            ));
        }

        tracing::debug!(count = exercises.len(), "Exercise list loaded");
        Ok(exercises)
    }
}

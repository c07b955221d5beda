//! Localized strings.
//!
//! The controller only needs [`Localizer`]. [`Catalog`] is the default
//! implementation: a built-in English table, optionally overlaid with
//! `<appDir>/i18n/<lang>.json` files shipped by the workshop.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\{(\w+)\}").ok());

const BUILTIN_EN: &[(&str, &str)] = &[
    ("exercise.banner.progress", "Exercise {count} of {amount}"),
    ("solution.pass.title", "PASS"),
    ("solution.pass.message", "Your solution to {name} passed!"),
    ("solution.fail.title", "FAIL"),
    ("solution.fail.message", "Your solution to {name} didn't pass. Try again!"),
    ("solution.notes.compare", "Here's the official solution in case you want to compare notes:"),
    ("progress.finished", "You've finished all the challenges! Hooray!"),
    ("progress.remaining.one", "You have one challenge left."),
    ("progress.remaining.other", "You have {count} challenges left."),
    ("progress.reset", "{title} progress reset"),
    ("ui.return", "Type '{appname}' to show the menu."),
    ("menu.help", "HELP"),
    ("menu.exit", "EXIT"),
    ("menu.language", "CHOOSE LANGUAGE"),
    ("menu.completed", "[COMPLETED]"),
    ("menu.prompt", "Select an exercise"),
    ("menu.language_prompt", "Select a language"),
    (
        "footer",
        "To print these instructions again, run: `{appname} print`\n\
         To execute your program in a test environment, run: `{appname} run program`\n\
         To verify your program, run: `{appname} verify program`",
    ),
    (
        "usage",
        "Usage\n\
         \n  {appname}\n      Show a menu to interactively select a workshop.\
         \n  {appname} list\n      Show a newline-separated list of all the workshops.\
         \n  {appname} select NAME\n      Select a workshop.\
         \n  {appname} current\n      Show the currently selected workshop.\
         \n  {appname} run program\n      Run your program against the selected input.\
         \n  {appname} verify program\n      Verify your program against the expected output.\
         \n  {appname} print\n      Print the instructions for the currently selected workshop.\
         \n  {appname} reset\n      Reset completion history.\
         \n  {appname} help\n      Show this help.\
         \n  {appname} version\n      Show the version.",
    ),
];

/// Replaces `{var}` placeholders with values from `vars`. Unknown
/// placeholders are left untouched.
#[must_use]
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return template.to_string();
    };
    re.replace_all(template, |caps: &Captures<'_>| {
        vars.iter()
            .find(|(key, _)| *key == &caps[1])
            .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
    })
    .into_owned()
}

/// Maps message keys to localized strings.
pub trait Localizer: Send + Sync {
    /// The active language.
    fn language(&self) -> &str;

    /// Languages the learner can switch to.
    fn languages(&self) -> &[String];

    /// Switches the active language. Returns `false` for unknown languages.
    fn change_language(&mut self, lang: &str) -> bool;

    /// The raw template for `key`, if the key is known.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Looks up `key` and fills in its placeholders. Unknown keys render as
    /// the key itself.
    fn translate(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let template = self.lookup(key).unwrap_or_else(|| key.to_string());
        interpolate(&template, vars)
    }

    /// Picks the `.one` or `.other` form of `key` for `count` and fills in
    /// `{count}`.
    fn translate_plural(&self, key: &str, count: usize) -> String {
        let form = if count == 1 { "one" } else { "other" };
        let count = count.to_string();
        self.translate(&format!("{key}.{form}"), &[("count", count.as_str())])
    }
}

/// Built-in English strings with optional per-language overlays.
#[derive(Debug, Clone)]
pub struct Catalog {
    i18n_dir: Option<PathBuf>,
    languages: Vec<String>,
    language: String,
    builtin: HashMap<String, String>,
    overlay: HashMap<String, String>,
}

impl Catalog {
    /// English strings only.
    #[must_use]
    pub fn english() -> Self {
        Self {
            i18n_dir: None,
            languages: vec!["en".to_string()],
            language: "en".to_string(),
            builtin: BUILTIN_EN
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            overlay: HashMap::new(),
        }
    }

    /// Strings for `language`, overlaid from `<app_dir>/i18n/<lang>.json`
    /// when such a file exists.
    #[must_use]
    pub fn load(app_dir: &Path, languages: Vec<String>, language: &str) -> Self {
        let mut catalog = Self {
            i18n_dir: Some(app_dir.join("i18n")),
            languages,
            ..Self::english()
        };
        catalog.language = language.to_string();
        catalog.overlay = catalog.read_overlay(language);
        catalog
    }

    fn read_overlay(&self, language: &str) -> HashMap<String, String> {
        let Some(dir) = &self.i18n_dir else {
            return HashMap::new();
        };
        let path = dir.join(format!("{language}.json"));
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return HashMap::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed translation file");
            HashMap::new()
        })
    }
}

impl Localizer for Catalog {
    fn language(&self) -> &str {
        &self.language
    }

    fn languages(&self) -> &[String] {
        &self.languages
    }

    fn change_language(&mut self, lang: &str) -> bool {
        if !self.languages.iter().any(|l| l == lang) {
            return false;
        }
        self.language = lang.to_string();
        self.overlay = self.read_overlay(lang);
        tracing::info!(language = lang, "Language changed");
        true
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.overlay
            .get(key)
            .or_else(|| self.builtin.get(key))
            .cloned()
    }
}

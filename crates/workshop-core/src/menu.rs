//! Interactive exercise menu.
//!
//! The controller hands a [`MenuView`] to a [`Menu`] and acts on the
//! [`MenuEvent`] it returns. [`SelectMenu`] is the terminal implementation,
//! an arrow-key list built on `dialoguer::Select`.

use std::io::{self, Write};

use crossterm::style::Stylize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

/// What the learner picked in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    /// An exercise, by name.
    Select(String),
    /// Leave the workshop.
    Exit,
    /// Open the language menu.
    Language,
    /// Show help.
    Help,
    /// Run the custom command with this name.
    Extra(String),
}

/// One exercise row in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Exercise name as written in the exercise list.
    pub name: String,
    /// Localized title.
    pub title: String,
    /// Whether the learner has passed it.
    pub completed: bool,
}

/// Everything a menu needs to draw itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    /// Workshop title.
    pub title: String,
    /// Optional subtitle.
    pub subtitle: Option<String>,
    /// Exercises in list order.
    pub exercises: Vec<MenuEntry>,
    /// Custom command names shown after the exercises.
    pub extras: Vec<String>,
    /// Whether more than one language is available.
    pub show_language: bool,
    /// Localized labels: completed marker, help, language, exit, prompt.
    pub labels: MenuLabels,
}

/// Localized menu labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLabels {
    /// Marker appended to completed exercises.
    pub completed: String,
    /// Help entry.
    pub help: String,
    /// Language entry.
    pub language: String,
    /// Exit entry.
    pub exit: String,
    /// Input prompt.
    pub prompt: String,
    /// Language menu prompt.
    pub language_prompt: String,
}

/// Displays the menu and reports the learner's choice.
pub trait Menu {
    /// Shows the exercise menu and waits for a choice.
    fn show(&mut self, view: &MenuView) -> io::Result<MenuEvent>;

    /// Shows the language menu. `None` means "go back".
    fn choose_language(
        &mut self,
        view: &MenuView,
        languages: &[String],
        current: &str,
    ) -> io::Result<Option<String>>;
}

/// Menu rows in display order with the event each one triggers:
/// exercises (completed ones marked), custom commands, help, language
/// when there is more than one, and exit.
#[must_use]
pub fn menu_rows(view: &MenuView) -> Vec<(String, MenuEvent)> {
    let mut rows: Vec<(String, MenuEvent)> = view
        .exercises
        .iter()
        .map(|entry| {
            let label = if entry.completed {
                format!("{} {}", entry.title, view.labels.completed.as_str().green())
            } else {
                entry.title.clone()
            };
            (label, MenuEvent::Select(entry.name.clone()))
        })
        .collect();

    rows.extend(
        view.extras
            .iter()
            .map(|extra| (extra.to_uppercase(), MenuEvent::Extra(extra.clone()))),
    );
    rows.push((view.labels.help.clone(), MenuEvent::Help));
    if view.show_language {
        rows.push((view.labels.language.clone(), MenuEvent::Language));
    }
    rows.push((view.labels.exit.clone(), MenuEvent::Exit));
    rows
}

/// Row highlighted when the menu opens: the first exercise not yet passed.
fn first_open(view: &MenuView) -> usize {
    view.exercises
        .iter()
        .position(|entry| !entry.completed)
        .unwrap_or(0)
}

/// Arrow-key menu. The workshop header goes to `output`; the selection
/// list draws on the terminal. Escape or `q` leaves the workshop.
pub struct SelectMenu<W> {
    output: W,
    width: usize,
    theme: ColorfulTheme,
}

impl<W> std::fmt::Debug for SelectMenu<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectMenu")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl<W: Write> SelectMenu<W> {
    /// Creates a menu drawing its header on `output`.
    pub fn new(output: W, width: usize) -> Self {
        Self {
            output,
            width,
            theme: ColorfulTheme::default(),
        }
    }

    fn draw_header(&mut self, view: &MenuView) -> io::Result<()> {
        let rule = "\u{2500}".repeat(self.width);
        writeln!(self.output)?;
        writeln!(self.output, " {}", view.title.as_str().bold().green())?;
        if let Some(subtitle) = &view.subtitle {
            writeln!(self.output, " {}", subtitle.as_str().italic())?;
        }
        writeln!(self.output, "{}", rule.as_str().green())?;
        self.output.flush()
    }
}

impl<W: Write> Menu for SelectMenu<W> {
    fn show(&mut self, view: &MenuView) -> io::Result<MenuEvent> {
        self.draw_header(view)?;
        let rows = menu_rows(view);
        let labels: Vec<&str> = rows.iter().map(|(label, _)| label.as_str()).collect();

        let choice = Select::with_theme(&self.theme)
            .with_prompt(view.labels.prompt.as_str())
            .items(&labels)
            .default(first_open(view))
            .interact_opt()
            .map_err(io::Error::other)?;

        Ok(choice
            .and_then(|i| rows.into_iter().nth(i))
            .map_or(MenuEvent::Exit, |(_, event)| event))
    }

    fn choose_language(
        &mut self,
        view: &MenuView,
        languages: &[String],
        current: &str,
    ) -> io::Result<Option<String>> {
        let selected = languages
            .iter()
            .position(|lang| lang == current)
            .unwrap_or(0);

        let choice = Select::with_theme(&self.theme)
            .with_prompt(view.labels.language_prompt.as_str())
            .items(languages)
            .default(selected)
            .interact_opt()
            .map_err(io::Error::other)?;

        Ok(choice.and_then(|i| languages.get(i)).cloned())
    }
}

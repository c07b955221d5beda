//! End-to-end lifecycle tests against the hello-workshop fixture.
//!
//! Each test builds a fresh `Workshop` per invocation, the way the binary
//! does, with progress kept in a scratch directory.

use std::io;
use std::path::{Path, PathBuf};

use workshop_core::{
    Captured, Console, ExecMode, ExerciseRegistry, Menu, MenuEvent, MenuView, Mode, Outcome,
    ProgressStore, Workshop, WorkshopConfig, WorkshopError,
};

/// Path to the fixture workshop.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/hello-workshop")
}

/// Opens the fixture workshop with progress stored under `data_dir`.
fn open(data_dir: &Path) -> (Workshop, Captured) {
    let config = WorkshopConfig::load_from_dir(&fixture_path()).expect("Failed to load config");
    let (console, captured) = Console::capture();
    let workshop = Workshop::open(config, ExerciseRegistry::with_builtins())
        .expect("Failed to open workshop")
        .with_store(ProgressStore::new(data_dir))
        .with_console(console);
    (workshop, captured)
}

/// Writes a learner submission and returns its path as an argument.
fn submission(dir: &Path, name: &str, script: &str) -> Vec<String> {
    let path = dir.join(name);
    std::fs::write(&path, script).expect("Failed to write submission");
    vec![path.display().to_string()]
}

/// A menu that picks from a fixed list, then exits.
struct Picks(Vec<MenuEvent>);

impl Menu for Picks {
    fn show(&mut self, _view: &MenuView) -> io::Result<MenuEvent> {
        if self.0.is_empty() {
            Ok(MenuEvent::Exit)
        } else {
            Ok(self.0.remove(0))
        }
    }

    fn choose_language(
        &mut self,
        _view: &MenuView,
        languages: &[String],
        _current: &str,
    ) -> io::Result<Option<String>> {
        Ok(languages.last().cloned())
    }
}

#[test]
fn test_fixture_config_loads() {
    let config = WorkshopConfig::load_from_dir(&fixture_path()).expect("Failed to load config");
    assert_eq!(config.name, "hello-workshop");
    assert_eq!(config.display_title(), "HELLO WORKSHOP");

    let exercises = config.load_exercises().expect("Failed to load exercises");
    assert_eq!(exercises, vec!["Hello World", "Count Up"]);
}

#[tokio::test]
async fn test_select_prints_instructions() {
    let data = tempfile::tempdir().expect("tempdir");
    let (mut workshop, out) = open(data.path());

    let outcome = workshop
        .dispatch(Mode::Select(Some("hello WORLD".to_string())), &mut Picks(Vec::new()))
        .await
        .expect("select failed");

    assert_eq!(outcome, Outcome::Success);
    let text = out.plain();
    assert!(text.contains(" HELLO WORKSHOP"));
    assert!(text.contains("Exercise 1 of 2"));
    assert!(text.contains("prints HELLO WORLD to standard output"));
    assert!(!text.contains('`'));
    assert!(text.contains("hello-workshop verify program.sh"));
    assert!(text.contains("To verify your program, run: hello-workshop verify program"));

    let store = ProgressStore::new(data.path());
    assert_eq!(store.current().as_deref(), Some("Hello World"));
}

#[tokio::test]
async fn test_select_unknown_exercise() {
    let data = tempfile::tempdir().expect("tempdir");
    let (mut workshop, _) = open(data.path());

    let err = workshop
        .select(Some("doesnotexist"))
        .await
        .expect_err("unknown exercise should fail");
    assert!(matches!(err, WorkshopError::ExerciseMissing { .. }));
    assert_eq!(ProgressStore::new(data.path()).current(), None);
}

#[tokio::test]
async fn test_full_workshop_walkthrough() {
    let data = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");

    // Pick the first exercise.
    let (mut workshop, _) = open(data.path());
    workshop.select(Some("Hello World")).await.expect("select failed");

    // A wrong answer fails and records nothing.
    let (mut workshop, out) = open(data.path());
    let wrong = submission(work.path(), "wrong.sh", "echo hello world\n");
    let outcome = workshop
        .execute(ExecMode::Verify, &wrong)
        .await
        .expect("verify failed");
    assert_eq!(outcome, Outcome::Failure);
    assert!(out.plain().contains("\u{2717} line 1"));
    assert!(out.plain().contains("# FAIL"));
    assert!(ProgressStore::new(data.path()).completed().is_empty());

    // The right answer passes and shows the reference solution.
    let (mut workshop, out) = open(data.path());
    let right = submission(work.path(), "right.sh", "echo \"HELLO WORLD\"\n");
    let outcome = workshop
        .execute(ExecMode::Verify, &right)
        .await
        .expect("verify failed");
    assert_eq!(outcome, Outcome::Success);
    let text = out.plain();
    assert!(text.contains("\u{2713} line 1: HELLO WORLD"));
    assert!(text.contains("# PASS"));
    assert!(text.contains("echo \"HELLO WORLD\""));
    assert!(text.contains("You have one challenge left."));
    assert_eq!(
        ProgressStore::new(data.path()).completed(),
        vec!["Hello World"]
    );

    // Move on and finish the workshop.
    let (mut workshop, _) = open(data.path());
    workshop.select(Some("count up")).await.expect("select failed");

    let (mut workshop, out) = open(data.path());
    let counter = submission(
        work.path(),
        "count.sh",
        "for n in $(seq 1 \"$1\"); do echo \"$n\"; done\n",
    );
    let outcome = workshop
        .execute(ExecMode::Verify, &counter)
        .await
        .expect("verify failed");
    assert_eq!(outcome, Outcome::Success);
    assert!(out
        .plain()
        .contains("You've finished all the challenges! Hooray!"));
    assert_eq!(
        ProgressStore::new(data.path()).completed(),
        vec!["Hello World", "Count Up"]
    );
}

#[tokio::test]
async fn test_verify_without_submission_is_usage_error() {
    let data = tempfile::tempdir().expect("tempdir");
    let store = ProgressStore::new(data.path());
    store.set_current("Hello World").expect("set current");

    let (mut workshop, _) = open(data.path());
    let err = workshop
        .dispatch(Mode::Verify(Vec::new()), &mut Picks(Vec::new()))
        .await
        .expect_err("missing submission should fail");
    assert_eq!(err.to_string(), "Usage: hello-workshop verify <submission>");
}

#[tokio::test]
async fn test_verify_with_nothing_selected() {
    let data = tempfile::tempdir().expect("tempdir");
    let (mut workshop, _) = open(data.path());
    let err = workshop
        .execute(ExecMode::Verify, &["x.sh".to_string()])
        .await
        .expect_err("nothing selected should fail");
    assert!(matches!(err, WorkshopError::NoActiveExercise));
}

#[tokio::test]
async fn test_run_missing_submission_still_exits_cleanly() {
    let data = tempfile::tempdir().expect("tempdir");
    ProgressStore::new(data.path())
        .set_current("Hello World")
        .expect("set current");

    let (mut workshop, _) = open(data.path());
    let outcome = workshop
        .execute(ExecMode::Run, &["/definitely/not/here.sh".to_string()])
        .await
        .expect("run errors end normally");
    assert_eq!(outcome, Outcome::Success);
    assert!(ProgressStore::new(data.path()).completed().is_empty());
}

#[tokio::test]
async fn test_reset_forgets_progress() {
    let data = tempfile::tempdir().expect("tempdir");
    let store = ProgressStore::new(data.path());
    store.set_current("Count Up").expect("set current");
    store.mark_completed("Hello World").expect("mark completed");

    let (mut workshop, out) = open(data.path());
    workshop
        .dispatch(Mode::Reset, &mut Picks(Vec::new()))
        .await
        .expect("reset failed");

    assert_eq!(out.plain(), "HELLO WORKSHOP progress reset\n");
    assert_eq!(store.current(), None);
    assert!(store.completed().is_empty());

    // Resetting again with nothing on disk is fine.
    let (mut workshop, _) = open(data.path());
    workshop.reset().expect("second reset failed");
}

#[tokio::test]
async fn test_list_and_current() {
    let data = tempfile::tempdir().expect("tempdir");
    ProgressStore::new(data.path())
        .set_current("Count Up")
        .expect("set current");

    let (mut workshop, out) = open(data.path());
    workshop
        .dispatch(Mode::List, &mut Picks(Vec::new()))
        .await
        .expect("list failed");
    workshop
        .dispatch(Mode::Current, &mut Picks(Vec::new()))
        .await
        .expect("current failed");
    assert_eq!(out.plain(), "Hello World\nCount Up\nCount Up\n");
}

#[tokio::test]
async fn test_help_includes_help_file() {
    let data = tempfile::tempdir().expect("tempdir");
    let (mut workshop, out) = open(data.path());
    workshop
        .dispatch(Mode::Help, &mut Picks(Vec::new()))
        .await
        .expect("help failed");

    let text = out.plain();
    assert!(text.starts_with("Usage"));
    assert!(text.contains("Getting help"));
    assert!(text.contains("hello-workshop print"));
}

#[tokio::test]
async fn test_menu_language_then_select() {
    let data = tempfile::tempdir().expect("tempdir");
    let (mut workshop, out) = open(data.path());

    let mut menu = Picks(vec![
        MenuEvent::Language,
        MenuEvent::Select("Hello World".to_string()),
    ]);
    workshop
        .dispatch(Mode::Menu, &mut menu)
        .await
        .expect("menu failed");

    assert!(out.plain().contains("Bonjour le monde"));
    assert_eq!(workshop.current(), Some("Hello World"));
}

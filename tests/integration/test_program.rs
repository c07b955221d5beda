//! Tests for the built-in `program` exercise kind, loaded from the
//! hello-workshop fixture.

use std::path::PathBuf;

use workshop_core::{
    ContentType, ExerciseLoader, ExerciseRegistry, Reporter, Verdict, WorkshopConfig,
};

/// Path to the fixture workshop.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/hello-workshop")
}

fn loader() -> ExerciseLoader {
    let config = WorkshopConfig::load_from_dir(&fixture_path()).expect("Failed to load config");
    let exercises = config.load_exercises().expect("Failed to load exercises");
    ExerciseLoader::new(
        config.name.clone(),
        config.app_dir.clone(),
        config.exercise_dir(),
        exercises,
        ExerciseRegistry::with_builtins(),
    )
}

#[test]
fn test_fixture_exercise_meta() {
    let meta = loader().meta("count UP").expect("Count Up should resolve");
    assert_eq!(meta.name, "Count Up");
    assert_eq!(meta.number, 2);
    assert_eq!(meta.id, "count_up");
    assert_eq!(meta.dir, fixture_path().join("exercises/count_up"));
}

#[tokio::test]
async fn test_program_exercise_text_and_solutions() {
    let loaded = loader().load("Count Up").expect("Failed to load exercise");
    loaded.exercise.prepare().await.expect("prepare failed");

    let text = loaded
        .exercise
        .exercise_text()
        .await
        .expect("text failed");
    assert_eq!(text.content_type, ContentType::Text);
    assert!(text.text.contains("from 1 up to its first"));

    let files = loaded
        .exercise
        .solution_files()
        .await
        .expect("solution files failed");
    assert_eq!(
        files,
        vec![fixture_path().join("exercises/count_up/solution/solution.sh")]
    );
    assert!(loaded.exercise.require_submission());
    assert!(!loaded.exercise.hide_solutions());
}

#[tokio::test]
async fn test_program_verify_reports_each_line() {
    let work = tempfile::tempdir().expect("tempdir");
    let script = work.path().join("count.sh");
    std::fs::write(&script, "echo 1\necho two\necho 3\n").expect("write submission");

    let loaded = loader().load("count up").expect("Failed to load exercise");
    let (reporter, mut verdicts) = Reporter::channel();
    let passed = loaded
        .exercise
        .verify(&[script.display().to_string()], reporter)
        .await
        .expect("verify failed");
    assert!(!passed);

    let mut seen = Vec::new();
    while let Some(verdict) = verdicts.recv().await {
        seen.push(verdict);
    }
    assert_eq!(
        seen,
        vec![
            Verdict::Pass("line 1: 1".to_string()),
            Verdict::Fail("line 2: expected \"2\", got \"two\"".to_string()),
            Verdict::Pass("line 3: 3".to_string()),
        ]
    );
}

#[test]
fn test_manifest_with_unknown_kind_is_rejected() {
    let app = tempfile::tempdir().expect("tempdir");
    let dir = app.path().join("exercises/odd_one");
    std::fs::create_dir_all(&dir).expect("create exercise dir");
    std::fs::write(dir.join("exercise.json"), r#"{"kind": "javascript"}"#)
        .expect("write manifest");

    let loader = ExerciseLoader::new(
        "odd",
        app.path(),
        app.path().join("exercises"),
        vec!["Odd One".to_string()],
        ExerciseRegistry::with_builtins(),
    );
    let err = loader.load("odd one").expect_err("unknown kind should fail");
    assert!(err.is_broken_install());
    assert!(err.to_string().contains("is not a workshop exercise"));
}

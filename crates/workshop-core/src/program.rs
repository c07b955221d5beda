//! The built-in `program` exercise kind.
//!
//! The learner writes a program; verification runs it next to the
//! reference solution with the same arguments and compares their standard
//! output line by line.
//!
//! Exercise directory layout:
//!
//! ```text
//! exercise.json     {"kind": "program", "interpreter": "sh", "args": ["3"]}
//! problem.md        instructions (problem.txt for plain text)
//! solution/         reference solution files, shown after a pass
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::exercise::{
    ContentType, ExecMode, Exercise, ExerciseContext, ExerciseFactory, ExerciseText, Reporter,
};

/// Manifest `kind` for this exercise type.
pub const KIND: &str = "program";

const SOLUTION_DIR: &str = "solution";
const PROBLEM_FILES: [&str; 2] = ["problem.md", "problem.txt"];

const fn default_true() -> bool {
    true
}

/// Options read from `exercise.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOptions {
    /// Program used to run both the submission and the solution, e.g. `sh`.
    /// Without one, both are executed directly.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Main solution file, relative to the exercise directory. Defaults to
    /// the first file in `solution/`.
    #[serde(default)]
    pub solution: Option<String>,

    /// Arguments passed to both programs.
    #[serde(default)]
    pub args: Vec<String>,

    /// Skip showing the reference solution on pass.
    #[serde(default)]
    pub hide_solutions: bool,

    /// Require a submission argument for run/verify.
    #[serde(default = "default_true")]
    pub require_submission: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            interpreter: None,
            solution: None,
            args: Vec::new(),
            hide_solutions: false,
            require_submission: default_true(),
        }
    }
}

/// Factory registered under [`KIND`].
#[must_use]
pub fn factory() -> ExerciseFactory {
    Arc::new(
        |options: &serde_json::Map<String, serde_json::Value>| -> anyhow::Result<Box<dyn Exercise>> {
            let options: ProgramOptions =
                serde_json::from_value(serde_json::Value::Object(options.clone()))
                    .context("invalid program exercise options")?;
            Ok(Box::new(ProgramExercise::new(options)))
        },
    )
}

/// Output of one program run.
#[derive(Debug)]
struct Captured {
    stdout: String,
    success: bool,
}

/// Compares a submission's output with the reference solution's.
#[derive(Debug, Clone)]
pub struct ProgramExercise {
    options: ProgramOptions,
    ctx: Option<ExerciseContext>,
}

impl ProgramExercise {
    /// Creates an uninitialized exercise.
    #[must_use]
    pub const fn new(options: ProgramOptions) -> Self {
        Self { options, ctx: None }
    }

    fn dir(&self) -> anyhow::Result<&Path> {
        match &self.ctx {
            Some(ctx) => Ok(&ctx.dir),
            None => bail!("exercise used before init"),
        }
    }

    fn problem_file(&self) -> anyhow::Result<PathBuf> {
        let dir = self.dir()?;
        PROBLEM_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .with_context(|| format!("no problem.md or problem.txt in {}", dir.display()))
    }

    async fn listed_solution_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let dir = self.dir()?.join(SOLUTION_DIR);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("cannot read {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn solution_main(&self) -> anyhow::Result<PathBuf> {
        if let Some(solution) = &self.options.solution {
            return Ok(self.dir()?.join(solution));
        }
        self.listed_solution_files()
            .await?
            .into_iter()
            .next()
            .context("the solution directory is empty")
    }

    fn command(&self, program: &Path, extra: &[String]) -> Command {
        let mut command = match &self.options.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(program);
                command
            }
            None => Command::new(program),
        };
        command.args(&self.options.args).args(extra);
        command
    }

    async fn capture(&self, program: &Path, extra: &[String]) -> anyhow::Result<Captured> {
        let output = self
            .command(program, extra)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .await
            .with_context(|| format!("failed to start {}", program.display()))?;
        Ok(Captured {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            success: output.status.success(),
        })
    }

    fn submission(args: &[String]) -> anyhow::Result<(PathBuf, &[String])> {
        let Some((first, rest)) = args.split_first() else {
            bail!("no submission program given");
        };
        let cwd = std::env::current_dir().context("cannot read the working directory")?;
        Ok((resolve_submission(&cwd, Path::new(first)), rest))
    }
}

/// Anchors a relative submission path to `cwd`. A bare `mine.sh` would
/// otherwise be looked up on `PATH` when run without an interpreter.
fn resolve_submission(cwd: &Path, submission: &Path) -> PathBuf {
    if submission.is_absolute() {
        submission.to_path_buf()
    } else {
        cwd.join(submission)
    }
}

/// Reports one verdict per expected/actual line pair and returns whether
/// every line matched.
fn compare_output(expected: &str, actual: &str, reporter: &Reporter) -> bool {
    let expected: Vec<&str> = expected.lines().collect();
    let actual: Vec<&str> = actual.lines().collect();
    let mut all_match = true;

    for i in 0..expected.len().max(actual.len()) {
        match (expected.get(i), actual.get(i)) {
            (Some(e), Some(a)) if e == a => reporter.pass(format!("line {}: {a}", i + 1)),
            (Some(e), Some(a)) => {
                all_match = false;
                reporter.fail(format!("line {}: expected {e:?}, got {a:?}", i + 1));
            }
            (Some(e), None) => {
                all_match = false;
                reporter.fail(format!("line {}: expected {e:?}, got nothing", i + 1));
            }
            (None, Some(a)) => {
                all_match = false;
                reporter.fail(format!("line {}: unexpected extra output {a:?}", i + 1));
            }
            (None, None) => {}
        }
    }

    all_match
}

#[async_trait]
impl Exercise for ProgramExercise {
    fn init(&mut self, ctx: ExerciseContext) {
        self.ctx = Some(ctx);
    }

    async fn prepare(&self) -> anyhow::Result<()> {
        self.problem_file()?;
        let solution_dir = self.dir()?.join(SOLUTION_DIR);
        if !solution_dir.is_dir() {
            bail!("missing solution directory {}", solution_dir.display());
        }
        Ok(())
    }

    async fn exercise_text(&self) -> anyhow::Result<ExerciseText> {
        let path = self.problem_file()?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        Ok(ExerciseText {
            content_type: ContentType::from_path(&path),
            text,
        })
    }

    async fn run(&self, args: &[String], _reporter: Reporter) -> anyhow::Result<bool> {
        let (submission, extra) = Self::submission(args)?;
        let status = self
            .command(&submission, extra)
            .status()
            .await
            .with_context(|| format!("failed to start {}", submission.display()))?;
        Ok(status.success())
    }

    async fn verify(&self, args: &[String], reporter: Reporter) -> anyhow::Result<bool> {
        let (submission, extra) = Self::submission(args)?;
        let solution = self.solution_main().await?;

        let (actual, expected) = tokio::try_join!(
            self.capture(&submission, extra),
            self.capture(&solution, extra)
        )?;
        if !expected.success {
            bail!("the reference solution {} failed", solution.display());
        }

        let matched = compare_output(&expected.stdout, &actual.stdout, &reporter);
        if !actual.success {
            reporter.fail("your program exited with an error");
        }
        Ok(matched && actual.success)
    }

    async fn end(&self, mode: ExecMode, passed: bool) -> anyhow::Result<()> {
        tracing::debug!(%mode, passed, "Program exercise finished");
        Ok(())
    }

    async fn solution_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        self.listed_solution_files().await
    }

    fn hide_solutions(&self) -> bool {
        self.options.hide_solutions
    }

    fn require_submission(&self) -> bool {
        self.options.require_submission
    }
}

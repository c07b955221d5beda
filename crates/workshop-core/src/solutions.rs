//! Reference solution display after a passing verification.
//!
//! All solution files are read concurrently; the rendered output always
//! follows the order the exercise listed them in. Any single read failure
//! fails the whole presentation.

use std::future::Future;
use std::path::{Path, PathBuf};

use crossterm::style::Stylize;
use futures::future::try_join_all;

use crate::error::{Result, WorkshopError};
use crate::exercise::ContentType;
use crate::printer::TextPrinter;

/// Width of the separator drawn around solution files.
pub const SEPARATOR_WIDTH: usize = 80;

/// A solution file ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionFile {
    /// File name without its directory.
    pub name: String,
    /// Rendered content.
    pub content: String,
}

/// Fence language for a solution file, taken from its extension.
#[must_use]
pub fn fence_language(path: &Path) -> &str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("rs") => "rust",
        Some("js" | "mjs" | "cjs") => "js",
        Some("ts") => "ts",
        Some("py") => "python",
        Some("sh" | "bash") => "sh",
        Some("rb") => "ruby",
        Some(ext) => ext,
        None => "",
    }
}

/// Wraps raw source in a fenced code block so it renders as code.
#[must_use]
pub fn fence(path: &Path, source: &str) -> String {
    format!("```{}\n{}\n```", fence_language(path), source.trim_end_matches('\n'))
}

/// Reads every file with `read`, concurrently, keeping list order.
///
/// # Errors
///
/// Returns `WorkshopError::SolutionLoadError` naming the first file that
/// failed to read.
pub async fn load_with<F, Fut>(
    files: &[PathBuf],
    printer: &dyn TextPrinter,
    read: F,
) -> Result<Vec<SolutionFile>>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = std::io::Result<String>>,
{
    let reads = files.iter().map(|path| {
        let pending = read(path.clone());
        async move {
            let source = pending.await.map_err(|e| {
                WorkshopError::solution_load(format!("{}: {e}", path.display()))
            })?;
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            Ok::<_, WorkshopError>(SolutionFile {
                name,
                content: printer.render(ContentType::Markdown, &fence(path, &source)),
            })
        }
    });

    try_join_all(reads).await
}

/// Reads every file from disk, concurrently, keeping list order.
pub async fn load(files: &[PathBuf], printer: &dyn TextPrinter) -> Result<Vec<SolutionFile>> {
    load_with(files, printer, |path| async move {
        tokio::fs::read_to_string(path).await
    })
    .await
}

/// Lays the files out for printing: a separator before each file, a
/// header per file only when there is more than one, and a closing
/// separator after the last.
#[must_use]
pub fn render(solutions: &[SolutionFile]) -> String {
    let separator = format!("{}", "\u{2500}".repeat(SEPARATOR_WIDTH).yellow());
    let mut out = String::new();

    for (i, file) in solutions.iter().enumerate() {
        out.push_str(&separator);
        out.push('\n');
        if solutions.len() > 1 {
            out.push_str(&format!("{}", format!("{}:", file.name).bold().yellow()));
            out.push_str("\n\n");
        }
        out.push_str(file.content.trim_matches('\n'));
        out.push('\n');
        if i == solutions.len() - 1 {
            out.push_str(&separator);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::console::strip_ansi;
    use crate::printer::TerminalPrinter;

    fn printer() -> TerminalPrinter {
        TerminalPrinter::new("learnyou", "/opt/learnyou", 65)
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language(Path::new("solution.js")), "js");
        assert_eq!(fence_language(Path::new("main.rs")), "rust");
        assert_eq!(fence_language(Path::new("run.sh")), "sh");
        assert_eq!(fence_language(Path::new("data.csv")), "csv");
        assert_eq!(fence_language(Path::new("Makefile")), "");
    }

    #[test]
    fn test_fence() {
        assert_eq!(
            fence(Path::new("a.sh"), "echo hi\n"),
            "```sh\necho hi\n```"
        );
    }

    #[tokio::test]
    async fn test_load_preserves_order_when_reads_finish_out_of_order() {
        let files = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
        let printer = printer();

        let solutions = load_with(&files, &printer, |path| async move {
            if path == Path::new("a.txt") {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, std::io::Error>("from a".to_string())
            } else {
                Ok("from b".to_string())
            }
        })
        .await
        .unwrap();

        let names: Vec<&str> = solutions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(strip_ansi(&solutions[0].content).contains("from a"));
        assert!(strip_ansi(&solutions[1].content).contains("from b"));
    }

    #[tokio::test]
    async fn test_load_fails_if_any_read_fails() {
        let files = vec![PathBuf::from("ok.txt"), PathBuf::from("broken.txt")];
        let printer = printer();

        let result = load_with(&files, &printer, |path| async move {
            if path == Path::new("broken.txt") {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
            } else {
                Ok("fine".to_string())
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(
            matches!(&err, WorkshopError::SolutionLoadError { message } if message.contains("broken.txt")),
            "Expected SolutionLoadError, got: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.sh");
        std::fs::write(&path, "echo hello\n").unwrap();

        let solutions = load(&[path], &printer()).await;
        let solutions = tokio_test::assert_ok!(solutions);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].name, "solution.sh");
        assert_eq!(strip_ansi(&solutions[0].content), "    echo hello");
    }

    #[test]
    fn test_render_single_file_has_no_header() {
        let rendered = strip_ansi(&render(&[SolutionFile {
            name: "solution.sh".to_string(),
            content: "echo hi".to_string(),
        }]));
        let rule = "\u{2500}".repeat(SEPARATOR_WIDTH);
        assert_eq!(rendered, format!("{rule}\necho hi\n{rule}\n"));
    }

    #[test]
    fn test_render_multiple_files_has_headers() {
        let rendered = strip_ansi(&render(&[
            SolutionFile {
                name: "a.sh".to_string(),
                content: "\nfirst\n".to_string(),
            },
            SolutionFile {
                name: "b.sh".to_string(),
                content: "second".to_string(),
            },
        ]));
        let rule = "\u{2500}".repeat(SEPARATOR_WIDTH);
        assert_eq!(
            rendered,
            format!("{rule}\na.sh:\n\nfirst\n{rule}\nb.sh:\n\nsecond\n{rule}\n")
        );
    }

    #[test]
    fn test_render_nothing() {
        assert_eq!(render(&[]), "");
    }
}

//! Text rendering for the terminal.
//!
//! [`TextPrinter`] is the seam the controller prints through.
//! [`TerminalPrinter`] substitutes workshop variables, then renders
//! markdown from `pulldown-cmark` events: bold headings, emphasis, cyan
//! code, indented code blocks, bulleted and numbered lists. Prose wraps to
//! the configured width.

use std::io;
use std::path::{Path, PathBuf};

use crossterm::style::{style, Stylize};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::console::Console;
use crate::exercise::ContentType;
use crate::i18n::interpolate;

/// Renders markdown or plain text for the terminal.
pub trait TextPrinter: Send + Sync {
    /// Renders `text` into printable form.
    fn render(&self, content_type: ContentType, text: &str) -> String;

    /// Renders and prints `text`.
    fn print_text(
        &self,
        console: &mut Console,
        content_type: ContentType,
        text: &str,
    ) -> io::Result<()> {
        console.line(self.render(content_type, text))
    }

    /// Reads, renders and prints a file. `.md` files render as markdown.
    fn print_file(&self, console: &mut Console, path: &Path) -> io::Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.print_text(console, ContentType::from_path(path), &text)
    }
}

/// Default terminal renderer.
#[derive(Debug, Clone)]
pub struct TerminalPrinter {
    app_name: String,
    app_dir: PathBuf,
    width: usize,
}

impl TerminalPrinter {
    /// Creates a printer wrapping at `width` columns.
    #[must_use]
    pub fn new(app_name: impl Into<String>, app_dir: impl Into<PathBuf>, width: usize) -> Self {
        Self {
            app_name: app_name.into(),
            app_dir: app_dir.into(),
            width: width.max(1),
        }
    }

    fn substitute(&self, text: &str) -> String {
        let root = self.app_dir.display().to_string();
        interpolate(
            text,
            &[("appname", self.app_name.as_str()), ("rootdir", root.as_str())],
        )
    }

    fn render_markdown(&self, text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let mut renderer = MarkdownRenderer::new(self.width);
        for event in Parser::new_ext(text, options) {
            renderer.event(event);
        }
        renderer.finish()
    }
}

impl TextPrinter for TerminalPrinter {
    fn render(&self, content_type: ContentType, text: &str) -> String {
        let text = self.substitute(text);
        match content_type {
            ContentType::Markdown => self.render_markdown(&text),
            ContentType::Text => text
                .lines()
                .flat_map(|line| wrap(line, self.width))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ============================================================================
// Markdown
// ============================================================================

/// Inline styling in effect for the text being pushed.
#[derive(Debug, Clone, Copy, Default)]
struct InlineStyle {
    heading: bool,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    link: usize,
}

impl InlineStyle {
    fn paint(self, text: &str, code: bool) -> String {
        let mut styled = style(text.to_string());
        if code {
            styled = styled.cyan();
        }
        if self.heading || self.strong > 0 {
            styled = styled.bold();
        }
        if self.emphasis > 0 {
            styled = styled.italic();
        }
        if self.strikethrough > 0 {
            styled = styled.crossed_out();
        }
        if self.link > 0 {
            styled = styled.underlined();
        }
        styled.to_string()
    }
}

/// A piece of the line being built. Adjacent words with no space between
/// them never wrap apart.
#[derive(Debug, Clone)]
enum Piece {
    Space,
    Word { styled: String, width: usize },
}

/// Turns parser events into wrapped, styled terminal lines. Blocks are
/// separated by one blank line; list items and code lines are not.
#[derive(Debug, Default)]
struct MarkdownRenderer {
    width: usize,
    style: InlineStyle,
    pieces: Vec<Piece>,
    block: Vec<String>,
    blocks: Vec<String>,
    lists: Vec<Option<u64>>,
    marker: Option<String>,
    hang: String,
    quote: usize,
    code: Option<String>,
    link: Option<(String, String)>,
}

impl MarkdownRenderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    fn nested(&self) -> bool {
        !self.lists.is_empty() || self.quote > 0
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.push_str(&text);
                } else {
                    if let Some((_, label)) = self.link.as_mut() {
                        label.push_str(&text);
                    }
                    self.push_text(&text, false);
                }
            }
            Event::Code(text) => self.push_text(&text, true),
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html, false),
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.end_block();
                let rule = "\u{2500}".repeat(self.width);
                self.blocks.push(format!("{}", rule.dark_grey()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.end_block();
                self.style.heading = true;
            }
            Tag::Strong => self.style.strong += 1,
            Tag::Emphasis => self.style.emphasis += 1,
            Tag::Strikethrough => self.style.strikethrough += 1,
            Tag::Link { dest_url, .. } => {
                self.style.link += 1;
                self.link = Some((dest_url.to_string(), String::new()));
            }
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.code = Some(String::new());
            }
            Tag::List(first) => {
                self.flush_line();
                self.lists.push(first);
            }
            Tag::Item => {
                self.flush_line();
                let bullet = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let bullet = format!("{n}. ");
                        *n += 1;
                        bullet
                    }
                    _ => "* ".to_string(),
                };
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                self.hang = " ".repeat(indent.len() + bullet.chars().count());
                self.marker = Some(format!("{indent}{bullet}"));
            }
            Tag::BlockQuote { .. } => {
                self.flush_line();
                self.quote += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.nested() {
                    self.flush_line();
                } else {
                    self.end_block();
                }
            }
            TagEnd::Heading { .. } => {
                self.style.heading = false;
                self.end_block();
            }
            TagEnd::Strong => self.style.strong = self.style.strong.saturating_sub(1),
            TagEnd::Emphasis => self.style.emphasis = self.style.emphasis.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.style.strikethrough = self.style.strikethrough.saturating_sub(1);
            }
            TagEnd::Link => {
                self.style.link = self.style.link.saturating_sub(1);
                if let Some((dest, label)) = self.link.take() {
                    if !dest.is_empty() && dest != label {
                        self.pieces.push(Piece::Space);
                        self.push_text(&format!("({dest})"), false);
                    }
                }
            }
            TagEnd::CodeBlock => {
                let code = self.code.take().unwrap_or_default();
                let prefix = format!("{}{}    ", "\u{2502} ".repeat(self.quote), self.hang);
                for line in code.trim_end_matches('\n').lines() {
                    self.block.push(format!("{prefix}{}", line.cyan()));
                }
                if !self.nested() {
                    self.end_block();
                }
            }
            TagEnd::List { .. } => {
                self.flush_line();
                self.lists.pop();
                self.marker = None;
                self.hang = "  ".repeat(self.lists.len());
                if !self.nested() {
                    self.end_block();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::BlockQuote { .. } => {
                self.flush_line();
                self.quote = self.quote.saturating_sub(1);
                if !self.nested() {
                    self.end_block();
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        let mut word = String::new();
        for c in text.chars() {
            if c.is_whitespace() {
                self.push_word(&mut word, code);
                if !matches!(self.pieces.last(), None | Some(Piece::Space)) {
                    self.pieces.push(Piece::Space);
                }
            } else {
                word.push(c);
            }
        }
        self.push_word(&mut word, code);
    }

    fn push_word(&mut self, word: &mut String, code: bool) {
        if word.is_empty() {
            return;
        }
        let word = std::mem::take(word);
        self.pieces.push(Piece::Word {
            styled: self.style.paint(&word, code),
            width: word.chars().count(),
        });
    }

    /// Wraps the pending pieces into the current block.
    fn flush_line(&mut self) {
        if self.pieces.is_empty() {
            return;
        }

        let mut units: Vec<(String, usize)> = Vec::new();
        let mut glued = false;
        for piece in self.pieces.drain(..) {
            match piece {
                Piece::Space => glued = false,
                Piece::Word { styled, width } => match units.last_mut() {
                    Some(unit) if glued => {
                        unit.0.push_str(&styled);
                        unit.1 += width;
                    }
                    _ => {
                        units.push((styled, width));
                        glued = true;
                    }
                },
            }
        }

        let quote = "\u{2502} ".repeat(self.quote);
        let first = format!("{quote}{}", self.marker.take().unwrap_or_else(|| self.hang.clone()));
        let rest = format!("{quote}{}", self.hang);

        let mut used = first.chars().count();
        let mut line = first;
        let mut empty = true;
        for (styled, width) in units {
            if !empty && used + 1 + width > self.width {
                self.block.push(std::mem::replace(&mut line, rest.clone()));
                used = rest.chars().count();
                empty = true;
            }
            if !empty {
                line.push(' ');
                used += 1;
            }
            line.push_str(&styled);
            used += width;
            empty = false;
        }
        self.block.push(line);
    }

    fn end_block(&mut self) {
        self.flush_line();
        if !self.block.is_empty() {
            self.blocks.push(self.block.join("\n"));
            self.block.clear();
        }
    }

    fn finish(mut self) -> String {
        self.end_block();
        self.blocks.join("\n\n")
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let mut lines = Vec::new();
    let mut current = indent.clone();

    for word in line.split_whitespace() {
        let needed = if current.trim().is_empty() {
            word.chars().count()
        } else {
            word.chars().count() + 1
        };
        if current.trim().is_empty() {
            current.push_str(word);
        } else if current.chars().count() + needed <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, format!("{indent}{word}")));
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::console::strip_ansi;

    fn printer(width: usize) -> TerminalPrinter {
        TerminalPrinter::new("learnyou", "/opt/learnyou", width)
    }

    #[test]
    fn test_wrap_short_line_untouched() {
        assert_eq!(wrap("short line", 20), vec!["short line"]);
    }

    #[test]
    fn test_wrap_long_line() {
        assert_eq!(
            wrap("the quick brown fox jumps over", 10),
            vec!["the quick", "brown fox", "jumps over"]
        );
    }

    #[test]
    fn test_wrap_keeps_indent() {
        assert_eq!(wrap("  aaaa bbbb cccc", 11), vec!["  aaaa bbbb", "  cccc"]);
    }

    #[test]
    fn test_variables_substituted() {
        let rendered = printer(65).render(ContentType::Text, "Run {appname} in {rootdir}");
        assert_eq!(rendered, "Run learnyou in /opt/learnyou");
    }

    #[test]
    fn test_markdown_heading_and_code() {
        let rendered = printer(65).render(
            ContentType::Markdown,
            "# Title\n\nSome prose.\n\n```sh\necho hi\n```",
        );
        assert_eq!(
            strip_ansi(&rendered),
            "Title\n\nSome prose.\n\n    echo hi"
        );
    }

    #[test]
    fn test_markdown_inline_styles_fences_and_lists() {
        let rendered = printer(65).render(
            ContentType::Markdown,
            "Use **bold**, *soft* and `code`.\n\n~~~sh\necho hi\n~~~\n\n* item one\n* item two\n\n1. first\n2. second",
        );

        assert_eq!(
            strip_ansi(&rendered),
            "Use bold, soft and code.\n\n    echo hi\n\n* item one\n* item two\n\n1. first\n2. second"
        );
        assert!(rendered.contains(&"bold".bold().to_string()));
        assert!(rendered.contains(&"soft".italic().to_string()));
        assert!(rendered.contains(&"code".cyan().to_string()));
    }

    #[test]
    fn test_markdown_wraps_list_items_under_their_marker() {
        let rendered = printer(16).render(ContentType::Markdown, "- alpha beta gamma delta");
        assert_eq!(strip_ansi(&rendered), "* alpha beta\n  gamma delta");
    }

    #[test]
    fn test_markdown_heading_requires_space() {
        let rendered = printer(65).render(ContentType::Markdown, "#hashtag\n\n## Steps");
        assert_eq!(strip_ansi(&rendered), "#hashtag\n\nSteps");
    }

    #[test]
    fn test_markdown_soft_breaks_keep_lines() {
        let rendered = printer(65).render(ContentType::Markdown, "run: `a print`\nrun: `a verify`");
        assert_eq!(strip_ansi(&rendered), "run: a print\nrun: a verify");
    }

    #[test]
    fn test_markdown_link_shows_target() {
        let rendered = printer(65).render(ContentType::Markdown, "See [the docs](https://x.dev).");
        assert_eq!(strip_ansi(&rendered), "See the docs (https://x.dev).");
    }

    #[test]
    fn test_print_file_detects_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("help.md");
        std::fs::write(&path, "# Help\nAsk {appname}").unwrap();

        let (mut console, captured) = Console::capture();
        printer(65).print_file(&mut console, &path).unwrap();
        assert_eq!(captured.plain(), "Help\n\nAsk learnyou\n");
    }
}

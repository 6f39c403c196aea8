//! Markdown to HTML conversion for the preview pane.

use pulldown_cmark::{html as md_html, Event, Options, Parser};

/// Converts note content to HTML.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

/// [`MarkdownRenderer`] over `pulldown-cmark`.
///
/// Enables the GitHub-flavoured extensions (tables, strikethrough, task lists,
/// footnotes) and renders single newlines as `<br />`. Raw HTML in the input
/// is escaped and shown as text, so the output is safe to inject into a page.
#[derive(Debug, Clone, Copy)]
pub struct CmarkRenderer {
    pub breaks: bool,
    pub gfm: bool,
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self { breaks: true, gfm: true }
    }
}

impl CmarkRenderer {
    fn options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        options
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let breaks = self.breaks;
        let parser = Parser::new_ext(markdown, self.options()).map(|event| match event {
            Event::SoftBreak if breaks => Event::HardBreak,
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        md_html::push_html(&mut html_output, parser);
        html_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        CmarkRenderer::default().render(text)
    }

    #[test]
    fn test_heading() {
        assert!(render("# Hi").contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_single_newline_becomes_break() {
        let html = render("first\nsecond");
        assert!(html.contains("first<br />"));

        let plain = CmarkRenderer { breaks: false, gfm: true }.render("first\nsecond");
        assert!(!plain.contains("<br />"));
    }

    #[test]
    fn test_gfm_extensions() {
        assert!(render("~~gone~~").contains("<del>gone</del>"));
        assert!(render("| a | b |\n|---|---|\n| 1 | 2 |").contains("<table>"));
        assert!(render("- [x] done").contains("type=\"checkbox\""));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render("<script>alert(1)</script>\n\ntext with <b>inline</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_code_block_content_is_escaped() {
        let html = render("```\n<main></main>\n```");
        assert!(html.contains("<pre><code>&lt;main&gt;&lt;/main&gt;"));
    }
}

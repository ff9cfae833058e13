use std::sync::LazyLock;

use regex::Regex;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) (.*)$").expect("valid heading regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[-*] (.*)$").expect("valid list regex"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid code regex"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));

/// Render the markdown subset used in notes (headings, list items, bold,
/// inline code) into HTML for display. Line structure is kept, and anything
/// outside the subset is passed through untouched.
pub fn render_preview(markdown: &str) -> String {
    markdown
        .split('\n')
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(line: &str) -> String {
    if let Some(caps) = HEADING.captures(line) {
        let level = caps[1].len();
        return format!("<h{level}>{}</h{level}>", render_inline(&caps[2]));
    }
    if let Some(caps) = LIST_ITEM.captures(line) {
        return format!("<li>{}</li>", render_inline(&caps[1]));
    }
    render_inline(line)
}

// Code spans first; bold is only applied to the text between them.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in CODE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&BOLD.replace_all(&text[last..whole.start()], "<strong>$1</strong>"));
        out.push_str("<code>");
        out.push_str(&caps[1]);
        out.push_str("</code>");
        last = whole.end();
    }
    out.push_str(&BOLD.replace_all(&text[last..], "<strong>$1</strong>"));
    out
}

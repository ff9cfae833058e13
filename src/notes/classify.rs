use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::NotesError;

/// Rendering format of a notes field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotesFormat {
    Html,
    Markdown,
    Plain,
}

impl NotesFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            NotesFormat::Html => "html",
            NotesFormat::Markdown => "markdown",
            NotesFormat::Plain => "plain",
        }
    }
}

impl fmt::Display for NotesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotesFormat {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(NotesFormat::Html),
            "markdown" | "md" => Ok(NotesFormat::Markdown),
            "plain" | "text" => Ok(NotesFormat::Plain),
            _ => Err(NotesError::InvalidFormat {
                value: s.to_string(),
                expected: "html, markdown, plain".into(),
            }),
        }
    }
}

// Known element names only, so `a < b > c` or `<not a tag>` stays plain.
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:div|p|span|h[1-6]|ul|ol|li|table|thead|tbody|tr|td|th|code|pre|b|i|u|strong|em|a|br|hr|img|blockquote|details|summary|small|section|article)(?:\s[^<>]*)?/?>",
    )
    .expect("valid html tag regex")
});

// Any element name; only counts when a matching close tag follows.
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9]*(?:-[A-Za-z0-9]+)*)(?:\s[^<>]*)?>").expect("valid open tag regex")
});

static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6} ").expect("valid heading regex"));

static MD_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*\n]+\*\*").expect("valid emphasis regex"));

static MD_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*] ").expect("valid list regex"));

/// Label raw notes text. HTML is checked before markdown; anything without
/// structural markers is plain.
pub fn classify(text: &str) -> NotesFormat {
    if text.is_empty() {
        return NotesFormat::Plain;
    }
    if HTML_TAG.is_match(text) || has_tag_pair(text) {
        return NotesFormat::Html;
    }
    if MD_HEADING.is_match(text) || MD_EMPHASIS.is_match(text) || MD_LIST.is_match(text) {
        return NotesFormat::Markdown;
    }
    NotesFormat::Plain
}

/// An opening tag followed somewhere later by its `</name>`.
fn has_tag_pair(text: &str) -> bool {
    // ASCII lowering keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    OPEN_TAG.captures_iter(&lower).any(|caps| {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return false;
        };
        lower[whole.end()..].contains(&format!("</{}>", name.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_tag_pair() {
        assert_eq!(classify("<div><h3>Test</h3><p>Content</p></div>"), NotesFormat::Html);
    }

    #[test]
    fn single_structural_tag_is_html() {
        assert_eq!(classify("see <code>secret://x</code>"), NotesFormat::Html);
        assert_eq!(classify("line one<br/>line two"), NotesFormat::Html);
        assert_eq!(classify(r#"<p class="note">hi</p>"#), NotesFormat::Html);
    }

    #[test]
    fn any_element_pair_is_html() {
        assert_eq!(classify("<html><body>Hello</body></html>"), NotesFormat::Html);
        assert_eq!(classify("<font color=red>x</font>"), NotesFormat::Html);
        assert_eq!(classify("<nav>menu</nav>"), NotesFormat::Html);
        assert_eq!(classify("<Label>x</LABEL>"), NotesFormat::Html);
        assert_eq!(classify("<vm-status state=\"up\">ok</vm-status>"), NotesFormat::Html);
    }

    #[test]
    fn unmatched_unknown_tag_is_not_html() {
        assert_eq!(classify("use <hostname> here"), NotesFormat::Plain);
        assert_eq!(classify("<foo>bar</baz>"), NotesFormat::Plain);
    }

    #[test]
    fn html_wins_over_markdown() {
        assert_eq!(classify("# Title\n<p>body</p>\n- item"), NotesFormat::Html);
    }

    #[test]
    fn markdown_markers() {
        assert_eq!(classify("# Header\n**Bold** text\n- List item"), NotesFormat::Markdown);
        assert_eq!(classify("###### deep"), NotesFormat::Markdown);
        assert_eq!(classify("some **bold** word"), NotesFormat::Markdown);
        assert_eq!(classify("intro\n* bullet"), NotesFormat::Markdown);
    }

    #[test]
    fn heading_requires_space() {
        assert_eq!(classify("#hashtag"), NotesFormat::Plain);
        assert_eq!(classify("####### seven"), NotesFormat::Plain);
    }

    #[test]
    fn plain_fallbacks() {
        assert_eq!(classify(""), NotesFormat::Plain);
        assert_eq!(classify("Just plain text"), NotesFormat::Plain);
        assert_eq!(classify("if a < b and c > d"), NotesFormat::Plain);
        assert_eq!(classify("<unclosed"), NotesFormat::Plain);
        assert_eq!(classify("\u{0}\u{1}\u{fffd}binary"), NotesFormat::Plain);
    }

    #[test]
    fn parse_format_names() {
        assert_eq!("md".parse::<NotesFormat>().unwrap(), NotesFormat::Markdown);
        assert_eq!("HTML".parse::<NotesFormat>().unwrap(), NotesFormat::Html);
        assert_eq!("text".parse::<NotesFormat>().unwrap(), NotesFormat::Plain);
        assert!("rtf".parse::<NotesFormat>().is_err());
    }
}

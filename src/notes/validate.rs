//! Heuristic leak detection for notes content.
//!
//! This is pattern matching, not a security boundary. It catches the common
//! ways a literal credential ends up in a description field:
//!
//! - `<credential-name> = <value>` or `<credential-name>: <value>` where the
//!   value is not a `secret://` reference,
//! - PEM/PGP private key block markers,
//! - a long, high-entropy token right after a credential-sounding key.
//!
//! Anything else (encoded secrets, prose like "the password is hunter2")
//! passes. The detector never rewrites content; callers decide what to do.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::secrets::is_reference;

const TOKEN_MIN_LEN: usize = 20;
const TOKEN_MIN_ENTROPY: f64 = 3.0;
const PREVIEW_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    PossibleCredential,
    PossiblePrivateKey,
    PossibleToken,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::PossibleCredential => "possible_credential",
            WarningKind::PossiblePrivateKey => "possible_private_key",
            WarningKind::PossibleToken => "possible_token",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub warnings: Vec<ValidationWarning>,
}

impl Validation {
    fn push(&mut self, kind: WarningKind, message: String) {
        self.is_valid = false;
        self.warnings.push(ValidationWarning { kind, message });
    }
}

// Matches up to and including the separator; the value is inspected by hand
// so a skipped reference does not swallow the rest of the line.
static CREDENTIAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:^|[^A-Za-z0-9_])([A-Za-z0-9_.-]*?(?:password|passwd|secret|api[ _-]?key|access[ _-]?key|token|private[ _-]?key))["']?[ \t]*[:=]"#,
    )
    .expect("valid credential key regex")
});

static PRIVATE_KEY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-----(BEGIN|END) (?:[A-Z0-9]+ )*PRIVATE KEY(?: BLOCK)?-----")
        .expect("valid private key regex")
});

static KEYED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^A-Za-z0-9_])(bearer|token|api[ _-]?key|access[ _-]?key|auth|secret|key)(?:[ \t]*[:=][ \t]*|[ \t]+)([A-Za-z0-9+/=_.-]{20,})",
    )
    .expect("valid token regex")
});

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{[A-Z][A-Z0-9_]*\}$").expect("valid placeholder regex"));

/// Check notes content for literal secrets. Any triggered heuristic makes the
/// content invalid, even if legitimate references are also present.
pub fn validate(text: &str) -> Validation {
    let mut result = Validation {
        is_valid: true,
        warnings: Vec::new(),
    };

    for caps in CREDENTIAL_KEY.captures_iter(text) {
        let (Some(key), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let line = text[whole.end()..].split('\n').next().unwrap_or("");
        // `secret://…`, `https://…`: the key word is a URL scheme.
        if line.starts_with("//") {
            continue;
        }
        let Some(value) = first_value(line) else {
            continue;
        };
        if is_reference(value) || PLACEHOLDER.is_match(value) {
            continue;
        }
        result.push(
            WarningKind::PossibleCredential,
            format!(
                "possible credential in '{}': value '{}' looks like a literal secret; store it in the secret store and reference it as secret://<name>",
                key.as_str(),
                preview(value)
            ),
        );
    }

    if let Some(caps) = PRIVATE_KEY_BLOCK.captures(text) {
        let marker = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        result.push(
            WarningKind::PossiblePrivateKey,
            format!("private key block marker found ({marker}); keys belong in the secret store"),
        );
    }

    for caps in KEYED_TOKEN.captures_iter(text) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str();
        if value.starts_with("//") || shannon_entropy(value) < TOKEN_MIN_ENTROPY {
            continue;
        }
        result.push(
            WarningKind::PossibleToken,
            format!(
                "possible token after '{}': {} characters starting with '{}'",
                key.as_str(),
                value.chars().count(),
                preview(value)
            ),
        );
    }

    result
}

/// First value-looking token after a separator, with surrounding markup
/// (tags, backticks, quotes, emphasis) removed.
fn first_value(line: &str) -> Option<&str> {
    let mut s = line;
    loop {
        let trimmed = s.trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, '`' | '"' | '\'' | '*')
        });
        if let Some(rest) = trimmed.strip_prefix('<') {
            match rest.find('>') {
                Some(end) => {
                    s = &rest[end + 1..];
                    continue;
                }
                // Unclosed `<` is part of the value, not markup.
                None => s = rest,
            }
        } else {
            s = trimmed;
        }
        break;
    }
    let end = s
        .find(|c: char| c.is_whitespace() || matches!(c, '<' | '`' | '"' | '\''))
        .unwrap_or(s.len());
    let value = s[..end].trim_end_matches(['*', ',', ';', '.']);
    (!value.is_empty()).then_some(value)
}

/// Leading characters only, so warnings never echo a full secret.
fn preview(value: &str) -> String {
    if value.chars().count() <= PREVIEW_CHARS {
        return "***".into();
    }
    let shown: String = value.chars().take(PREVIEW_CHARS).collect();
    format!("{shown}...")
}

fn shannon_entropy(value: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total < TOKEN_MIN_LEN {
        return 0.0;
    }
    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

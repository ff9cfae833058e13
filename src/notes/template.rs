use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::classify::NotesFormat;
use crate::error::NotesError;

// ── Built-in catalog ─────────────────────────────────────

pub struct NoteTemplate {
    pub template_type: &'static str,
    pub format: NotesFormat,
    pub body: &'static str,
}

const TEMPLATES: &[NoteTemplate] = &[
    NoteTemplate {
        template_type: "web-server",
        format: NotesFormat::Html,
        body: r#"<div class="vm-notes">
<h3>{VM_NAME} - Web Server</h3>
<p><strong>Purpose:</strong> {PURPOSE}</p>
<ul>
<li><strong>IP Address:</strong> {IP_ADDRESS}</li>
<li><strong>Domain:</strong> {DOMAIN}</li>
<li><strong>Web Server:</strong> {WEB_SERVER}</li>
<li><strong>OS:</strong> {OS}</li>
</ul>
<h4>Access</h4>
<ul>
<li><strong>SSH Key:</strong> <code>secret://{VM_NAME}-ssh-key</code></li>
<li><strong>Root Password:</strong> <code>secret://{VM_NAME}-root-pass</code></li>
<li><strong>TLS Certificate:</strong> <code>secret://{DOMAIN}-tls</code></li>
</ul>
<p><small>Owner: {OWNER} | Created: {CREATED_DATE}</small></p>
</div>"#,
    },
    NoteTemplate {
        template_type: "web-server",
        format: NotesFormat::Markdown,
        body: r#"## {VM_NAME} - Web Server

**Purpose:** {PURPOSE}

- **IP Address:** {IP_ADDRESS}
- **Domain:** {DOMAIN}
- **Web Server:** {WEB_SERVER}
- **OS:** {OS}

### Access
- **SSH Key:** `secret://{VM_NAME}-ssh-key`
- **Root Password:** `secret://{VM_NAME}-root-pass`
- **TLS Certificate:** `secret://{DOMAIN}-tls`

Owner: {OWNER} | Created: {CREATED_DATE}"#,
    },
    NoteTemplate {
        template_type: "database",
        format: NotesFormat::Html,
        body: r#"<div class="vm-notes">
<h3>{VM_NAME} - Database Server</h3>
<p><strong>Purpose:</strong> {PURPOSE}</p>
<ul>
<li><strong>IP Address:</strong> {IP_ADDRESS}</li>
<li><strong>Engine:</strong> {DB_ENGINE}</li>
<li><strong>Port:</strong> {DB_PORT}</li>
<li><strong>Backups:</strong> {BACKUP_SCHEDULE}</li>
</ul>
<h4>Credentials</h4>
<ul>
<li><strong>Admin User:</strong> <code>secret://{VM_NAME}-db-admin</code></li>
<li><strong>Replication User:</strong> <code>secret://{VM_NAME}-db-replication</code></li>
<li><strong>SSH Key:</strong> <code>secret://{VM_NAME}-ssh-key</code></li>
</ul>
<p><small>Owner: {OWNER} | Created: {CREATED_DATE}</small></p>
</div>"#,
    },
    NoteTemplate {
        template_type: "database",
        format: NotesFormat::Markdown,
        body: r#"## {VM_NAME} - Database Server

**Purpose:** {PURPOSE}

- **IP Address:** {IP_ADDRESS}
- **Engine:** {DB_ENGINE}
- **Port:** {DB_PORT}
- **Backups:** {BACKUP_SCHEDULE}

### Credentials
- **Admin User:** `secret://{VM_NAME}-db-admin`
- **Replication User:** `secret://{VM_NAME}-db-replication`
- **SSH Key:** `secret://{VM_NAME}-ssh-key`

Owner: {OWNER} | Created: {CREATED_DATE}"#,
    },
    NoteTemplate {
        template_type: "development",
        format: NotesFormat::Html,
        body: r#"<div class="vm-notes">
<h3>{VM_NAME} - Development Environment</h3>
<p><strong>Project:</strong> {PROJECT}</p>
<ul>
<li><strong>IP Address:</strong> {IP_ADDRESS}</li>
<li><strong>Repository:</strong> {REPOSITORY}</li>
<li><strong>OS:</strong> {OS}</li>
</ul>
<h4>Access</h4>
<ul>
<li><strong>SSH Key:</strong> <code>secret://{VM_NAME}-ssh-key</code></li>
<li><strong>Deploy Key:</strong> <code>secret://{PROJECT}-deploy-key</code></li>
</ul>
<p><small>Owner: {OWNER} | Created: {CREATED_DATE}</small></p>
</div>"#,
    },
    NoteTemplate {
        template_type: "development",
        format: NotesFormat::Markdown,
        body: r#"# {VM_NAME} - Development Environment

**Project:** {PROJECT}

- **IP Address:** {IP_ADDRESS}
- **Repository:** {REPOSITORY}
- **OS:** {OS}

## Access
- **SSH Key:** `secret://{VM_NAME}-ssh-key`
- **Deploy Key:** `secret://{PROJECT}-deploy-key`

## Getting Started
1. Connect with `ssh {IP_ADDRESS}`
2. Clone `{REPOSITORY}`

Owner: {OWNER} | Created: {CREATED_DATE}"#,
    },
    NoteTemplate {
        template_type: "generic",
        format: NotesFormat::Html,
        body: r#"<div class="vm-notes">
<h3>{VM_NAME}</h3>
<p><strong>Purpose:</strong> {PURPOSE}</p>
<ul>
<li><strong>IP Address:</strong> {IP_ADDRESS}</li>
<li><strong>OS:</strong> {OS}</li>
<li><strong>Credentials:</strong> <code>secret://{VM_NAME}-credentials</code></li>
</ul>
<p><small>Owner: {OWNER} | Created: {CREATED_DATE}</small></p>
</div>"#,
    },
    NoteTemplate {
        template_type: "generic",
        format: NotesFormat::Markdown,
        body: r#"## {VM_NAME}

**Purpose:** {PURPOSE}

- **IP Address:** {IP_ADDRESS}
- **OS:** {OS}
- **Credentials:** `secret://{VM_NAME}-credentials`

Owner: {OWNER} | Created: {CREATED_DATE}"#,
    },
    NoteTemplate {
        template_type: "generic",
        format: NotesFormat::Plain,
        body: r#"{VM_NAME}
Purpose: {PURPOSE}
IP Address: {IP_ADDRESS}
OS: {OS}
Credentials: secret://{VM_NAME}-credentials
Owner: {OWNER}
Created: {CREATED_DATE}"#,
    },
    NoteTemplate {
        template_type: "minimal",
        format: NotesFormat::Html,
        body: r#"<p><strong>{VM_NAME}</strong> ({IP_ADDRESS}) - credentials: <code>secret://{VM_NAME}-credentials</code></p>"#,
    },
    NoteTemplate {
        template_type: "minimal",
        format: NotesFormat::Markdown,
        body: r#"**{VM_NAME}** ({IP_ADDRESS}) - credentials: `secret://{VM_NAME}-credentials`"#,
    },
    NoteTemplate {
        template_type: "minimal",
        format: NotesFormat::Plain,
        body: r#"{VM_NAME} ({IP_ADDRESS})
Credentials: secret://{VM_NAME}-credentials"#,
    },
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").expect("valid placeholder regex"));

// ── Rendering ────────────────────────────────────────────

/// A rendered template together with its placeholder report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub text: String,
    pub template_type: &'static str,
    pub format: NotesFormat,
    /// Placeholders present in the template source, sorted.
    pub variables_used: Vec<String>,
    /// Placeholders left in `text` for manual completion, sorted.
    pub unfilled: Vec<String>,
    pub length: usize,
}

/// Distinct template types in catalog order.
pub fn template_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = Vec::new();
    for t in TEMPLATES {
        if !types.contains(&t.template_type) {
            types.push(t.template_type);
        }
    }
    types
}

/// Every valid `type/format` pair.
pub fn combinations() -> Vec<String> {
    TEMPLATES
        .iter()
        .map(|t| format!("{}/{}", t.template_type, t.format))
        .collect()
}

pub fn lookup(template_type: &str, format: NotesFormat) -> Option<&'static NoteTemplate> {
    let wanted = template_type.trim().to_ascii_lowercase().replace('_', "-");
    TEMPLATES
        .iter()
        .find(|t| t.template_type == wanted && t.format == format)
}

/// Sorted, deduplicated placeholder names found in `text`.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Substitute known placeholders in one pass. Unknown placeholders stay as-is.
pub fn substitute(body: &str, variables: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn render(
    template_type: &str,
    format: &str,
    variables: &BTreeMap<String, String>,
) -> Result<String, NotesError> {
    render_template(template_type, format, variables).map(|r| r.text)
}

pub fn render_template(
    template_type: &str,
    format: &str,
    variables: &BTreeMap<String, String>,
) -> Result<RenderedTemplate, NotesError> {
    let unknown = || NotesError::UnknownTemplate {
        template_type: template_type.to_string(),
        format: format.to_string(),
        valid: combinations().join(", "),
    };
    let parsed: NotesFormat = format.parse().map_err(|_| unknown())?;
    let template = lookup(template_type, parsed).ok_or_else(unknown)?;

    let text = substitute(template.body, variables);
    tracing::debug!(
        template_type = template.template_type,
        format = %template.format,
        "rendered notes template"
    );

    Ok(RenderedTemplate {
        variables_used: placeholders(template.body),
        unfilled: placeholders(&text),
        length: text.chars().count(),
        template_type: template.template_type,
        format: template.format,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{classify, validate};

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn five_named_types() {
        assert_eq!(
            template_types(),
            vec!["web-server", "database", "development", "generic", "minimal"]
        );
    }

    #[test]
    fn every_template_renders_supplied_values() {
        let v = vars(&[("VM_NAME", "test-vm"), ("IP_ADDRESS", "192.168.1.100")]);
        for t in TEMPLATES {
            let out = render(t.template_type, t.format.as_str(), &v).unwrap();
            assert!(!out.is_empty());
            assert!(out.contains("test-vm"), "{}/{}", t.template_type, t.format);
            assert!(out.contains("192.168.1.100"), "{}/{}", t.template_type, t.format);
        }
    }

    #[test]
    fn templates_are_safe_and_use_references() {
        for t in TEMPLATES {
            assert!(t.body.contains("secret://"), "{}/{}", t.template_type, t.format);
            let v = validate::validate(t.body);
            assert!(v.is_valid, "{}/{}: {:?}", t.template_type, t.format, v.warnings);

            let filled = substitute(t.body, &vars(&[("VM_NAME", "web-01"), ("DOMAIN", "example.org")]));
            assert!(validate::validate(&filled).is_valid);
        }
    }

    #[test]
    fn unfilled_render_passes_validation() {
        for format in ["html", "markdown"] {
            let out = render("web-server", format, &BTreeMap::new()).unwrap();
            assert!(out.contains("secret://{VM_NAME}-root-pass"));
            let v = validate::validate(&out);
            assert!(v.is_valid, "web-server/{format}: {:?}", v.warnings);
        }
    }

    #[test]
    fn templates_classify_as_their_format() {
        for t in TEMPLATES {
            assert_eq!(classify::classify(t.body), t.format, "{}", t.template_type);
        }
    }

    #[test]
    fn literal_fragments_survive_rendering() {
        let v = vars(&[("VM_NAME", "db-01")]);
        let out = render("database", "markdown", &v).unwrap();
        for fragment in PLACEHOLDER.split(lookup("database", NotesFormat::Markdown).unwrap().body) {
            assert!(out.contains(fragment), "missing {fragment:?}");
        }
    }

    #[test]
    fn missing_variables_stay_verbatim() {
        let r = render_template("minimal", "plain", &vars(&[("VM_NAME", "edge")])).unwrap();
        assert_eq!(r.text, "edge ({IP_ADDRESS})\nCredentials: secret://edge-credentials");
        assert_eq!(r.variables_used, vec!["IP_ADDRESS", "VM_NAME"]);
        assert_eq!(r.unfilled, vec!["IP_ADDRESS"]);
        assert_eq!(r.length, r.text.chars().count());
    }

    #[test]
    fn substitution_is_single_pass() {
        let v = vars(&[("VM_NAME", "{IP_ADDRESS}"), ("IP_ADDRESS", "10.0.0.1")]);
        let out = render("minimal", "plain", &v).unwrap();
        assert!(out.starts_with("{IP_ADDRESS} (10.0.0.1)"));
    }

    #[test]
    fn type_names_are_normalized() {
        assert!(lookup("Web_Server", NotesFormat::Html).is_some());
    }

    #[test]
    fn unknown_combination_lists_valid_options() {
        let err = render("web-server", "plain", &BTreeMap::new()).unwrap_err();
        match err {
            NotesError::UnknownTemplate { valid, .. } => {
                assert!(valid.contains("web-server/html"));
                assert!(valid.contains("minimal/plain"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(render("kubernetes", "html", &BTreeMap::new()).is_err());
        assert!(render("generic", "rtf", &BTreeMap::new()).is_err());
    }
}

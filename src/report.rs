//! Plain-text and JSON renderings of command results.

use std::fmt::Write as _;

use facet::Facet;

use crate::notes::{FormattedNotes, RenderedTemplate, Validation, ValidationWarning};
use crate::service::{GuestSummary, NotesReport, UpdateOutcome};

// ── JSON output structs ─────────────────────────────────────────────

#[derive(Facet)]
struct GuestJson {
    kind: String,
    vmid: u32,
    name: Option<String>,
    node: String,
}

#[derive(Facet)]
struct NotesJson {
    content: String,
    format: String,
    secret_references: Vec<String>,
    length: usize,
    preview: Option<String>,
}

#[derive(Facet)]
struct ReadJson {
    guest: GuestJson,
    notes: NotesJson,
}

#[derive(Facet)]
struct WarningJson {
    kind: String,
    message: String,
}

#[derive(Facet)]
struct WriteJson {
    success: bool,
    dry_run: bool,
    action: String,
    guest: GuestJson,
    error: Option<String>,
    warnings: Vec<WarningJson>,
    previous_content: Option<String>,
    content_length: Option<usize>,
    format: Option<String>,
    previous_length: Option<usize>,
    result: Option<String>,
}

#[derive(Facet)]
struct TemplateJson {
    template: String,
    template_type: String,
    format: String,
    variables_used: Vec<String>,
    unfilled: Vec<String>,
    length: usize,
}

#[derive(Facet)]
struct CheckJson {
    is_valid: bool,
    format: String,
    secret_references: Vec<String>,
    warnings: Vec<WarningJson>,
}

fn guest_json(g: &GuestSummary) -> GuestJson {
    GuestJson {
        kind: g.kind.as_str().to_string(),
        vmid: g.vmid,
        name: g.name.clone(),
        node: g.node.clone(),
    }
}

fn warnings_json(warnings: &[ValidationWarning]) -> Vec<WarningJson> {
    warnings
        .iter()
        .map(|w| WarningJson {
            kind: w.kind.as_str().to_string(),
            message: w.message.clone(),
        })
        .collect()
}

fn notes_json(n: &FormattedNotes) -> NotesJson {
    NotesJson {
        content: n.content.clone(),
        format: n.format.as_str().to_string(),
        secret_references: n.secret_references.clone(),
        length: n.length,
        preview: n.preview.clone(),
    }
}

// ── Public renderers ────────────────────────────────────────────────

pub fn read_json(report: &NotesReport) -> String {
    facet_json::to_string(&ReadJson {
        guest: guest_json(&report.guest),
        notes: notes_json(&report.notes),
    })
    .expect("JSON serialization")
}

pub fn write_json(action: &str, outcome: &UpdateOutcome) -> String {
    let json = match outcome {
        UpdateOutcome::Blocked { guest, warnings } => WriteJson {
            success: false,
            dry_run: false,
            action: action.to_string(),
            guest: guest_json(guest),
            error: Some("content validation failed".into()),
            warnings: warnings_json(warnings),
            previous_content: None,
            content_length: None,
            format: None,
            previous_length: None,
            result: None,
        },
        UpdateOutcome::DryRun {
            guest,
            content_length,
            format,
            warnings,
            previous_length,
        } => WriteJson {
            success: true,
            dry_run: true,
            action: action.to_string(),
            guest: guest_json(guest),
            error: None,
            warnings: warnings_json(warnings),
            previous_content: None,
            content_length: Some(*content_length),
            format: Some(format.as_str().to_string()),
            previous_length: Some(*previous_length),
            result: None,
        },
        UpdateOutcome::Applied {
            guest,
            previous_content,
            warnings,
            ack,
        } => WriteJson {
            success: true,
            dry_run: false,
            action: action.to_string(),
            guest: guest_json(guest),
            error: None,
            warnings: warnings_json(warnings),
            previous_content: previous_content.clone(),
            content_length: None,
            format: None,
            previous_length: None,
            result: Some(ack.clone()),
        },
    };
    facet_json::to_string(&json).expect("JSON serialization")
}

pub fn template_json(t: &RenderedTemplate) -> String {
    facet_json::to_string(&TemplateJson {
        template: t.text.clone(),
        template_type: t.template_type.to_string(),
        format: t.format.as_str().to_string(),
        variables_used: t.variables_used.clone(),
        unfilled: t.unfilled.clone(),
        length: t.length,
    })
    .expect("JSON serialization")
}

pub fn check_json(validation: &Validation, notes: &FormattedNotes) -> String {
    facet_json::to_string(&CheckJson {
        is_valid: validation.is_valid,
        format: notes.format.as_str().to_string(),
        secret_references: notes.secret_references.clone(),
        warnings: warnings_json(&validation.warnings),
    })
    .expect("JSON serialization")
}

fn guest_line(g: &GuestSummary) -> String {
    match &g.name {
        Some(name) => format!("{} {} '{name}' on {}", g.kind, g.vmid, g.node),
        None => format!("{} {} on {}", g.kind, g.vmid, g.node),
    }
}

fn push_warnings(out: &mut String, warnings: &[ValidationWarning]) {
    for w in warnings {
        let _ = writeln!(out, "  [{}] {}", w.kind, w.message);
    }
}

pub fn read_plain(report: &NotesReport) -> String {
    let n = &report.notes;
    let mut out = String::new();
    let _ = writeln!(out, "{}", guest_line(&report.guest));
    let _ = writeln!(out, "Format: {} ({} chars)", n.format, n.length);
    if !n.secret_references.is_empty() {
        let _ = writeln!(out, "Secret references: {}", n.secret_references.join(", "));
    }
    out.push_str("---\n");
    out.push_str(n.preview.as_deref().unwrap_or(&n.content));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

pub fn write_plain(action: &str, outcome: &UpdateOutcome) -> String {
    let mut out = String::new();
    match outcome {
        UpdateOutcome::Blocked { guest, warnings } => {
            let _ = writeln!(
                out,
                "{action} blocked for {}: content validation failed",
                guest_line(guest)
            );
            push_warnings(&mut out, warnings);
            out.push_str("Store credentials in the secret store and reference them as secret://<name>.\n");
        }
        UpdateOutcome::DryRun {
            guest,
            content_length,
            format,
            warnings,
            previous_length,
        } => {
            let _ = writeln!(out, "Dry run: {action} on {}", guest_line(guest));
            let _ = writeln!(out, "  new content: {content_length} chars ({format})");
            let _ = writeln!(out, "  previous content: {previous_length} chars");
            push_warnings(&mut out, warnings);
        }
        UpdateOutcome::Applied {
            guest,
            previous_content,
            warnings,
            ..
        } => {
            let _ = writeln!(out, "{action} done on {}", guest_line(guest));
            push_warnings(&mut out, warnings);
            if let Some(prev) = previous_content
                && !prev.is_empty()
            {
                out.push_str("--- previous notes ---\n");
                out.push_str(prev);
                if !prev.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
    out
}

pub fn check_plain(validation: &Validation, notes: &FormattedNotes) -> String {
    let mut out = String::new();
    if validation.is_valid {
        let _ = writeln!(out, "OK: no literal secrets found ({} content)", notes.format);
    } else {
        let _ = writeln!(out, "BLOCKED: {} warning(s)", validation.warnings.len());
        push_warnings(&mut out, &validation.warnings);
    }
    if !notes.secret_references.is_empty() {
        let _ = writeln!(out, "Secret references: {}", notes.secret_references.join(", "));
    }
    out
}

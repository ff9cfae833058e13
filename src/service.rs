//! Read/update/remove operations on guest notes, layered over a [`Platform`].

use std::collections::BTreeMap;

use crate::error::NotesError;
use crate::notes::{self, FormatHint, FormattedNotes, NotesFormat, RenderedTemplate, ValidationWarning};
use crate::platform::{GuestKind, Platform, ResolvedGuest, Selector};

/// Echo of the guest a selector resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestSummary {
    pub kind: GuestKind,
    pub vmid: u32,
    pub name: Option<String>,
    pub node: String,
}

impl From<&ResolvedGuest> for GuestSummary {
    fn from(g: &ResolvedGuest) -> Self {
        Self {
            kind: g.descriptor.kind,
            vmid: g.vmid,
            name: g.descriptor.name.clone(),
            node: g.node.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub format: FormatHint,
    pub parse_secrets: bool,
    pub preview: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            format: FormatHint::Auto,
            parse_secrets: true,
            preview: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    pub format: FormatHint,
    pub validate: bool,
    pub backup: bool,
    pub dry_run: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            format: FormatHint::Auto,
            validate: true,
            backup: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RemoveOptions {
    pub backup: bool,
    pub dry_run: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesReport {
    pub guest: GuestSummary,
    pub notes: FormattedNotes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Validation found a literal secret; nothing was fetched or written.
    Blocked {
        guest: GuestSummary,
        warnings: Vec<ValidationWarning>,
    },
    DryRun {
        guest: GuestSummary,
        content_length: usize,
        format: NotesFormat,
        warnings: Vec<ValidationWarning>,
        previous_length: usize,
    },
    Applied {
        guest: GuestSummary,
        previous_content: Option<String>,
        warnings: Vec<ValidationWarning>,
        ack: String,
    },
}

impl UpdateOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, UpdateOutcome::Blocked { .. })
    }
}

/// Render a catalog template. Needs no platform, so it is not a service method.
pub fn template(
    template_type: &str,
    format: &str,
    variables: &BTreeMap<String, String>,
) -> Result<RenderedTemplate, NotesError> {
    notes::render_template(template_type, format, variables)
}

pub struct NotesService<P> {
    platform: P,
}

impl<P: Platform> NotesService<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub async fn read(&self, selector: &Selector, opts: ReadOptions) -> Result<NotesReport, NotesError> {
        let guest = self.platform.resolve(selector).await?;
        let raw = self
            .platform
            .get_notes(guest.descriptor.kind, &guest.node, guest.vmid)
            .await?;
        tracing::debug!(vmid = guest.vmid, node = %guest.node, length = raw.len(), "read notes");

        let mut formatted = notes::format_output(&raw, opts.format, opts.parse_secrets);
        if opts.preview {
            formatted = formatted.with_preview();
        }
        Ok(NotesReport {
            guest: GuestSummary::from(&guest),
            notes: formatted,
        })
    }

    pub async fn update(
        &self,
        selector: &Selector,
        content: &str,
        opts: UpdateOptions,
    ) -> Result<UpdateOutcome, NotesError> {
        let guest = self.platform.resolve(selector).await?;
        let summary = GuestSummary::from(&guest);

        let validation = notes::validate(content);
        if !validation.is_valid {
            if opts.validate {
                tracing::info!(
                    vmid = guest.vmid,
                    warnings = validation.warnings.len(),
                    "notes update blocked by validation"
                );
                return Ok(UpdateOutcome::Blocked {
                    guest: summary,
                    warnings: validation.warnings,
                });
            }
            for w in &validation.warnings {
                tracing::warn!(vmid = guest.vmid, kind = %w.kind, "{}", w.message);
            }
        }

        self.write(guest, summary, content, opts.format, opts.backup, opts.dry_run, validation.warnings)
            .await
    }

    /// Clear the notes field. Empty content is never validated.
    pub async fn remove(&self, selector: &Selector, opts: RemoveOptions) -> Result<UpdateOutcome, NotesError> {
        let guest = self.platform.resolve(selector).await?;
        let summary = GuestSummary::from(&guest);
        self.write(guest, summary, "", FormatHint::Auto, opts.backup, opts.dry_run, Vec::new())
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn write(
        &self,
        guest: ResolvedGuest,
        summary: GuestSummary,
        content: &str,
        format: FormatHint,
        backup: bool,
        dry_run: bool,
        warnings: Vec<ValidationWarning>,
    ) -> Result<UpdateOutcome, NotesError> {
        let kind = guest.descriptor.kind;
        let previous_content = if backup {
            Some(self.platform.get_notes(kind, &guest.node, guest.vmid).await?)
        } else {
            None
        };

        if dry_run {
            return Ok(UpdateOutcome::DryRun {
                guest: summary,
                content_length: content.chars().count(),
                format: format.resolve(content),
                warnings,
                previous_length: previous_content.as_deref().map_or(0, |p| p.chars().count()),
            });
        }

        let ack = self
            .platform
            .set_notes(kind, &guest.node, guest.vmid, content)
            .await?;
        tracing::info!(
            %kind,
            vmid = guest.vmid,
            node = %guest.node,
            length = content.len(),
            "notes written"
        );

        Ok(UpdateOutcome::Applied {
            guest: summary,
            previous_content,
            warnings,
            ack,
        })
    }
}

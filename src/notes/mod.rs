//! Notes content engine: classification, secret references, leak detection,
//! templates and preview rendering for guest description fields.
//!
//! Everything here is a pure function over in-memory text. The only shared
//! structure is the template catalog, which is a `const` table.

pub mod classify;
pub mod output;
pub mod preview;
pub mod secrets;
pub mod template;
pub mod validate;

pub use classify::{NotesFormat, classify};
pub use output::{FormatHint, FormattedNotes, format_output};
pub use preview::render_preview;
pub use secrets::extract_references;
pub use template::{RenderedTemplate, render, render_template};
pub use validate::{Validation, ValidationWarning, WarningKind, validate};

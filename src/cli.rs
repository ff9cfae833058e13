use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::notes::{FormatHint, NotesFormat};
use crate::platform::{GuestKind, GuestRef, Selector};

#[derive(Parser, Debug)]
#[command(
    name = "pvenotes",
    version,
    about = "Guest notes management for Proxmox VE, with secret-leak checks"
)]
pub struct Cli {
    /// Path to config file (default: ~/.config/pvenotes/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain on a terminal, JSON otherwise
    Auto,
    Plain,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Auto,
    Html,
    Markdown,
    Plain,
}

impl From<FormatArg> for FormatHint {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Auto => FormatHint::Auto,
            FormatArg::Html => FormatHint::Fixed(NotesFormat::Html),
            FormatArg::Markdown => FormatHint::Fixed(NotesFormat::Markdown),
            FormatArg::Plain => FormatHint::Fixed(NotesFormat::Plain),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SelectorArgs {
    /// Numeric guest id
    #[arg(long, conflicts_with = "name", required_unless_present = "name")]
    pub vmid: Option<u32>,

    /// Guest name (exact match)
    #[arg(long)]
    pub name: Option<String>,

    /// Node, required when a name exists on several nodes
    #[arg(long)]
    pub node: Option<String>,

    /// Target an LXC container instead of a VM
    #[arg(long)]
    pub lxc: bool,
}

impl SelectorArgs {
    pub fn to_selector(&self) -> Selector {
        let target = match (&self.vmid, &self.name) {
            (Some(id), _) => GuestRef::Id(*id),
            (None, Some(name)) => GuestRef::Name(name.clone()),
            // clap enforces one of the two
            (None, None) => GuestRef::Id(0),
        };
        Selector {
            kind: if self.lxc { GuestKind::Lxc } else { GuestKind::Vm },
            target,
            node: self.node.clone(),
        }
    }
}

/// Content given inline or read from a file (`-` for stdin).
#[derive(Args, Debug, Clone)]
pub struct ContentArgs {
    /// Notes text
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub content: Option<String>,

    /// Read notes text from a file, `-` for stdin
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// File to read, stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a guest's notes with format detection and secret references
    Read {
        #[command(flatten)]
        selector: SelectorArgs,

        #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,

        /// Skip secret reference extraction
        #[arg(long)]
        no_secrets: bool,

        /// Include an HTML preview of markdown notes
        #[arg(long)]
        preview: bool,
    },

    /// Replace a guest's notes after checking them for literal secrets
    Update {
        #[command(flatten)]
        selector: SelectorArgs,

        #[command(flatten)]
        input: ContentArgs,

        #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,

        /// Write even if the leak check finds something
        #[arg(long)]
        no_validate: bool,

        /// Do not fetch the previous notes
        #[arg(long)]
        no_backup: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Confirm the write
        #[arg(short, long)]
        yes: bool,
    },

    /// Clear a guest's notes
    Remove {
        #[command(flatten)]
        selector: SelectorArgs,

        #[arg(long)]
        no_backup: bool,

        #[arg(long)]
        dry_run: bool,

        #[arg(short, long)]
        yes: bool,
    },

    /// Render a notes template
    Template {
        /// web-server, database, development, generic or minimal
        template_type: String,

        #[arg(long, default_value = "html")]
        format: String,

        /// Placeholder value, e.g. --var VM_NAME=web-01
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Run the leak check on local text
    Check {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Render a markdown preview of local text
    Preview {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{s}'"));
    }
    Ok((key.to_ascii_uppercase(), value.to_string()))
}

use std::collections::BTreeMap;
use std::io::{IsTerminal, Read};
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pvenotes::cli::{Cli, Command, ContentArgs, OutputFormat};
use pvenotes::config;
use pvenotes::error::NotesError;
use pvenotes::notes::{self, FormatHint};
use pvenotes::platform::proxmox::ProxmoxPlatform;
use pvenotes::report;
use pvenotes::service::{self, NotesService, ReadOptions, RemoveOptions, UpdateOptions, UpdateOutcome};

/// Exit status for a write or check refused by the leak detector.
const EXIT_BLOCKED: i32 = 2;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("pvenotes=debug")
    } else {
        EnvFilter::from_default_env().add_directive("pvenotes=warn".parse().expect("valid log directive"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let json = matches!(resolve_output_format(&cli.output), OutputFormat::Json);
    let config_path = cli.config.clone();

    match cli.command {
        Command::Template {
            template_type,
            format,
            vars,
        } => {
            let variables: BTreeMap<String, String> = vars.into_iter().collect();
            let rendered = service::template(&template_type, &format, &variables)?;
            if json {
                println!("{}", report::template_json(&rendered));
            } else {
                println!("{}", rendered.text);
                if !rendered.unfilled.is_empty() {
                    eprintln!("unfilled placeholders: {}", rendered.unfilled.join(", "));
                }
            }
        }
        Command::Check { input } => {
            let text = read_input(input.file.as_deref())?;
            let validation = notes::validate(&text);
            let formatted = notes::format_output(&text, FormatHint::Auto, true);
            if json {
                println!("{}", report::check_json(&validation, &formatted));
            } else {
                print!("{}", report::check_plain(&validation, &formatted));
            }
            if !validation.is_valid {
                std::process::exit(EXIT_BLOCKED);
            }
        }
        Command::Preview { input } => {
            let text = read_input(input.file.as_deref())?;
            println!("{}", notes::render_preview(&text));
        }
        Command::Read {
            selector,
            format,
            no_secrets,
            preview,
        } => {
            let service = connect(config_path.as_deref())?;
            let opts = ReadOptions {
                format: format.into(),
                parse_secrets: !no_secrets,
                preview,
            };
            let notes_report = service.read(&selector.to_selector(), opts).await?;
            if json {
                println!("{}", report::read_json(&notes_report));
            } else {
                print!("{}", report::read_plain(&notes_report));
            }
        }
        Command::Update {
            selector,
            input,
            format,
            no_validate,
            no_backup,
            dry_run,
            yes,
        } => {
            confirm("update", dry_run, yes)?;
            let content = read_content(&input)?;
            let service = connect(config_path.as_deref())?;
            let opts = UpdateOptions {
                format: format.into(),
                validate: !no_validate,
                backup: !no_backup,
                dry_run,
            };
            let outcome = service.update(&selector.to_selector(), &content, opts).await?;
            print_write("update", &outcome, json);
            if outcome.is_blocked() {
                std::process::exit(EXIT_BLOCKED);
            }
        }
        Command::Remove {
            selector,
            no_backup,
            dry_run,
            yes,
        } => {
            confirm("remove", dry_run, yes)?;
            let service = connect(config_path.as_deref())?;
            let opts = RemoveOptions {
                backup: !no_backup,
                dry_run,
            };
            let outcome = service.remove(&selector.to_selector(), opts).await?;
            print_write("remove", &outcome, json);
        }
    }

    Ok(())
}

/// Writes need `--yes` unless they are dry runs. Checked before any network traffic.
fn confirm(action: &str, dry_run: bool, yes: bool) -> Result<(), NotesError> {
    if dry_run || yes {
        return Ok(());
    }
    Err(NotesError::ConfirmationRequired {
        action: action.to_string(),
    })
}

fn connect(config_path: Option<&Path>) -> Result<NotesService<ProxmoxPlatform>, NotesError> {
    let config = config::load_config(config_path)?;
    Ok(NotesService::new(ProxmoxPlatform::new(&config.platform)?))
}

fn print_write(action: &str, outcome: &UpdateOutcome, json: bool) {
    if json {
        println!("{}", report::write_json(action, outcome));
    } else {
        print!("{}", report::write_plain(action, outcome));
    }
}

/// Notes to be written must be valid UTF-8; nothing is replaced silently.
fn read_content(input: &ContentArgs) -> Result<String, NotesError> {
    if let Some(text) = &input.content {
        return Ok(text.clone());
    }
    let (context, bytes) = read_bytes(input.file.as_deref())?;
    String::from_utf8(bytes).map_err(|e| NotesError::Io {
        context: format!("input is not valid UTF-8 ({context})"),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

/// Text for local inspection. Invalid UTF-8 is replaced, not rejected.
fn read_input(path: Option<&Path>) -> Result<String, NotesError> {
    let (_, bytes) = read_bytes(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a file, or stdin for `None`/`-`.
fn read_bytes(path: Option<&Path>) -> Result<(String, Vec<u8>), NotesError> {
    match path {
        Some(p) if p != Path::new("-") => {
            let context = format!("reading {}", p.display());
            let bytes = std::fs::read(p).map_err(|e| NotesError::Io {
                context: context.clone(),
                source: e,
            })?;
            Ok((context, bytes))
        }
        _ => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|e| NotesError::Io {
                    context: "reading stdin".into(),
                    source: e,
                })?;
            Ok(("reading stdin".into(), bytes))
        }
    }
}

/// Resolve `Auto` to a concrete format based on terminal detection.
fn resolve_output_format(format: &OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Plain
            } else {
                OutputFormat::Json
            }
        }
        other => other.clone(),
    }
}

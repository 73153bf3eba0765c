//! Executing parsed commands against a [`Controller`].

use std::io::Write;

use anyhow::Context;
use qrgen_core::{ColorChannel, HistoryEntry, Notification, NotificationKind};
use qrgen_renderer::ExportFormat;

use crate::cli::{Command, GenerateArgs, HistoryCommand, PanelCommand, ThemeCommand};
use crate::controller::Controller;

/// Run `command`, writing its output to `out`.
///
/// User-facing failures are reported through the controller's
/// notifications; an `Err` here means `out` could not be written.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub async fn execute<W: Write>(
    controller: &mut Controller,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Generate(args) => generate(controller, args, out).await,
        Command::History(HistoryCommand::List { search, json }) => {
            let entries = controller.search_history(search.as_deref().unwrap_or(""));
            if json {
                serde_json::to_writer_pretty(&mut *out, &entries)
                    .context("Failed to write history as JSON")?;
                writeln!(out)?;
            } else {
                for entry in entries {
                    write_entry(out, entry)?;
                }
            }
            Ok(())
        }
        Command::History(HistoryCommand::Clear) => {
            controller.clear_history();
            Ok(())
        }
        Command::History(HistoryCommand::Load { id }) => {
            if controller.load_from_history(id) {
                let config = controller.config();
                writeln!(out, "text: {}", config.text)?;
                writeln!(out, "foreground: {}", config.foreground_color)?;
                writeln!(out, "background: {}", config.background_color)?;
            } else {
                writeln!(out, "No history entry {id}")?;
            }
            Ok(())
        }
        Command::Theme(ThemeCommand::Get) => {
            let theme = controller.theme();
            writeln!(out, "{} ({})", theme.preference(), theme.resolved())?;
            Ok(())
        }
        Command::Theme(ThemeCommand::Set { preference }) => {
            let resolved = controller.set_theme(preference);
            writeln!(out, "{preference} ({resolved})")?;
            Ok(())
        }
        Command::Panel(PanelCommand::Toggle) => {
            let collapsed = controller.toggle_history_panel();
            writeln!(out, "{}", if collapsed { "collapsed" } else { "expanded" })?;
            Ok(())
        }
    }
}

async fn generate<W: Write>(
    controller: &mut Controller,
    args: GenerateArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    controller.set_text(args.text);
    controller.set_color(ColorChannel::Foreground, args.fg);
    controller.set_color(ColorChannel::Background, args.bg);

    if args.save {
        controller.save_to_history();
    }

    let format = ExportFormat::from(args.format);
    if let Some(path) = controller.export(format, args.out).await {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

fn write_entry<W: Write>(out: &mut W, entry: &HistoryEntry) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  {}  {}/{}  {}",
        entry.id,
        entry.created_at,
        entry.config.foreground_color,
        entry.config.background_color,
        entry.config.text.replace('\n', "\\n"),
    )
}

/// Write pending notifications, one per line.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_notifications<W: Write>(out: &mut W, notifications: &[Notification]) -> std::io::Result<()> {
    for notification in notifications {
        let label = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
        };
        writeln!(out, "[{label}] {}", notification.message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use qrgen_core::MemoryStore;
    use qrgen_renderer::ExportPipeline;
    use std::sync::Arc;

    use crate::cli::CliArgs;

    fn controller() -> Controller {
        Controller::new(
            Arc::new(MemoryStore::new()),
            ExportPipeline::with_defaults(),
            false,
        )
    }

    async fn run(controller: &mut Controller, argv: &[&str]) -> String {
        let args = CliArgs::try_parse_from(argv).expect("parse");
        let mut out = Vec::new();
        execute(controller, args.command, &mut out)
            .await
            .expect("execute");
        String::from_utf8(out).expect("utf8")
    }

    #[tokio::test]
    async fn test_history_list_shows_seeds() {
        let mut controller = controller();
        let output = run(&mut controller, &["qrgen", "history", "list"]).await;
        assert_eq!(output.lines().count(), 5);
        assert!(output.lines().next().expect("line").ends_with("https://github.com"));
    }

    #[tokio::test]
    async fn test_history_list_json_filters() {
        let mut controller = controller();
        let output = run(&mut controller, &["qrgen", "history", "list", "--search", "mailto", "--json"]).await;
        let entries: Vec<HistoryEntry> = serde_json::from_str(&output).expect("json");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].config.text.starts_with("mailto:"));
    }

    #[tokio::test]
    async fn test_history_load_prints_entry() {
        let mut controller = controller();
        let id = controller.history()[1].id.to_string();
        let output = run(&mut controller, &["qrgen", "history", "load", &id]).await;
        assert!(output.starts_with("text: "));
        assert_eq!(controller.config().text, controller.history()[1].config.text);
    }

    #[tokio::test]
    async fn test_generate_with_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out_dir = dir.path().to_string_lossy().into_owned();
        let mut controller = controller();

        let output = run(
            &mut controller,
            &["qrgen", "generate", "hello", "--save", "--out", &out_dir],
        )
        .await;

        assert!(output.trim_end().ends_with(".svg"));
        assert_eq!(controller.history()[0].config.text, "hello");

        let mut err = Vec::new();
        write_notifications(&mut err, &controller.notifications()).expect("write");
        let err = String::from_utf8(err).expect("utf8");
        assert_eq!(err, "[ok] QR code saved to history!\n[ok] QR code downloaded as SVG!\n");
    }

    #[tokio::test]
    async fn test_theme_and_panel_commands() {
        let mut controller = controller();
        assert_eq!(run(&mut controller, &["qrgen", "theme", "get"]).await, "system (light)\n");
        assert_eq!(run(&mut controller, &["qrgen", "theme", "set", "dark"]).await, "dark (dark)\n");
        assert_eq!(run(&mut controller, &["qrgen", "panel", "toggle"]).await, "collapsed\n");
    }
}

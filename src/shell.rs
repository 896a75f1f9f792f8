//! Interactive line-oriented editor.
//!
//! Reads one command per line and prints the resulting session view after
//! each state change.

use crate::error::LuminaError;
use crate::session::{QuickAction, Session, SessionView};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &str = "\
Commands:
  open <path>      load an image
  action <name>    run a preset (remove-bg, indoor, outdoor, cyberpunk, enhance)
  prompt <text>    set the custom instruction
  apply            run the custom instruction
  original         show the original image
  history          list recent edits
  show <id>        show a history entry
  save [dir]       export the current image (default: current directory)
  reset            start over (history is kept)
  status           print the editor state
  help             show this help
  quit             leave";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load an image file.
    Open(PathBuf),
    /// Run a preset.
    Action(QuickAction),
    /// Set the custom instruction.
    Prompt(String),
    /// Run the custom instruction.
    Apply,
    /// Show the original image.
    Original,
    /// List history.
    History,
    /// Show a history entry.
    Show(String),
    /// Export the current image.
    Save(Option<PathBuf>),
    /// Start over.
    Reset,
    /// Print state.
    Status,
    /// Print help.
    Help,
    /// Leave the shell.
    Quit,
}

/// Parses one input line.
pub fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let require = |what: &str| {
        if rest.is_empty() {
            Err(format!("usage: {word} <{what}>"))
        } else {
            Ok(rest.to_string())
        }
    };

    match word.to_lowercase().as_str() {
        "open" | "load" => Ok(Command::Open(PathBuf::from(require("path")?))),
        "action" => {
            let name = require("name")?;
            QuickAction::from_name(&name)
                .map(Command::Action)
                .ok_or_else(|| format!("unknown action: {name}"))
        }
        "prompt" => Ok(Command::Prompt(rest.to_string())),
        "apply" => Ok(Command::Apply),
        "original" => Ok(Command::Original),
        "history" => Ok(Command::History),
        "show" => Ok(Command::Show(require("id")?)),
        "save" | "download" => Ok(Command::Save(
            (!rest.is_empty()).then(|| PathBuf::from(rest)),
        )),
        "reset" => Ok(Command::Reset),
        "status" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other} (try `help`)")),
    }
}

/// Renders a view as plain text.
pub fn render(view: &SessionView) -> String {
    let mut out = String::new();

    match (&view.current_mime_type, view.showing_original) {
        (Some(mime), true) => out.push_str(&format!("canvas: original ({mime})\n")),
        (Some(mime), false) => out.push_str(&format!("canvas: edited ({mime})\n")),
        (None, _) => out.push_str("canvas: empty, `open <path>` to start\n"),
    }

    if view.show_overlay {
        out.push_str(&format!("processing: {}\n", view.status));
    }

    let actions: Vec<String> = view
        .quick_actions
        .iter()
        .map(|a| {
            if a.active {
                format!("[{}]", a.label)
            } else {
                a.label.to_string()
            }
        })
        .collect();
    out.push_str(&format!("actions: {}\n", actions.join("  ")));

    if !view.history.is_empty() {
        out.push_str("history:\n");
        for entry in &view.history {
            out.push_str(&format!("  {}  {}\n", entry.id, entry.prompt));
        }
    }

    if let Some(ref notice) = view.notice {
        out.push_str(&format!("! {notice}\n"));
    }

    out
}

/// Drives a [`Session`] from line input.
pub struct Shell<'a> {
    session: &'a Session,
}

impl<'a> Shell<'a> {
    /// Creates a shell over `session`.
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Runs until `quit` or end of input.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        writer.write_all(b"lumina> ").await?;
        writer.flush().await?;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                writer.write_all(b"lumina> ").await?;
                writer.flush().await?;
                continue;
            }

            let output = match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await,
                Err(msg) => format!("{msg}\n"),
            };

            writer.write_all(output.as_bytes()).await?;
            writer.write_all(b"lumina> ").await?;
            writer.flush().await?;
        }

        writer.write_all(b"\n").await?;
        writer.flush().await
    }

    /// Executes one command and returns the text to print.
    pub async fn execute(&self, command: Command) -> String {
        let result = match command {
            Command::Open(path) => self.session.select_image(&path).await,
            Command::Action(action) => self
                .session
                .apply_quick_action(action)
                .await
                .and_then(require_image),
            Command::Prompt(text) => {
                self.session.set_custom_prompt(text);
                Ok(())
            }
            Command::Apply => {
                let view = SessionView::from_snapshot(&self.session.snapshot());
                if !view.can_submit_custom {
                    return "set an instruction first with `prompt <text>`\n".to_string();
                }
                self.session
                    .apply_custom_edit()
                    .await
                    .and_then(require_image)
            }
            Command::Original => {
                self.session.revert_to_original();
                Ok(())
            }
            Command::Show(id) => self.session.select_history_item(&id),
            Command::Save(dir) => {
                let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                return match self.session.save_current(&dir).await {
                    Ok(path) => format!("saved {}\n", path.display()),
                    Err(e) => format!("! {}\n", e.user_message()),
                };
            }
            Command::Reset => {
                self.session.reset();
                Ok(())
            }
            Command::History => {
                let history = self.session.history();
                if history.is_empty() {
                    return "no edits yet\n".to_string();
                }
                return history
                    .iter()
                    .map(|item| format!("{}  {}\n", item.id, item.prompt))
                    .collect();
            }
            Command::Help => return format!("{HELP}\n"),
            Command::Status | Command::Quit => Ok(()),
        };

        let view = SessionView::from_snapshot(&self.session.snapshot());
        match result {
            Ok(()) => render(&view),
            Err(e) => {
                let msg = e.user_message();
                // Edit failures already show up as the session notice.
                if view.notice.as_deref() == Some(msg.as_str()) {
                    render(&view)
                } else {
                    format!("! {msg}\n{}", render(&view))
                }
            }
        }
    }
}

fn require_image<T>(item: Option<T>) -> crate::Result<()> {
    item.map(|_| ()).ok_or(LuminaError::NoImageLoaded)
}

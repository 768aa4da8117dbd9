//! Line-oriented terminal front-end for the key editor.
//!
//! Reads one command per line and prints the editor state as plain text.
//! Input arrives over a channel so a pending key generation never blocks
//! the next command.

use crate::app::key_editor::{identity_display_hint, EditorError, KeyEditor, KeyEditorView};
use crate::i18n;
use crate::types::{EditorOutcome, KeyPair, OwnIdentity, Project};
use std::io::{BufRead, Write};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// A parsed user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Projects,
    Identities,
    /// Select by 1-based index; `None` clears the selection
    SelectProject(Option<usize>),
    SelectIdentity(Option<usize>),
    CopyProject,
    CopyIdentity,
    Public(String),
    Private(String),
    Generate,
    Ok,
    Cancel,
    Help,
    Unknown(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    // 1-based for the user, 0 or nothing clears
    let index = || rest.parse::<usize>().ok().and_then(|n| n.checked_sub(1));

    let command = match word {
        "show" => Command::Show,
        "projects" => Command::Projects,
        "identities" => Command::Identities,
        "project" => Command::SelectProject(index()),
        "identity" => Command::SelectIdentity(index()),
        "copy-project" => Command::CopyProject,
        "copy-identity" => Command::CopyIdentity,
        "public" => Command::Public(rest.to_string()),
        "private" => Command::Private(rest.to_string()),
        "generate" => Command::Generate,
        "ok" => Command::Ok,
        "cancel" | "quit" => Command::Cancel,
        "help" | "?" => Command::Help,
        _ => Command::Unknown(word.to_string()),
    };
    Some(command)
}

/// Key editor view that talks to a terminal.
///
/// Output only: input lines arrive through the channel handed to [`run`].
pub struct TerminalView<W> {
    output: W,
    locale: String,
    /// Skip the "overwrite current keys?" question
    assume_yes: bool,
    /// Answer to the pending regenerate question, read by [`run`]
    regenerate_answer: Option<bool>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(output: W, locale: &str) -> Self {
        Self {
            output,
            locale: locale.to_string(),
            assume_yes: false,
            regenerate_answer: None,
        }
    }

    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn tr(&self, key: &str) -> String {
        i18n::message(&self.locale, key)
    }

    /// Print a line. Output errors are logged, not propagated; the view
    /// callbacks have no way to report them.
    pub fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{}", text).and_then(|_| self.output.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }

    /// Print a prompt without a line break.
    fn prompt(&mut self, key: &str) {
        let prompt = self.tr(key);
        if let Err(e) = write!(self.output, "{}", prompt).and_then(|_| self.output.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }

    fn render_list(&mut self, header: &str, items: &[String], selected: Option<usize>) {
        let mut text = format!("{}:", header);
        if items.is_empty() {
            text.push_str(&format!("\n  {}", self.tr("key_dialog.prompt.none")));
        }
        for (index, item) in items.iter().enumerate() {
            let marker = if Some(index) == selected { '*' } else { ' ' };
            text.push_str(&format!("\n {}[{}] {}", marker, index + 1, item));
        }
        self.say(&text);
    }
}

impl<W: Write> KeyEditorView for TerminalView<W> {
    fn render_key_pair(&mut self, key_pair: &KeyPair) {
        let text = format!(
            "{}\n  {}: {}\n  {}: {}",
            self.tr("key_dialog.label.keys"),
            self.tr("key_dialog.label.private_key"),
            key_pair.private_key,
            self.tr("key_dialog.label.public_key"),
            key_pair.public_key,
        );
        self.say(&text);
    }

    fn render_projects(&mut self, projects: &[Project], selected: Option<usize>) {
        let names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
        let header = self.tr("key_dialog.label.project");
        self.render_list(&header, &names, selected);
    }

    fn render_identities(&mut self, identities: &[OwnIdentity], selected: Option<usize>) {
        let hints: Vec<String> = identities.iter().map(identity_display_hint).collect();
        let header = self.tr("key_dialog.label.identity");
        self.render_list(&header, &hints, selected);
    }

    /// Input is asynchronous, so the answer is read by [`run`] before the
    /// editor asks. Without one the keys are kept.
    fn confirm_regenerate(&mut self) -> bool {
        self.regenerate_answer.take().unwrap_or(self.assume_yes)
    }

    fn show_error(&mut self, message: &str) {
        self.say(message);
    }

    fn close(&mut self, cancelled: bool) {
        let key = if cancelled {
            "key_dialog.status.cancelled"
        } else {
            "key_dialog.status.confirmed"
        };
        let text = self.tr(key);
        self.say(&text);
    }
}

/// Read lines from `input` on a dedicated thread.
///
/// The channel closes at end of input or on a read error. The thread is
/// detached: a read blocked on a terminal must not hold up shutdown.
pub fn spawn_line_reader<R: BufRead + Send + 'static>(input: R) -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read terminal input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Drive a key editor from terminal input until the user confirms or
/// cancels. End of input counts as cancel.
///
/// While a generation is outstanding, input keeps being read: `cancel` or
/// `ok` close the editor and abort the request.
pub async fn run<W: Write>(
    mut editor: KeyEditor<TerminalView<W>>,
    mut lines: UnboundedReceiver<String>,
) -> EditorOutcome {
    let help = editor.view().tr("key_dialog.prompt.help");
    editor.view_mut().say(&help);

    loop {
        let line = if editor.is_generating() {
            tokio::select! {
                biased;
                result = editor.finish_generation() => {
                    if let Some(Ok(_)) = result {
                        say_message(&mut editor, "key_dialog.status.generated");
                    }
                    continue;
                }
                line = lines.recv() => line,
            }
        } else {
            editor.view_mut().prompt("key_dialog.prompt.command");
            lines.recv().await
        };
        let Some(line) = line else {
            return editor.cancel();
        };
        let Some(command) = parse_command(&line) else {
            continue;
        };
        tracing::debug!(?command, "Terminal command");

        match command {
            Command::Show => {
                let key_pair = editor.key_pair().clone();
                editor.view_mut().render_key_pair(&key_pair);
            }
            Command::Projects => editor.select_project(editor.session().selected_project_index()),
            Command::Identities => {
                editor.select_identity(editor.session().selected_identity_index())
            }
            Command::SelectProject(index) => editor.select_project(index),
            Command::SelectIdentity(index) => editor.select_identity(index),
            Command::CopyProject => {
                if editor.copy_from_project().is_none() {
                    say_message(&mut editor, "key_dialog.error.no_selection");
                }
            }
            Command::CopyIdentity => {
                if editor.copy_from_identity().is_none() {
                    say_message(&mut editor, "key_dialog.error.no_selection");
                }
            }
            Command::Public(key) => editor.edit_public_key(key),
            Command::Private(key) => editor.edit_private_key(key),
            Command::Generate => {
                if !editor.is_generating() {
                    let answer = ask_regenerate(&mut editor, &mut lines).await;
                    editor.view_mut().regenerate_answer = Some(answer);
                }
                match editor.request_generation() {
                    Ok(true) => {
                        say_message(&mut editor, "key_dialog.status.generating");
                        // Give the request a chance to finish before more input is taken
                        tokio::task::yield_now().await;
                    }
                    Ok(false) => {}
                    Err(EditorError::GenerationPending) => {
                        say_message(&mut editor, "key_dialog.error.generation_pending");
                    }
                }
            }
            Command::Ok => return editor.confirm(),
            Command::Cancel => return editor.cancel(),
            Command::Help => editor.view_mut().say(&help),
            Command::Unknown(word) => {
                let text = i18n::format_message(
                    editor.locale(),
                    "key_dialog.prompt.unknown_command",
                    &[("command", word.as_str())],
                );
                editor.view_mut().say(&text);
            }
        }
    }
}

/// Ask whether generated keys may replace the current ones. End of input
/// counts as no.
async fn ask_regenerate<W: Write>(
    editor: &mut KeyEditor<TerminalView<W>>,
    lines: &mut UnboundedReceiver<String>,
) -> bool {
    let view = editor.view_mut();
    if view.assume_yes {
        return true;
    }
    let warning = view.tr("key_dialog.warning.generate_new_key");
    view.say(&warning);
    view.prompt("key_dialog.prompt.confirm");
    match lines.recv().await {
        Some(answer) => matches!(answer.trim(), "yes" | "y"),
        None => false,
    }
}

fn say_message<W: Write>(editor: &mut KeyEditor<TerminalView<W>>, key: &str) {
    let text = i18n::message(editor.locale(), key);
    editor.view_mut().say(&text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_basic() {
        assert_eq!(parse_command("show"), Some(Command::Show));
        assert_eq!(parse_command("  ok  "), Some(Command::Ok));
        assert_eq!(parse_command("quit"), Some(Command::Cancel));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_parse_command_selection_is_one_based() {
        assert_eq!(parse_command("project 1"), Some(Command::SelectProject(Some(0))));
        assert_eq!(parse_command("identity 3"), Some(Command::SelectIdentity(Some(2))));
        assert_eq!(parse_command("project 0"), Some(Command::SelectProject(None)));
        assert_eq!(parse_command("project"), Some(Command::SelectProject(None)));
        assert_eq!(parse_command("identity x"), Some(Command::SelectIdentity(None)));
    }

    #[test]
    fn test_parse_command_keys() {
        assert_eq!(
            parse_command("public SSK@abc,def,AQACAAE"),
            Some(Command::Public("SSK@abc,def,AQACAAE".to_string()))
        );
        assert_eq!(parse_command("private"), Some(Command::Private(String::new())));
    }

    #[test]
    fn test_parse_command_unknown() {
        assert_eq!(
            parse_command("frobnicate now"),
            Some(Command::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_render_list_marks_selection() {
        let mut view = TerminalView::new(Vec::new(), "en");
        let projects = vec![
            Project {
                name: "blog".to_string(),
                request_uri: "SSK@a/".to_string(),
                insert_uri: "SSK@b/".to_string(),
            },
            Project {
                name: "wiki".to_string(),
                request_uri: "SSK@c/".to_string(),
                insert_uri: "SSK@d/".to_string(),
            },
        ];
        view.render_projects(&projects, Some(1));

        let output = String::from_utf8(view.output().clone()).unwrap();
        assert!(output.contains("  [1] blog"));
        assert!(output.contains(" *[2] wiki"));
    }

    #[test]
    fn test_regenerate_answer_is_used_once() {
        let mut view = TerminalView::new(Vec::new(), "en");
        view.regenerate_answer = Some(true);
        assert!(view.confirm_regenerate());
        assert!(!view.confirm_regenerate());
    }

    #[test]
    fn test_assume_yes_without_answer() {
        let mut view = TerminalView::new(Vec::new(), "en").with_assume_yes(true);
        assert!(view.confirm_regenerate());
        assert!(view.output().is_empty());
    }

    #[tokio::test]
    async fn test_line_reader_closes_at_end_of_input() {
        let mut lines = spawn_line_reader(std::io::Cursor::new("show\r\nok\n"));
        assert_eq!(lines.recv().await.as_deref(), Some("show"));
        assert_eq!(lines.recv().await.as_deref(), Some("ok"));
        assert_eq!(lines.recv().await, None);
    }
}

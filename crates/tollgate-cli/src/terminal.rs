//! Interactive terminal console

use std::io::Write;
use std::time::Duration;

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use tollgate_core::{AgentMessage, Console, Error, Notice, Result};

/// Tool output shown inline is cut to this many characters
const PREVIEW_CHARS: usize = 200;

/// Console backed by a line editor on stdin/stdout
pub struct TerminalConsole {
    editor: DefaultEditor,
    spinner: Option<ProgressBar>,
    /// Streamed text left the cursor mid-line
    mid_line: bool,
}

impl TerminalConsole {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| Error::Console(e.to_string()))?;
        Ok(Self {
            editor,
            spinner: None,
            mid_line: false,
        })
    }

    fn end_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }

    fn start_spinner(&mut self, message: &'static str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
            spinner.set_style(spinner_style);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn show_message(&mut self, message: &AgentMessage) {
        match message {
            AgentMessage::Assistant { content, tool_calls } => {
                if !content.trim().is_empty() {
                    println!("{}: {}", style("Assistant").bold().green(), content);
                }
                for name in tool_calls {
                    println!("  {} {}", style("[Calling:").dim(), style(format!("{}]", name)).yellow());
                }
            }
            AgentMessage::Tool { name, content, success } => {
                if *success {
                    println!("  {} {}", style("✓").green(), style(format!("{} completed", name)).dim());
                } else {
                    println!("  {} {}", style("✗").red(), style(format!("{} failed", name)).dim());
                }
                let shown = preview(content, PREVIEW_CHARS);
                if !shown.is_empty() {
                    println!("    {}", style(shown).dim());
                }
            }
        }
    }
}

/// First line of `text`, cut to `max` characters
fn preview(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or_default().trim();
    if first.chars().count() <= max && !text.trim().contains('\n') {
        return first.to_string();
    }
    let cut: String = first.chars().take(max).collect();
    format!("{}...", cut)
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.end_line();
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(Error::Console(e.to_string())),
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.end_line();
        self.stop_spinner();
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| Error::Console(e.to_string()))
    }

    fn show(&mut self, notice: Notice<'_>) {
        if !matches!(notice, Notice::Delta(_)) {
            self.end_line();
        }

        match notice {
            Notice::Welcome => {
                println!("{}", style("Welcome to the chatbot! Type 'exit' to quit.").green());
            }
            Notice::Goodbye => {
                self.stop_spinner();
                println!("{}", style("Bye...").red());
            }
            Notice::Delta(text) => {
                if !self.mid_line {
                    print!("{}: ", style("Assistant").bold().green());
                    self.mid_line = true;
                }
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
            Notice::Message(message) => self.show_message(message),
            Notice::AuthorizationRequired { tool_name, url } => {
                println!(
                    "{} {}",
                    style("Authorization required for").yellow(),
                    style(tool_name).bold()
                );
                println!("  Please authorize in your browser: {}", style(url).cyan().underlined());
            }
            Notice::AwaitingAuthorization => {
                self.start_spinner("Waiting for you to complete authorization...");
            }
            Notice::AuthorizationGranted => {
                self.stop_spinner();
                println!("{}", style("Authorization granted. Resuming...").green());
            }
            Notice::AuthorizationFailed { error } => {
                self.stop_spinner();
                eprintln!("{}", style(format!("Authorization failed: {}", error)).red());
            }
            Notice::ApprovalRequired { tool_name, input } => {
                println!(
                    "{} {}",
                    style("Approval required for").yellow(),
                    style(tool_name).bold()
                );
                let args = serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string());
                for line in args.lines() {
                    println!("  {}", style(line).dim());
                }
            }
            Notice::UnsupportedInterruption => {
                println!("{}", style("Skipped an unsupported interruption (denied).").yellow());
            }
            Notice::TurnFailed { error } => {
                self.stop_spinner();
                eprintln!("{}", style(format!("Error: {}", error)).red());
                eprintln!("{}", style("You can try again.").dim());
            }
        }
    }
}

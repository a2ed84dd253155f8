use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, EditMode, Editor};

/// What one prompt read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Line(String),
    /// Ctrl-C at the prompt
    Interrupted,
    /// Ctrl-D or closed input
    Eof,
}

/// Interactive line source for the session loop
pub trait LineReader {
    /// Show `prompt` with `prefill` already typed after it
    fn read_line(&mut self, prompt: &str, prefill: &str) -> Result<PromptEvent>;

    /// Make `line` available to up-arrow recall
    fn add_history(&mut self, _line: &str) {}
}

/// rustyline-backed prompt
pub struct TerminalPrompt {
    editor: Editor<(), DefaultHistory>,
}

impl TerminalPrompt {
    /// Create the editor and seed its recall list, oldest first
    pub fn new(recall: &[String]) -> Result<Self> {
        let config = Config::builder()
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(config)?;

        for line in recall {
            let _ = editor.add_history_entry(line.as_str());
        }

        Ok(Self { editor })
    }
}

impl LineReader for TerminalPrompt {
    fn read_line(&mut self, prompt: &str, prefill: &str) -> Result<PromptEvent> {
        let editor = &mut self.editor;
        let result = tokio::task::block_in_place(|| {
            if prefill.is_empty() {
                editor.readline(prompt)
            } else {
                editor.readline_with_initial(prompt, (prefill, ""))
            }
        });
        to_event(result)
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}

fn to_event(result: rustyline::Result<String>) -> Result<PromptEvent> {
    match result {
        Ok(line) => Ok(PromptEvent::Line(line)),
        Err(ReadlineError::Interrupted) => Ok(PromptEvent::Interrupted),
        Err(ReadlineError::Eof) => Ok(PromptEvent::Eof),
        Err(e) => Err(e.into()),
    }
}

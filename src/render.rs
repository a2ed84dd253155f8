use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use crate::executor::CommandResult;

pub const AGENT_HANDLE: &str = "webwright";

/// Print captured output the way the command would have shown it
pub fn print_result(result: &CommandResult) {
    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
        let _ = std::io::stdout().flush();
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr.red());
        if !result.stderr.ends_with('\n') {
            eprintln!();
        }
    }
}

/// Comment lines of a translation, shown before anything runs
pub fn translation_comments(translation: &str) -> Vec<&str> {
    translation
        .lines()
        .filter(|line| line.trim().starts_with('#'))
        .collect()
}

pub fn display_translation(translation: &str) {
    for line in translation_comments(translation) {
        println!("{}", line.cyan());
    }
}

pub fn staged_notice() -> String {
    format!("[{} prepared command]", AGENT_HANDLE)
}

/// Echo a command as if it had been typed at the prompt
pub fn print_agent_command(prompt: &str, command: &str, staged: bool) {
    if staged {
        println!("{}", staged_notice().cyan());
    }
    println!("{}{}", prompt.green().bold(), command.yellow());
    if staged {
        println!("{}", "Press Enter to run or edit the prepared command.".cyan());
    }
}

pub fn print_welcome() {
    println!("{}", "Webwright Shell - The Ghost in Your Shell 👻".green().bold());
    println!(
        "Type {} to switch between shell/nl/ai modes, {} to quit",
        "'mode'".yellow(),
        "'exit'".yellow()
    );
}

pub fn print_goodbye() {
    println!("{}", "Goodbye! 👻".green());
}

/// Spinner shown while a translation is in flight; cleared on drop
pub struct TranslationSpinner {
    bar: ProgressBar,
}

impl TranslationSpinner {
    pub fn start() -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner:.cyan} {msg}")?,
        );
        bar.set_message("Translating...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }
}

impl Drop for TranslationSpinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::executor::CommandResult;

/// Advisory display mode. Classification never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShellMode {
    Shell,
    #[default]
    Nl,
    Ai,
}

impl ShellMode {
    pub const ALL: [ShellMode; 3] = [ShellMode::Shell, ShellMode::Nl, ShellMode::Ai];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShellMode::Shell => "shell",
            ShellMode::Nl => "nl",
            ShellMode::Ai => "ai",
        }
    }

    /// Symbol shown at the end of the prompt
    pub fn indicator(&self) -> &'static str {
        match self {
            ShellMode::Shell | ShellMode::Nl => "$",
            ShellMode::Ai => "🤖 >",
        }
    }
}

impl fmt::Display for ShellMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShellMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shell" => Ok(ShellMode::Shell),
            "nl" => Ok(ShellMode::Nl),
            "ai" => Ok(ShellMode::Ai),
            other => Err(other.to_string()),
        }
    }
}

/// The part of the session the executor is allowed to touch
#[derive(Debug, Clone)]
pub struct ShellEnv {
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
    pub mode: ShellMode,
}

impl ShellEnv {
    pub fn new(cwd: PathBuf, env: BTreeMap<String, String>) -> Self {
        Self {
            cwd,
            env,
            mode: ShellMode::default(),
        }
    }

    /// Snapshot of the current process directory and environment
    pub fn from_process() -> Self {
        let cwd = std::env::current_dir()
            .or_else(|_| dirs::home_dir().ok_or(()))
            .unwrap_or_else(|_| PathBuf::from("/"));
        Self::new(cwd, std::env::vars().collect())
    }
}

/// Snapshot of the most recently completed execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastExecution {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
}

/// Mutable state of one interactive session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub shell: ShellEnv,
    pub history: Vec<String>,
    pub last: LastExecution,
    pub pending_commands: VecDeque<String>,
    pub prompt_prefill: String,
}

impl SessionState {
    pub fn new(shell: ShellEnv) -> Self {
        Self {
            shell,
            history: Vec::new(),
            last: LastExecution::default(),
            pending_commands: VecDeque::new(),
            prompt_prefill: String::new(),
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.shell.cwd
    }

    pub fn add_to_history(&mut self, input: &str) {
        self.history.push(input.to_string());
    }

    /// Most recent history entries, oldest first
    pub fn recent_history(&self, count: usize) -> &[String] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    pub fn record_result(&mut self, result: &CommandResult) {
        self.last = LastExecution {
            command: result.command.clone(),
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            return_code: result.return_code,
        };
    }

    /// Hands out the prefill for the next prompt and clears it
    pub fn take_prefill(&mut self) -> String {
        std::mem::take(&mut self.prompt_prefill)
    }

    pub fn get_prompt(&self, username: &str, api: &str, model: &str) -> String {
        format!(
            "{}@{}/{} {} {} ",
            username,
            api,
            model,
            display_path(&self.shell.cwd),
            self.shell.mode.indicator()
        )
    }
}

/// Render a path with the home directory collapsed to `~`
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~{}{}", std::path::MAIN_SEPARATOR, rest.display());
        }
    }
    path.display().to_string()
}

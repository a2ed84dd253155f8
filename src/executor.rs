use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::quoting::split_words;
use crate::state::{ShellEnv, ShellMode};

/// Return code reported when an external command exceeds its time budget
pub const TIMEOUT_RETURN_CODE: i32 = 124;

/// Default wall-clock budget for one external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Interpreter names a translator sometimes emits on a line of their own
const SHELL_INTERPRETERS: [&str; 6] = ["cmd", "bash", "sh", "powershell", "pwsh", "zsh"];

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub command: String,
}

impl CommandResult {
    pub fn new(
        return_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            return_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            command: command.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.return_code == 0
    }
}

/// What the session loop should do after an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Completed(CommandResult),
    /// Nothing to run: blank, a comment, or a bare interpreter name
    Skipped,
    /// `exit` was requested with this code
    Exit(i32),
}

/// Captured output of an external process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("command timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Spawn(#[from] std::io::Error),
}

/// Runs a command line through the platform's command interpreter
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// Local execution through `sh -c` (or `cmd /C` on Windows)
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell_command() -> (&'static str, &'static str) {
        if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("/bin/sh", "-c")
        }
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let (shell, shell_arg) = Self::shell_command();

        let child = Command::new(shell)
            .arg(shell_arg)
            .arg(command)
            .current_dir(cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, child).await {
            Ok(output) => output?,
            Err(_) => return Err(ProcessError::TimedOut(timeout)),
        };

        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Commands interpreted by the shell itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
    Export,
    Exit,
    Mode,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "pwd" => Some(Builtin::Pwd),
            "export" => Some(Builtin::Export),
            "exit" => Some(Builtin::Exit),
            "mode" => Some(Builtin::Mode),
            _ => None,
        }
    }
}

/// Executes commands against a session's directory and environment
pub struct ShellExecutor {
    runner: Box<dyn ProcessRunner>,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(runner: Box<dyn ProcessRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one command line. Failures come back as a non-zero
    /// `CommandResult`, never as an error.
    pub async fn execute(&self, shell: &mut ShellEnv, command: &str) -> ExecOutcome {
        let command = command.trim();

        if command.is_empty() || command.starts_with('#') {
            return ExecOutcome::Skipped;
        }

        let lowered = command.to_lowercase();
        if SHELL_INTERPRETERS.contains(&lowered.as_str()) {
            return ExecOutcome::Skipped;
        }

        let words = split_words(command);
        if let Some(builtin) = words.first().and_then(|w| Builtin::from_name(w)) {
            return run_builtin(builtin, shell, &words[1..]);
        }

        ExecOutcome::Completed(self.run_external(shell, command).await)
    }

    async fn run_external(&self, shell: &ShellEnv, command: &str) -> CommandResult {
        match self
            .runner
            .run(command, &shell.cwd, &shell.env, self.timeout)
            .await
        {
            Ok(output) => CommandResult::new(output.exit_code, output.stdout, output.stderr, command),
            Err(ProcessError::TimedOut(limit)) => CommandResult::new(
                TIMEOUT_RETURN_CODE,
                "",
                format!("Command timed out after {}", describe_duration(limit)),
                command,
            ),
            Err(e) => CommandResult::new(1, "", format!("Execution error: {}", e), command),
        }
    }
}

fn run_builtin(builtin: Builtin, shell: &mut ShellEnv, args: &[String]) -> ExecOutcome {
    match builtin {
        Builtin::Cd => ExecOutcome::Completed(builtin_cd(shell, args)),
        Builtin::Pwd => ExecOutcome::Completed(CommandResult::new(
            0,
            format!("{}\n", shell.cwd.display()),
            "",
            "pwd",
        )),
        Builtin::Export => ExecOutcome::Completed(builtin_export(shell, args)),
        Builtin::Exit => ExecOutcome::Exit(args.first().map_or(0, |arg| exit_code(arg))),
        Builtin::Mode => ExecOutcome::Completed(builtin_mode(shell, args)),
    }
}

/// Status for `exit <arg>`: an all-digit argument reduced to 8 bits, anything else 0
fn exit_code(arg: &str) -> i32 {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    arg.bytes()
        .fold(0, |status, digit| (status * 10 + i32::from(digit - b'0')) % 256)
}

fn builtin_cd(shell: &mut ShellEnv, args: &[String]) -> CommandResult {
    let shown = args.first().map(String::as_str).unwrap_or("~");
    let command = format!("cd {}", shown);
    let target = resolve_directory(&shell.cwd, args.first().map(String::as_str));

    if target.is_dir() {
        shell.cwd = target;
        CommandResult::new(0, "", "", command)
    } else {
        CommandResult::new(
            1,
            "",
            format!("cd: {}: No such directory\n", target.display()),
            command,
        )
    }
}

fn builtin_export(shell: &mut ShellEnv, args: &[String]) -> CommandResult {
    if args.is_empty() {
        let listing: String = shell
            .env
            .iter()
            .map(|(key, value)| format!("{}={}\n", key, value))
            .collect();
        return CommandResult::new(0, listing, "", "export");
    }

    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            if key.is_empty() {
                continue;
            }
            shell.env.insert(key.to_string(), value.to_string());
            std::env::set_var(key, value);
        }
    }

    CommandResult::new(0, "", "", format!("export {}", args.join(" ")))
}

fn builtin_mode(shell: &mut ShellEnv, args: &[String]) -> CommandResult {
    let Some(requested) = args.first() else {
        let available: Vec<&str> = ShellMode::ALL.iter().map(ShellMode::as_str).collect();
        return CommandResult::new(
            0,
            format!(
                "Current mode: {}\nAvailable: {}\n",
                shell.mode,
                available.join(", ")
            ),
            "",
            "mode",
        );
    };

    let requested = requested.to_lowercase();
    match requested.parse::<ShellMode>() {
        Ok(mode) => {
            shell.mode = mode;
            CommandResult::new(
                0,
                format!("Switched to {} mode\n", mode),
                "",
                format!("mode {}", requested),
            )
        }
        Err(_) => CommandResult::new(
            1,
            "",
            format!("Invalid mode: {}. Use: shell, nl, or ai\n", requested),
            format!("mode {}", requested),
        ),
    }
}

/// Resolve a `cd` argument to an absolute, lexically normalized path
pub fn resolve_directory(cwd: &Path, arg: Option<&str>) -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));

    let expanded = match arg {
        None | Some("~") => home,
        Some(path) => match path.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(path),
        },
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    normalize(&absolute)
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn describe_duration(limit: Duration) -> String {
    let secs = limit.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        format!("{} seconds", secs)
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

static FILE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\S+)").expect("file reference pattern is valid"));

const CLIPBOARD_MARKERS: [&str; 2] = ["{clipboard}", "{clip}"];

/// Piped stdin can only be drained once per process
static STDIN_CONSUMED: AtomicBool = AtomicBool::new(false);

/// Input with its context references resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedInput {
    /// Input with `@file` references and clipboard markers removed
    pub command: String,
    /// Context blobs, in the order they were gathered
    pub context: Vec<String>,
    /// Paths that were read successfully, relative to the working directory
    pub files: Vec<String>,
}

/// Sources of context outside the typed line
pub trait ExternalInputs: Send {
    /// Content piped into the process, handed out at most once
    fn piped_stdin(&mut self) -> Option<String>;

    fn clipboard(&mut self) -> Option<String>;
}

/// Reads the real stdin and system clipboard
pub struct SystemInputs;

impl SystemInputs {
    pub fn new() -> Self {
        Self
    }

    fn clipboard_command() -> Option<(&'static str, &'static [&'static str])> {
        if cfg!(target_os = "macos") {
            Some(("pbpaste", &[]))
        } else if cfg!(target_os = "windows") {
            Some(("powershell", &["-NoProfile", "-Command", "Get-Clipboard"]))
        } else if cfg!(target_os = "linux") {
            Some(("xclip", &["-selection", "clipboard", "-o"]))
        } else {
            None
        }
    }
}

impl Default for SystemInputs {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalInputs for SystemInputs {
    fn piped_stdin(&mut self) -> Option<String> {
        let stdin = std::io::stdin();
        if stdin.is_terminal() || STDIN_CONSUMED.swap(true, Ordering::SeqCst) {
            return None;
        }

        let mut bytes = Vec::new();
        stdin.lock().read_to_end(&mut bytes).ok()?;
        Some(String::from_utf8_lossy(&bytes).to_string())
    }

    fn clipboard(&mut self) -> Option<String> {
        if let Ok(text) = arboard::Clipboard::new().and_then(|mut c| c.get_text()) {
            return Some(text);
        }

        let (program, args) = Self::clipboard_command()?;
        let output = Command::new(program).args(args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Resolves `@file`, `@glob`, `{clipboard}` and piped stdin into prompt context
pub struct InputBuffer {
    inputs: Box<dyn ExternalInputs>,
}

impl InputBuffer {
    pub fn new(inputs: Box<dyn ExternalInputs>) -> Self {
        Self { inputs }
    }

    /// Gather context for one line of input. Never fails: problems become
    /// `# Error` blobs in the context.
    pub fn process_input(&mut self, text: &str, cwd: &Path) -> BufferedInput {
        let mut buffered = BufferedInput::default();

        if let Some(piped) = self.inputs.piped_stdin() {
            if !piped.is_empty() {
                buffered.context.push(format!("# Stdin:\n{}", piped));
            }
        }

        for capture in FILE_REFERENCE.captures_iter(text) {
            let reference = &capture[1];
            if reference.contains('*') {
                self.read_glob(reference, cwd, &mut buffered);
            } else {
                read_reference(&resolve(reference, cwd), cwd, &mut buffered);
            }
        }

        if CLIPBOARD_MARKERS.iter().any(|marker| text.contains(marker)) {
            match self.inputs.clipboard().filter(|content| !content.is_empty()) {
                Some(content) => buffered.context.push(format!("# Clipboard:\n{}\n", content)),
                None => buffered
                    .context
                    .push("# Error: Clipboard is empty or unavailable\n".to_string()),
            }
        }

        let mut command = FILE_REFERENCE.replace_all(text, "").to_string();
        for marker in CLIPBOARD_MARKERS {
            command = command.replace(marker, "");
        }
        buffered.command = command.trim().to_string();

        buffered
    }

    fn read_glob(&self, reference: &str, cwd: &Path, buffered: &mut BufferedInput) {
        let pattern = resolve(reference, cwd);
        let paths = match glob::glob(&pattern.to_string_lossy()) {
            Ok(paths) => paths,
            Err(e) => {
                buffered
                    .context
                    .push(format!("# Error: Invalid pattern {}: {}\n", reference, e));
                return;
            }
        };

        let mut matched = 0;
        for path in paths.flatten().filter(|p| p.is_file()) {
            matched += 1;
            read_reference(&path, cwd, buffered);
        }

        if matched == 0 {
            buffered
                .context
                .push(format!("# Error: No files match pattern: {}\n", reference));
        }
    }
}

fn resolve(reference: &str, cwd: &Path) -> PathBuf {
    let path = PathBuf::from(reference);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn read_reference(path: &Path, cwd: &Path, buffered: &mut BufferedInput) {
    if !path.is_file() {
        buffered
            .context
            .push(format!("# Error: File not found: {}\n", path.display()));
        return;
    }

    match std::fs::read(path) {
        Ok(bytes) => {
            let relative = path
                .strip_prefix(cwd)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| path.display().to_string());
            buffered.context.push(format!(
                "# File: {}\n{}\n",
                relative,
                String::from_utf8_lossy(&bytes)
            ));
            buffered.files.push(relative);
        }
        Err(e) => buffered
            .context
            .push(format!("# Error reading {}: {}\n", path.display(), e)),
    }
}

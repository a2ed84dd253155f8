use anyhow::Result;

use crate::os_context::PlatformInfo;
use crate::providers::{ChatRequest, LanguageModel};
use crate::state::SessionState;

pub const SYSTEM_PROMPT: &str =
    "You are a shell command translator. Output only shell commands and comments.";

const TRANSLATION_PROMPT: &str = r#"You are a shell command translator. Convert natural language requests into shell commands.

Rules:
1. Output ONLY shell commands and comments (valid shell syntax)
2. Use comments (starting with #) to explain what you're doing
3. Generate actual executable commands that will run deterministically
4. Use the user's operating system conventions (PowerShell/Windows syntax when on Windows, POSIX shell otherwise)
5. Be concise - prefer single commands over complex scripts
6. If the request is ambiguous, make reasonable assumptions and note them in comments
7. For destructive operations, add a comment warning and, when appropriate, suggest user confirmation
8. If prior command output indicates an error, address it or adjust the strategy before suggesting new commands
9. NEVER output shell interpreter commands (cmd, bash, sh, powershell) - just output the actual commands to run

Examples:

Input: "show me all python files"
Output:
# Listing all Python files in current directory
ls *.py

Input: "what's the git status"
Output:
# Checking git repository status
git status

Input: "find large files over 100MB"
Output:
# Finding files larger than 100MB in current directory
find . -type f -size +100M

Input: "commit these changes with message fix bug"
Output:
# Staging all changes and committing
git add -A
git commit -m "fix bug"

Windows Example:
Input: "show me all python files" (on Windows)
Output:
# Listing all Python files in current directory
dir *.py

WRONG (don't do this):
cmd
dir *.py

Now translate this request:"#;

/// Info strings that mark a fenced block as shell code
const SHELL_FENCE_TAGS: [&str; 10] = [
    "bash", "sh", "shell", "zsh", "console", "powershell", "pwsh", "ps1", "cmd", "bat",
];

const RECENT_COMMAND_LIMIT: usize = 3;
const OUTPUT_TAIL_CHARS: usize = 2000;

/// The previous execution as shown to the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousCommand {
    pub command: String,
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Everything the translator may mention besides the request itself
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    pub cwd: Option<String>,
    pub recent_commands: Vec<String>,
    pub platform: Option<PlatformInfo>,
    pub previous: Option<PreviousCommand>,
    pub files_content: Vec<String>,
}

impl TranslationContext {
    /// Snapshot the parts of the session a translation needs
    pub fn from_session(
        state: &SessionState,
        platform: &PlatformInfo,
        files_content: Vec<String>,
    ) -> Self {
        let previous = (!state.last.command.is_empty()).then(|| PreviousCommand {
            command: state.last.command.clone(),
            return_code: state.last.return_code,
            stdout: tail_chars(&state.last.stdout, OUTPUT_TAIL_CHARS).to_string(),
            stderr: tail_chars(&state.last.stderr, OUTPUT_TAIL_CHARS).to_string(),
        });

        Self {
            cwd: Some(state.cwd().display().to_string()),
            recent_commands: state.recent_history(5).to_vec(),
            platform: Some(platform.clone()),
            previous,
            files_content,
        }
    }
}

/// Turns plain-English requests into shell text
pub struct NlTranslator {
    model: Box<dyn LanguageModel>,
}

impl NlTranslator {
    pub fn new(model: Box<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Translate one request into shell commands and `#` comments
    pub async fn translate(&mut self, request: &str, context: &TranslationContext) -> Result<String> {
        let prompt = build_prompt(request, context);
        let chat = ChatRequest::single(SYSTEM_PROMPT, prompt);

        let reply = self.model.complete(&chat).await?;
        Ok(clean_output(reply.trim()))
    }
}

/// Assemble the full prompt text sent as the single user message
pub fn build_prompt(request: &str, context: &TranslationContext) -> String {
    let mut prompt = String::from(TRANSLATION_PROMPT);

    if let Some(cwd) = context.cwd.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n\nCurrent directory: {}", cwd));
    }

    if !context.recent_commands.is_empty() {
        let start = context
            .recent_commands
            .len()
            .saturating_sub(RECENT_COMMAND_LIMIT);
        prompt.push_str("\n\nRecent commands:\n");
        prompt.push_str(&context.recent_commands[start..].join("\n"));
    }

    if let Some(platform) = &context.platform {
        prompt.push_str("\n\nEnvironment:\n");
        prompt.push_str(&format!("- Platform: {}\n", platform.system));
        prompt.push_str(&format!("- os.name: {}\n", platform.os_family));
        prompt.push_str(&format!("- Shell: {}\n", platform.shell_descriptor()));
    }

    if let Some(previous) = &context.previous {
        prompt.push_str(&format!("\n\nPrevious command: {}", previous.command));
        prompt.push_str(&format!("\nExit code: {}", previous.return_code));
        if !previous.stdout.is_empty() {
            prompt.push_str(&format!("\nStdout:\n{}", previous.stdout));
        }
        if !previous.stderr.is_empty() {
            prompt.push_str(&format!("\nStderr:\n{}", previous.stderr));
        }
    }

    if !context.files_content.is_empty() {
        prompt.push_str("\n\nFile contents referenced:\n");
        for blob in &context.files_content {
            prompt.push_str(&format!("\n{}\n", blob));
        }
    }

    prompt.push_str(&format!("\n\nUser request: {}", request));
    prompt
}

/// Pull shell text out of a model reply that may be wrapped in markdown fences
pub fn clean_output(text: &str) -> String {
    if !text.contains("```") {
        return text.trim().to_string();
    }

    // odd-indexed segments sit between a pair of fences
    let blocks: Vec<&str> = text.split("```").skip(1).step_by(2).collect();

    let chosen = blocks
        .iter()
        .find(|block| is_shell_tag(info_string(block)))
        .or_else(|| blocks.first())
        .map(|block| strip_info_line(block));

    match chosen {
        Some(code) => code.trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn info_string(block: &str) -> &str {
    match block.split_once('\n') {
        Some((first, _)) => first.trim(),
        None => "",
    }
}

fn is_shell_tag(info: &str) -> bool {
    let tag = info.split_whitespace().next().unwrap_or("").to_lowercase();
    SHELL_FENCE_TAGS.contains(&tag.as_str())
}

fn strip_info_line(block: &str) -> &str {
    match block.split_once('\n') {
        Some((_, body)) => body,
        None => block,
    }
}

/// Last `max` characters of `text`, cut on a char boundary
pub fn tail_chars(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    match text.char_indices().nth(count - max) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::quoting::first_token;

/// Classification of one line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    ShellCommand,
    NaturalLanguage,
    AiRequest,
    Comment,
    Empty,
}

/// Prefix that routes a request to the AI assistant
pub const AI_PREFIX: &str = "ai:";

const SHELL_OPERATORS: [&str; 7] = ["|", ">", "<", "&&", "||", ";", ">>"];

static SHELL_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut commands: HashSet<&'static str> = [
        "ls", "cd", "pwd", "cat", "echo", "grep", "find", "git", "python", "node", "npm", "pip",
        "docker", "kubectl", "mkdir", "rm", "cp", "mv", "touch", "chmod", "chown", "ps", "kill",
        "top", "df", "du", "tar", "gzip", "curl", "wget", "export", "mode", "exit",
    ]
    .into_iter()
    .collect();

    if cfg!(windows) {
        commands.extend(["dir", "type", "cls", "copy", "del"]);
    }

    commands
});

/// Classify raw input. Callers must strip `@file` and clipboard markers first.
pub fn classify(input: &str) -> InputType {
    let stripped = input.trim();

    if stripped.is_empty() {
        return InputType::Empty;
    }
    if stripped.starts_with('#') {
        return InputType::Comment;
    }
    if has_ai_prefix(stripped) {
        return InputType::AiRequest;
    }
    if is_shell_command(stripped) {
        return InputType::ShellCommand;
    }

    InputType::NaturalLanguage
}

/// Body of an `ai: <request>` line; other input is returned unchanged
pub fn extract_ai_request(input: &str) -> &str {
    let stripped = input.trim();
    if has_ai_prefix(stripped) {
        stripped[AI_PREFIX.len()..].trim()
    } else {
        input
    }
}

fn has_ai_prefix(text: &str) -> bool {
    text.get(..AI_PREFIX.len())
        .map(|head| head.eq_ignore_ascii_case(AI_PREFIX))
        .unwrap_or(false)
}

fn is_shell_command(text: &str) -> bool {
    let first_word = first_token(text);

    if SHELL_COMMANDS.contains(first_word) {
        return true;
    }

    if SHELL_OPERATORS.iter().any(|op| text.contains(op)) {
        return true;
    }

    if first_word.starts_with("./") || first_word.starts_with('/') {
        return true;
    }

    // NAME=value; a token never holds whitespace
    first_word.contains('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_comment() {
        assert_eq!(classify(""), InputType::Empty);
        assert_eq!(classify("   \t  "), InputType::Empty);
        assert_eq!(classify("# just a note"), InputType::Comment);
        assert_eq!(classify("   #indented note"), InputType::Comment);
        // comment wins over operators
        assert_eq!(classify("# a | b"), InputType::Comment);
    }

    #[test]
    fn test_ai_prefix() {
        assert_eq!(classify("ai: refactor this module"), InputType::AiRequest);
        assert_eq!(classify("AI: foo"), InputType::AiRequest);
        assert_eq!(classify("  ai:foo  "), InputType::AiRequest);
        assert_eq!(extract_ai_request("ai: foo"), "foo");
        assert_eq!(extract_ai_request("   Ai:   foo   "), "foo");
        assert_eq!(extract_ai_request("list files"), "list files");
    }

    #[test]
    fn test_known_commands() {
        for input in [
            "ls -la",
            "git status",
            "cd ..",
            "export FOO=bar",
            "mode ai",
            "docker ps",
            "exit",
            "exit 2",
        ] {
            assert_eq!(classify(input), InputType::ShellCommand, "{}", input);
        }
        assert_eq!(classify("git LOG --ONELINE"), InputType::ShellCommand);
    }

    #[test]
    fn test_operators() {
        for input in [
            "show me everything | sort",
            "something > out.txt",
            "read < in.txt",
            "build && deploy",
            "try || fail",
            "first; second",
            "append >> log",
        ] {
            assert_eq!(classify(input), InputType::ShellCommand, "{}", input);
        }
    }

    #[test]
    fn test_paths_and_assignments() {
        assert_eq!(classify("./run.sh --fast"), InputType::ShellCommand);
        assert_eq!(classify("/usr/bin/env"), InputType::ShellCommand);
        assert_eq!(classify("RUST_LOG=debug cargo run"), InputType::ShellCommand);
    }

    #[test]
    fn test_natural_language() {
        assert_eq!(classify("show me all python files"), InputType::NaturalLanguage);
        assert_eq!(classify("what's the git status"), InputType::NaturalLanguage);
        assert_eq!(classify("go ahead"), InputType::NaturalLanguage);
        // "ai" without the colon is plain language
        assert_eq!(classify("ai is neat"), InputType::NaturalLanguage);
    }

    #[test]
    fn test_first_token_must_match_exactly() {
        assert_eq!(classify("lsblk devices please"), InputType::NaturalLanguage);
        assert_eq!(classify("LS"), InputType::NaturalLanguage);
    }
}

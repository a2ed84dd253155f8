/// Split a command line into words the way a POSIX shell would.
///
/// Malformed quoting (an unbalanced `"` or `'`) is not an error here: the
/// line falls back to plain whitespace splitting so callers can still
/// dispatch on the first word.
pub fn split_words(command: &str) -> Vec<String> {
    match shlex::split(command) {
        Some(words) => words,
        None => command.split_whitespace().map(str::to_string).collect(),
    }
}

/// First whitespace-delimited token of `text`, or "" for blank input
pub fn first_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_quotes() {
        assert_eq!(
            split_words(r#"git commit -m "fix the bug""#),
            vec!["git", "commit", "-m", "fix the bug"]
        );
        assert_eq!(split_words("cd 'My Documents'"), vec!["cd", "My Documents"]);
    }

    #[test]
    fn test_unbalanced_quotes_fall_back_to_whitespace() {
        assert_eq!(
            split_words(r#"python "script.py"#),
            vec!["python", "\"script.py"]
        );
    }

    #[test]
    fn test_first_token() {
        assert_eq!(first_token("  ls -la"), "ls");
        assert_eq!(first_token("   "), "");
    }
}

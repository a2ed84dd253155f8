use std::path::{Path, PathBuf};

use crate::quoting::split_words;

/// Prefixes of commands that only read state
const SAFE_PREFIXES: [&str; 12] = [
    "ls",
    "pwd",
    "cd",
    "whoami",
    "date",
    "cat",
    "echo",
    "git status",
    "git diff",
    "head",
    "tail",
    "dir",
];

/// Substrings that make a command wait for confirmation
const RISKY_KEYWORDS: [&str; 15] = [
    "rm",
    "mv",
    "chmod",
    "chown",
    "docker",
    "kubectl",
    "git push",
    "git commit",
    "pip install",
    "npm install",
    "apt",
    "brew",
    "systemctl",
    "shutdown",
    "reboot",
];

/// Decide whether a translated command may run without confirmation.
///
/// The checks are plain prefix and substring tests, so a safe prefix wins
/// even when a risky keyword appears later in the line, and a risky keyword
/// inside a longer word (`firmware`, `trmv`) still blocks.
pub fn should_autorun(command: &str, cwd: &Path) -> bool {
    let lowered = command.to_lowercase();

    if SAFE_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return true;
    }

    if RISKY_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        return false;
    }

    if lowered.starts_with("python ") || lowered.starts_with("py ") {
        return runs_local_script(command, cwd);
    }

    false
}

fn runs_local_script(command: &str, cwd: &Path) -> bool {
    let words = split_words(command);
    let Some(script) = words.get(1) else {
        return false;
    };

    let path = PathBuf::from(script);
    let path = if path.is_absolute() { path } else { cwd.join(path) };

    path.is_file() && script.ends_with(".py")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cwd() -> PathBuf {
        PathBuf::from("/")
    }

    #[test]
    fn test_read_only_commands_autorun() {
        for command in ["ls -la", "pwd", "git status", "git diff HEAD~1", "tail -f log", "ECHO hi"] {
            assert!(should_autorun(command, &cwd()), "{}", command);
        }
    }

    #[test]
    fn test_safe_prefix_beats_risky_keyword() {
        assert!(should_autorun("ls | xargs rm", &cwd()));
        assert!(should_autorun("cat notes | docker load", &cwd()));
    }

    #[test]
    fn test_risky_commands_wait() {
        for command in [
            "rm -rf /tmp/x",
            "git push origin main",
            "git commit -m x",
            "npm install left-pad",
            "sudo systemctl restart nginx",
            "kubectl delete pod web",
        ] {
            assert!(!should_autorun(command, &cwd()), "{}", command);
        }
    }

    #[test]
    fn test_risky_keyword_matches_inside_words() {
        // "apt" inside "wrapt", "rm" inside "format"
        assert!(!should_autorun("pip show wrapt", &cwd()));
        assert!(!should_autorun("format disk", &cwd()));
    }

    #[test]
    fn test_unknown_commands_wait() {
        assert!(!should_autorun("make build", &cwd()));
        assert!(!should_autorun("", &cwd()));
    }

    #[test]
    fn test_python_script_autoruns_only_when_present() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.py"), "print('hi')\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert!(should_autorun("python hello.py", dir.path()));
        assert!(should_autorun("py hello.py --verbose", dir.path()));
        assert!(!should_autorun("python missing.py", dir.path()));
        assert!(!should_autorun("python notes.txt", dir.path()));
        assert!(!should_autorun("python", dir.path()));
    }

    #[test]
    fn test_python_with_bad_quoting_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("run.py"), "").unwrap();
        // unbalanced quote on a later word still resolves the script
        assert!(should_autorun("python run.py \"open", dir.path()));
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// What the translator is told about the machine it is writing commands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Kernel family as users know it: Linux, Darwin, Windows
    pub system: String,
    /// `posix` or `nt`
    pub os_family: String,
    /// Login shell from `$SHELL` or `%ComSpec%`
    pub shell: Option<String>,
    pub architecture: String,
    /// Distribution name from `/etc/os-release`, when there is one
    pub distribution: Option<String>,
}

impl PlatformInfo {
    pub fn detect() -> Self {
        let env: BTreeMap<String, String> = std::env::vars().collect();
        Self::from_env(&env)
    }

    /// Detect using an explicit environment instead of the process one
    pub fn from_env(env: &BTreeMap<String, String>) -> Self {
        Self {
            system: system_name(std::env::consts::OS),
            os_family: if cfg!(windows) { "nt" } else { "posix" }.to_string(),
            shell: detect_shell(env),
            architecture: std::env::consts::ARCH.to_string(),
            distribution: detect_distribution(),
        }
    }

    /// Shell description for prompts
    pub fn shell_descriptor(&self) -> &str {
        self.shell.as_deref().unwrap_or("unknown shell")
    }

    /// One-line summary for the startup log
    pub fn describe(&self) -> String {
        match &self.distribution {
            Some(distribution) => format!("{} ({}, {})", self.system, distribution, self.architecture),
            None => format!("{} ({})", self.system, self.architecture),
        }
    }
}

fn system_name(os: &str) -> String {
    match os {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        other => other.to_string(),
    }
}

fn detect_shell(env: &BTreeMap<String, String>) -> Option<String> {
    ["SHELL", "ComSpec"]
        .iter()
        .filter_map(|key| env.get(*key))
        .find(|value| !value.trim().is_empty())
        .cloned()
}

fn detect_distribution() -> Option<String> {
    let os_release = fs::read_to_string("/etc/os-release").ok()?;
    parse_os_release(&os_release)
}

fn parse_os_release(contents: &str) -> Option<String> {
    let mut name = None;
    for line in contents.lines() {
        if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
            return Some(value.trim_matches('"').to_string());
        }
        if let Some(value) = line.strip_prefix("NAME=") {
            name = Some(value.trim_matches('"').to_string());
        }
    }
    name
}

//! Ctrl-C during a running command. SIGINT is process-wide, so this runs in
//! its own test binary.
#![cfg(unix)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tempfile::TempDir;

use webwright::executor::{ShellExecutor, SystemProcessRunner};
use webwright::input_buffer::{ExternalInputs, InputBuffer};
use webwright::os_context::PlatformInfo;
use webwright::providers::{ChatRequest, LanguageModel};
use webwright::shell::{PromptIdentity, Session, SessionFlow};
use webwright::state::{SessionState, ShellEnv};
use webwright::translator::NlTranslator;

struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn complete(&mut self, _request: &ChatRequest) -> Result<String> {
        Err(anyhow!("offline"))
    }
}

struct NoInputs;

impl ExternalInputs for NoInputs {
    fn piped_stdin(&mut self) -> Option<String> {
        None
    }

    fn clipboard(&mut self) -> Option<String> {
        None
    }
}

fn session(dir: &TempDir) -> Session {
    let mut env = BTreeMap::new();
    if let Ok(path) = std::env::var("PATH") {
        env.insert("PATH".to_string(), path);
    }

    Session::new(
        SessionState::new(ShellEnv::new(dir.path().to_path_buf(), env)),
        ShellExecutor::new(Box::new(SystemProcessRunner::new())),
        NlTranslator::new(Box::new(OfflineModel)),
        InputBuffer::new(Box::new(NoInputs)),
        PlatformInfo::from_env(&BTreeMap::new()),
        PromptIdentity {
            username: "ada".to_string(),
            api: "ollama".to_string(),
            model: "llama3".to_string(),
        },
        None,
    )
}

#[tokio::test]
async fn test_sigint_stops_the_command_not_the_shell() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);

    session.handle_line("echo before").await.unwrap();
    assert_eq!(session.state().last.stdout, "before\n");

    // the child signals its parent, which is this process
    let flow = session.handle_line("kill -INT $PPID; sleep 2").await.unwrap();

    assert_eq!(flow, SessionFlow::Continue);
    assert_eq!(session.state().last.command, "echo before");

    session.handle_line("echo after").await.unwrap();
    assert_eq!(session.state().last.command, "echo after");
    assert_eq!(session.state().last.stdout, "after\n");
}

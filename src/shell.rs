use anyhow::Result;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::error_handling::{display_error, display_info, display_warning, enhance_error};
use crate::executor::{Builtin, ExecOutcome, ShellExecutor};
use crate::history::HistoryLog;
use crate::input_buffer::InputBuffer;
use crate::interrupt::InterruptListener;
use crate::logging::{LogCategory, LogContext};
use crate::os_context::PlatformInfo;
use crate::parser::{classify, extract_ai_request, InputType};
use crate::prompt::{LineReader, PromptEvent};
use crate::providers::ProviderType;
use crate::quoting::first_token;
use crate::render::{
    display_translation, print_agent_command, print_goodbye, print_result, TranslationSpinner,
};
use crate::state::SessionState;
use crate::translator::{NlTranslator, TranslationContext};
use crate::triage::should_autorun;
use crate::{log_debug, log_error, log_info, log_warning};

/// Phrases that run everything still queued, skipping triage
const RERUN_PHRASES: [&str; 8] = [
    "run it",
    "run that",
    "execute it",
    "do it",
    "go ahead",
    "please run it",
    "run the command",
    "run those",
];

/// Whether the loop should read another line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    Exit(i32),
}

/// Who the prompt says is talking to which model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptIdentity {
    pub username: String,
    pub api: String,
    pub model: String,
}

impl PromptIdentity {
    /// Provider and model named by `config`. An unset `preferred_api` shows
    /// `fallback`; an unrecognized one shows "unknown".
    pub fn from_config(username: String, config: &Config, fallback: ProviderType) -> Self {
        let api = match config.preferred_api.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse::<ProviderType>().ok(),
            _ => Some(fallback),
        };

        match api {
            Some(api) => Self {
                username,
                api: api.to_string(),
                model: config.model_for(api).to_string(),
            },
            None => Self {
                username,
                api: "unknown".to_string(),
                model: "unknown".to_string(),
            },
        }
    }
}

/// Config file re-read before every prompt
struct ConfigWatch {
    path: PathBuf,
    current: Config,
    fallback_api: ProviderType,
}

/// How one command run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Ran,
    Interrupted,
    Exit(i32),
}

/// The interactive session: routes each line, owns the pending queue
pub struct Session {
    state: SessionState,
    executor: ShellExecutor,
    translator: NlTranslator,
    input_buffer: InputBuffer,
    platform: PlatformInfo,
    identity: PromptIdentity,
    history_log: Option<HistoryLog>,
    config_watch: Option<ConfigWatch>,
    interrupts: InterruptListener,
}

impl Session {
    pub fn new(
        state: SessionState,
        executor: ShellExecutor,
        translator: NlTranslator,
        input_buffer: InputBuffer,
        platform: PlatformInfo,
        identity: PromptIdentity,
        history_log: Option<HistoryLog>,
    ) -> Self {
        Self {
            state,
            executor,
            translator,
            input_buffer,
            platform,
            identity,
            history_log,
            config_watch: None,
            interrupts: InterruptListener::new(),
        }
    }

    /// Re-read `path` before each prompt so the prompt follows edits to it.
    /// `current` is the configuration the session started with.
    pub fn watch_config(mut self, path: PathBuf, current: Config, fallback_api: ProviderType) -> Self {
        self.config_watch = Some(ConfigWatch {
            path,
            current,
            fallback_api,
        });
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn prompt(&self) -> String {
        self.state.get_prompt(
            &self.identity.username,
            &self.identity.api,
            &self.identity.model,
        )
    }

    /// Read and handle lines until `exit` or end of input; returns the exit code
    pub async fn run(&mut self, reader: &mut dyn LineReader) -> Result<i32> {
        log_info!(LogCategory::Session, "Session started");
        if let Err(e) = self.interrupts.install() {
            log_warning!(
                LogCategory::Session,
                format!("Could not listen for interrupts: {}", e)
            );
        }

        loop {
            self.reload_config();
            let prompt = self.prompt();
            let prefill = self.state.take_prefill();

            let line = match reader.read_line(&prompt, &prefill)? {
                PromptEvent::Line(line) => line,
                PromptEvent::Interrupted => {
                    println!("Use 'exit' to quit");
                    continue;
                }
                PromptEvent::Eof => {
                    print_goodbye();
                    log_info!(LogCategory::Session, "Session ended at end of input");
                    return Ok(0);
                }
            };

            if !line.trim().is_empty() {
                reader.add_history(&line);
            }

            match self.handle_line(&line).await {
                Ok(SessionFlow::Continue) => {}
                Ok(SessionFlow::Exit(code)) => {
                    print_goodbye();
                    log_info!(
                        LogCategory::Session,
                        "Session ended by exit",
                        LogContext::new().with_return_code(code)
                    );
                    return Ok(code);
                }
                Err(e) => {
                    display_error(&format!("Error: {}", e));
                    log_error!(LogCategory::Session, format!("Error in shell loop: {}", e));
                }
            }
        }
    }

    /// Handle one raw line of input
    pub async fn handle_line(&mut self, line: &str) -> Result<SessionFlow> {
        if line.trim().is_empty() {
            return Ok(SessionFlow::Continue);
        }

        let buffered = self.input_buffer.process_input(line, self.state.cwd());
        let input_type = classify(&buffered.command);
        log_debug!(
            LogCategory::Session,
            format!("{:?}: {}", input_type, buffered.command)
        );

        let flow = match input_type {
            InputType::Empty | InputType::Comment => return Ok(SessionFlow::Continue),
            InputType::ShellCommand => self.handle_shell_command(&buffered.command).await,
            InputType::NaturalLanguage => {
                if is_rerun_phrase(&buffered.command) {
                    self.run_pending_commands().await
                } else {
                    self.handle_nl_translation(&buffered.command, buffered.context)
                        .await?
                }
            }
            InputType::AiRequest => {
                self.handle_ai_mode(extract_ai_request(&buffered.command));
                SessionFlow::Continue
            }
        };

        if flow == SessionFlow::Continue {
            self.record_history(line);
        }
        Ok(flow)
    }

    async fn handle_shell_command(&mut self, command: &str) -> SessionFlow {
        match self.run_command(command).await {
            Step::Ran => {}
            Step::Interrupted => return SessionFlow::Continue,
            Step::Exit(code) => return SessionFlow::Exit(code),
        }

        let accepted_staged = self
            .state
            .pending_commands
            .front()
            .is_some_and(|front| front == command);
        if accepted_staged {
            self.state.pending_commands.pop_front();
            if !self.state.pending_commands.is_empty() {
                return self.execute_translated_commands().await;
            }
        }

        SessionFlow::Continue
    }

    async fn handle_nl_translation(
        &mut self,
        request: &str,
        files_content: Vec<String>,
    ) -> Result<SessionFlow> {
        let context = TranslationContext::from_session(&self.state, &self.platform, files_content);

        self.interrupts.clear().await;
        let outcome = {
            let _spinner = TranslationSpinner::start()?;
            tokio::select! {
                result = self.translator.translate(request, &context) => Some(result),
                _ = self.interrupts.recv() => None,
            }
        };

        let translation = match outcome {
            Some(Ok(translation)) => translation,
            Some(Err(e)) => {
                enhance_error(&e).display();
                log_error!(
                    LogCategory::Translation,
                    format!("Translation error: {}", e),
                    LogContext::new().with_operation("translate").with_success(false)
                );
                return Ok(SessionFlow::Continue);
            }
            None => {
                display_warning("Translation cancelled");
                log_info!(LogCategory::Translation, "Translation cancelled by user");
                return Ok(SessionFlow::Continue);
            }
        };

        log_debug!(LogCategory::Translation, format!("translated to: {}", translation));
        display_translation(&translation);
        self.state.pending_commands = actionable_lines(&translation);
        Ok(self.execute_translated_commands().await)
    }

    /// Autorun safe commands from the front of the queue until one needs confirmation
    async fn execute_translated_commands(&mut self) -> SessionFlow {
        while let Some(command) = self.state.pending_commands.front().cloned() {
            if !should_autorun(&command, self.state.cwd()) {
                if self.state.prompt_prefill.is_empty() {
                    self.state.prompt_prefill = command.clone();
                    print_agent_command(&self.prompt(), &command, true);
                }
                return SessionFlow::Continue;
            }

            print_agent_command(&self.prompt(), &command, false);
            match self.run_command(&command).await {
                Step::Ran => {}
                // left queued so a rerun phrase can retry it
                Step::Interrupted => return SessionFlow::Continue,
                Step::Exit(code) => {
                    self.state.pending_commands.pop_front();
                    return SessionFlow::Exit(code);
                }
            }
            self.state.pending_commands.pop_front();
        }

        SessionFlow::Continue
    }

    /// Run the whole queue without triage
    async fn run_pending_commands(&mut self) -> SessionFlow {
        if self.state.pending_commands.is_empty() {
            display_info("Nothing queued to run.");
            return SessionFlow::Continue;
        }

        self.state.prompt_prefill.clear();

        while let Some(command) = self.state.pending_commands.pop_front() {
            print_agent_command(&self.prompt(), &command, false);
            match self.run_command(&command).await {
                Step::Ran => {}
                Step::Interrupted => return SessionFlow::Continue,
                Step::Exit(code) => return SessionFlow::Exit(code),
            }
        }

        SessionFlow::Continue
    }

    fn handle_ai_mode(&self, request: &str) {
        display_info("AI mode not yet implemented - will support complex multi-step tasks");
        println!("Request: {}", request);
    }

    /// Execute, print and record one command. Ctrl-C abandons it and kills the child.
    async fn run_command(&mut self, command: &str) -> Step {
        let started = Instant::now();

        self.interrupts.clear().await;
        let outcome = tokio::select! {
            outcome = self.executor.execute(&mut self.state.shell, command) => outcome,
            _ = self.interrupts.recv() => {
                println!();
                display_warning("Command interrupted");
                log_info!(LogCategory::Execution, "Command interrupted by user");
                return Step::Interrupted;
            }
        };

        match outcome {
            ExecOutcome::Completed(result) => {
                print_result(&result);
                self.state.record_result(&result);

                let builtin = Builtin::from_name(first_token(command)).is_some();
                if let Ok(logger) = crate::logging::get_logger() {
                    if let Ok(guard) = logger.lock() {
                        let _ = guard.log_execution(
                            builtin,
                            result.return_code,
                            started.elapsed().as_millis() as u64,
                        );
                    }
                }
                Step::Ran
            }
            ExecOutcome::Skipped => Step::Ran,
            ExecOutcome::Exit(code) => Step::Exit(code),
        }
    }

    /// Pick up edits to the config file. An unreadable or invalid file keeps
    /// the previous settings.
    fn reload_config(&mut self) {
        let Some(watch) = self.config_watch.as_mut() else {
            return;
        };

        let fresh = match Config::reload_from(&watch.path) {
            Ok(fresh) => fresh,
            Err(e) => {
                log_debug!(
                    LogCategory::Configuration,
                    format!("Keeping previous configuration: {}", e)
                );
                return;
            }
        };
        if fresh == watch.current {
            return;
        }

        if let Ok(logger) = crate::logging::get_logger() {
            if let Ok(guard) = logger.lock() {
                for (setting, old, new) in fresh.changes_from(&watch.current) {
                    let _ = guard.log_config_change(&setting, &old, &new);
                }
            }
        }

        self.identity = PromptIdentity::from_config(
            self.identity.username.clone(),
            &fresh,
            watch.fallback_api,
        );
        watch.current = fresh;
    }

    fn record_history(&mut self, line: &str) {
        self.state.add_to_history(line);
        if let Some(log) = &self.history_log {
            if let Err(e) = log.append(line) {
                log_warning!(LogCategory::Session, format!("Could not write history: {}", e));
            }
        }
    }
}

/// Non-blank, non-comment lines of a translation, trimmed and in order
pub fn actionable_lines(translation: &str) -> VecDeque<String> {
    translation
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn is_rerun_phrase(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    RERUN_PHRASES.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::RecordingRunner;
    use crate::input_buffer::tests::FixedInputs;
    use crate::prompt::tests::ScriptedReader;
    use crate::state::ShellEnv;
    use crate::translator::tests::ScriptedModel;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Harness {
        session: Session,
        runner: RecordingRunner,
        model: ScriptedModel,
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let runner = RecordingRunner::default();
            let model = ScriptedModel::default();

            let state = SessionState::new(ShellEnv::new(dir.path().to_path_buf(), BTreeMap::new()));
            let session = Session::new(
                state,
                ShellExecutor::new(Box::new(runner.clone())),
                NlTranslator::new(Box::new(model.clone())),
                InputBuffer::new(Box::new(FixedInputs::default())),
                PlatformInfo::from_env(&BTreeMap::new()),
                PromptIdentity {
                    username: "ada".to_string(),
                    api: "ollama".to_string(),
                    model: "llama3".to_string(),
                },
                Some(HistoryLog::new(dir.path().join("history.jsonl"))),
            );

            Self {
                session,
                runner,
                model,
                dir,
            }
        }

        fn queue(&mut self, commands: &[&str]) {
            self.session.state.pending_commands = commands.iter().map(|c| c.to_string()).collect();
        }

        fn pending(&self) -> Vec<String> {
            self.session.state().pending_commands.iter().cloned().collect()
        }

        fn saved_history(&self) -> Vec<String> {
            HistoryLog::new(self.dir.path().join("history.jsonl")).load_recent(100)
        }
    }

    #[tokio::test]
    async fn test_translation_autoruns_safe_and_stages_risky() {
        let mut h = Harness::new();
        h.model.push_ok("# clean up\nls -la\nrm -rf /tmp/x");

        let flow = h.session.handle_line("clean up the temp dir").await.unwrap();

        assert_eq!(flow, SessionFlow::Continue);
        assert_eq!(h.runner.calls(), vec!["ls -la"]);
        assert_eq!(h.pending(), vec!["rm -rf /tmp/x"]);
        assert_eq!(h.session.state().prompt_prefill, "rm -rf /tmp/x");
        assert_eq!(h.session.state().last.command, "ls -la");
    }

    #[tokio::test]
    async fn test_accepting_staged_command_resumes_triage() {
        let mut h = Harness::new();
        h.model.push_ok("git add -A\ngit commit -m x\nls");

        h.session.handle_line("commit my work").await.unwrap();
        assert!(h.runner.calls().is_empty());
        assert_eq!(h.session.state.take_prefill(), "git add -A");

        // the user presses Enter on the prefilled text
        h.session.handle_line("git add -A").await.unwrap();
        assert_eq!(h.runner.calls(), vec!["git add -A"]);
        assert_eq!(h.pending(), vec!["git commit -m x", "ls"]);
        assert_eq!(h.session.state.take_prefill(), "git commit -m x");

        h.session.handle_line("git commit -m x").await.unwrap();
        assert_eq!(h.runner.calls(), vec!["git add -A", "git commit -m x", "ls"]);
        assert!(h.pending().is_empty());
        assert!(h.session.state().prompt_prefill.is_empty());
    }

    #[tokio::test]
    async fn test_edited_command_does_not_pop_queue() {
        let mut h = Harness::new();
        h.queue(&["rm -rf build"]);

        h.session.handle_line("rm -rf build/cache").await.unwrap();
        assert_eq!(h.runner.calls(), vec!["rm -rf build/cache"]);
        assert_eq!(h.pending(), vec!["rm -rf build"]);
    }

    #[tokio::test]
    async fn test_rerun_phrase_runs_whole_queue_without_triage() {
        let mut h = Harness::new();
        h.queue(&["git commit -m x", "git push"]);
        h.session.state.prompt_prefill = "git commit -m x".to_string();

        let flow = h.session.handle_line("  Go Ahead ").await.unwrap();

        assert_eq!(flow, SessionFlow::Continue);
        assert_eq!(h.runner.calls(), vec!["git commit -m x", "git push"]);
        assert!(h.pending().is_empty());
        assert!(h.session.state().prompt_prefill.is_empty());
        assert_eq!(h.model.request_count(), 0);
    }

    #[tokio::test]
    async fn test_rerun_phrase_with_empty_queue() {
        let mut h = Harness::new();

        h.session.handle_line("run it").await.unwrap();

        assert!(h.runner.calls().is_empty());
        assert_eq!(h.model.request_count(), 0);
        assert_eq!(h.session.state().history, vec!["run it"]);
    }

    #[tokio::test]
    async fn test_translation_error_leaves_queue_untouched() {
        let mut h = Harness::new();
        h.queue(&["git push"]);
        h.model.push_err("Failed to connect to Ollama: connection refused");

        let flow = h.session.handle_line("deploy to production").await.unwrap();

        assert_eq!(flow, SessionFlow::Continue);
        assert_eq!(h.pending(), vec!["git push"]);
        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exit_ends_session_without_history() {
        let mut h = Harness::new();

        assert_eq!(h.session.handle_line("exit 3").await.unwrap(), SessionFlow::Exit(3));
        assert!(h.session.state().history.is_empty());
        assert!(h.saved_history().is_empty());
    }

    #[tokio::test]
    async fn test_exit_in_rerun_queue_stops_there() {
        let mut h = Harness::new();
        h.queue(&["echo one", "exit 4", "echo two"]);

        let flow = h.session.handle_line("do it").await.unwrap();

        assert_eq!(flow, SessionFlow::Exit(4));
        assert_eq!(h.runner.calls(), vec!["echo one"]);
    }

    #[tokio::test]
    async fn test_ai_request_is_stubbed() {
        let mut h = Harness::new();

        let flow = h.session.handle_line("ai: refactor the parser").await.unwrap();

        assert_eq!(flow, SessionFlow::Continue);
        assert_eq!(h.model.request_count(), 0);
        assert!(h.runner.calls().is_empty());
        assert_eq!(h.session.state().history, vec!["ai: refactor the parser"]);
    }

    #[tokio::test]
    async fn test_comments_and_blank_lines_are_not_recorded() {
        let mut h = Harness::new();

        h.session.handle_line("   ").await.unwrap();
        h.session.handle_line("# note to self").await.unwrap();

        assert!(h.session.state().history.is_empty());
        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_written_through() {
        let mut h = Harness::new();

        h.session.handle_line("pwd").await.unwrap();
        h.session.handle_line("ls -la").await.unwrap();

        assert_eq!(h.session.state().history, vec!["pwd", "ls -la"]);
        assert_eq!(h.saved_history(), vec!["pwd", "ls -la"]);
        // pwd is a builtin, ls goes to the runner
        assert_eq!(h.runner.calls(), vec!["ls -la"]);
    }

    #[tokio::test]
    async fn test_file_references_reach_the_prompt() {
        let mut h = Harness::new();
        std::fs::write(h.dir.path().join("notes.txt"), "deploy steps").unwrap();
        h.model.push_ok("# nothing to run");

        h.session.handle_line("summarize @notes.txt").await.unwrap();

        let prompt = h.model.last_prompt();
        assert!(prompt.contains("# File: notes.txt\ndeploy steps\n"));
        assert!(prompt.ends_with("User request: summarize"));
        assert!(h.pending().is_empty());
        assert_eq!(h.session.state().history, vec!["summarize @notes.txt"]);
    }

    #[tokio::test]
    async fn test_previous_result_reaches_next_translation() {
        let mut h = Harness::new();
        h.session.handle_line("cd /definitely/not/here").await.unwrap();
        h.model.push_ok("pwd");

        h.session.handle_line("why did that fail").await.unwrap();

        let prompt = h.model.last_prompt();
        assert!(prompt.contains("Previous command: cd /definitely/not/here\nExit code: 1"));
        assert!(prompt.contains("No such directory"));
    }

    #[tokio::test]
    async fn test_run_loop_passes_prefill_and_exits() {
        let mut h = Harness::new();
        h.model.push_ok("rm -rf build");
        let mut reader = ScriptedReader::lines(&["remove the build dir", "exit 2"]);

        let code = h.session.run(&mut reader).await.unwrap();

        assert_eq!(code, 2);
        assert_eq!(reader.prefills, vec!["", "rm -rf build"]);
        assert_eq!(reader.recalled, vec!["remove the build dir", "exit 2"]);
    }

    #[tokio::test]
    async fn test_run_loop_survives_interrupt_and_ends_on_eof() {
        let mut h = Harness::new();
        let mut reader = ScriptedReader::default();
        reader.events.push_back(PromptEvent::Interrupted);
        reader.events.push_back(PromptEvent::Line("pwd".to_string()));
        reader.events.push_back(PromptEvent::Eof);

        let code = h.session.run(&mut reader).await.unwrap();

        assert_eq!(code, 0);
        assert_eq!(h.session.state().history, vec!["pwd"]);
    }

    #[tokio::test]
    async fn test_bare_interpreter_keeps_previous_result() {
        let mut h = Harness::new();
        h.session.handle_line("ls -la").await.unwrap();
        h.queue(&["bash"]);

        h.session.handle_line("go ahead").await.unwrap();

        assert_eq!(h.session.state().last.command, "ls -la");
        assert_eq!(h.runner.calls(), vec!["ls -la"]);
        assert!(h.pending().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_follows_config_edits() {
        let mut h = Harness::new();
        let path = h.dir.path().join("config.json");
        h.session.config_watch = Some(ConfigWatch {
            path: path.clone(),
            current: Config::default(),
            fallback_api: ProviderType::Ollama,
        });

        // missing file keeps the startup identity
        h.session.reload_config();
        assert!(h.session.prompt().starts_with("ada@ollama/llama3 "));

        std::fs::write(&path, r#"{"preferred_api":"anthropic","anthropic_model":"claude-x"}"#)
            .unwrap();
        h.session.reload_config();
        assert!(h.session.prompt().starts_with("ada@anthropic/claude-x "));

        std::fs::write(&path, "{ not json").unwrap();
        h.session.reload_config();
        assert!(h.session.prompt().starts_with("ada@anthropic/claude-x "));

        std::fs::write(&path, r#"{"preferred_api":"gemini"}"#).unwrap();
        h.session.reload_config();
        assert!(h.session.prompt().starts_with("ada@unknown/unknown "));
    }

    #[test]
    fn test_identity_from_config() {
        let mut config = Config::default();
        let identity = PromptIdentity::from_config("ada".to_string(), &config, ProviderType::OpenAi);
        assert_eq!(identity.api, "openai");
        assert_eq!(identity.model, config.openai_model);

        config.preferred_api = Some("  ".to_string());
        let identity = PromptIdentity::from_config("ada".to_string(), &config, ProviderType::Ollama);
        assert_eq!(identity.api, "ollama");
        assert_eq!(identity.model, config.ollama_model);
    }

    #[test]
    fn test_mode_switch_changes_prompt() {
        let mut h = Harness::new();
        assert!(h.session.prompt().starts_with("ada@ollama/llama3 "));
        assert!(h.session.prompt().ends_with(" $ "));

        let flow = tokio_test::block_on(h.session.handle_line("mode ai")).unwrap();

        assert_eq!(flow, SessionFlow::Continue);
        assert!(h.session.prompt().ends_with("🤖 > "));
        assert!(h.runner.calls().is_empty());
    }

    #[test]
    fn test_actionable_lines() {
        let lines = actionable_lines("# header\n\n  ls -la  \n# note\ngit status\n");
        assert_eq!(lines, VecDeque::from(vec!["ls -la".to_string(), "git status".to_string()]));
    }

    #[test]
    fn test_rerun_phrases() {
        assert!(is_rerun_phrase("RUN THOSE"));
        assert!(is_rerun_phrase(" please run it "));
        assert!(!is_rerun_phrase("run it now"));
        assert!(!is_rerun_phrase("go"));
    }
}

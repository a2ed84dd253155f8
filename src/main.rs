use clap::Parser;
use std::process::ExitCode;

use webwright::api_keys::ApiKeyManager;
use webwright::boot::show_boot_splash;
use webwright::config::{Config, ProviderSelection};
use webwright::error_handling::display_error;
use webwright::executor::{ShellExecutor, SystemProcessRunner};
use webwright::history::{HistoryLog, RECALL_LIMIT};
use webwright::input_buffer::{InputBuffer, SystemInputs};
use webwright::logging::{get_logger, init_logger, LogCategory, LogContext};
use webwright::{log_error, log_info};
use webwright::os_context::PlatformInfo;
use webwright::prompt::TerminalPrompt;
use webwright::providers::{
    AnthropicProvider, OllamaProvider, OpenAiProvider, ProviderManager, ProviderType,
};
use webwright::render::print_welcome;
use webwright::shell::{PromptIdentity, Session};
use webwright::state::{SessionState, ShellEnv};
use webwright::translator::NlTranslator;

#[derive(Parser)]
#[command(name = "webwright")]
#[command(version)]
#[command(
    about = "👻 Webwright: the ghost in your shell",
    long_about = "An interactive shell that runs commands directly or translates plain English into them."
)]
struct Cli {
    /// Skip the boot splash
    #[arg(long)]
    no_splash: bool,

    /// Write commands and prompts to the log file (explicit consent)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.debug) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let config = Config::load();

    if !cli.no_splash && config.show_boot_splash {
        show_boot_splash().await;
    }

    let selection = match config.determine_api_to_use(&ApiKeyManager::new()) {
        Ok(selection) => selection,
        Err(message) => {
            display_error(&message);
            log_error!(LogCategory::Configuration, message);
            return Ok(ExitCode::from(1));
        }
    };

    let platform = PlatformInfo::detect();
    if let Ok(logger) = get_logger() {
        if let Ok(logger_guard) = logger.lock() {
            let _ = logger_guard.log_startup(env!("CARGO_PKG_VERSION"), &platform.describe());
        }
    }

    let manager = build_provider_manager(&config, &selection);
    if !manager.has_providers() {
        display_error("No AI provider selected. Exiting program.");
        return Ok(ExitCode::from(1));
    }

    let history_log = HistoryLog::default_location();
    let recall = history_log
        .as_ref()
        .map(|log| log.load_recent(RECALL_LIMIT))
        .unwrap_or_default();
    let mut reader = TerminalPrompt::new(&recall)?;

    let identity = PromptIdentity::from_config(config.get_username(), &config, selection.api);

    let mut session = Session::new(
        SessionState::new(ShellEnv::from_process()),
        ShellExecutor::with_timeout(
            Box::new(SystemProcessRunner::new()),
            config.command_timeout(),
        ),
        NlTranslator::new(Box::new(manager)),
        InputBuffer::new(Box::new(SystemInputs::new())),
        platform,
        identity,
        history_log,
    );
    if let Some(path) = Config::default_path() {
        session = session.watch_config(path, config.clone(), selection.api);
    }

    print_welcome();
    let code = session.run(&mut reader).await?;

    Ok(ExitCode::from((code & 0xff) as u8))
}

/// The selected provider first, then any cloud provider that has a key.
/// Ollama is registered only when it is the selection.
fn build_provider_manager(config: &Config, selection: &ProviderSelection) -> ProviderManager {
    let mut manager = ProviderManager::new(config.ai_timeout());

    if selection.api == ProviderType::Ollama {
        manager.add_provider(Box::new(OllamaProvider::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
            config.ai_timeout(),
        )));
    }

    if let Some(key) = &selection.openai_key {
        manager.add_provider(Box::new(OpenAiProvider::new(
            config.openai_url.clone(),
            key.clone(),
            config.openai_model.clone(),
            config.ai_timeout(),
        )));
    }

    if let Some(key) = &selection.anthropic_key {
        manager.add_provider(Box::new(AnthropicProvider::new(
            key.clone(),
            config.anthropic_model.clone(),
            config.ai_timeout(),
        )));
    }

    manager.switch_provider_preference(selection.api);

    if let Some((provider, model)) = manager.active_provider() {
        log_info!(
            LogCategory::Provider,
            format!("Using {} ({})", provider, model),
            LogContext::new().with_provider(provider.as_str())
        );
    }

    manager
}

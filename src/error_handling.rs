use colored::*;
use std::fmt;

/// Error with actionable suggestions for the person at the prompt
#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub error_type: ErrorType,
    pub message: String,
    pub suggestions: Vec<String>,
    pub technical_details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Connection,
    Authentication,
    RateLimit,
    Timeout,
    Provider,
    Configuration,
    General,
}

impl ErrorType {
    fn icon(&self) -> &'static str {
        match self {
            ErrorType::Connection => "🔌",
            ErrorType::Authentication => "🔐",
            ErrorType::RateLimit => "🚦",
            ErrorType::Timeout => "⏱️",
            ErrorType::Provider => "🤖",
            ErrorType::Configuration => "⚙️",
            ErrorType::General => "❌",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ErrorType::Connection => "Connection Error",
            ErrorType::Authentication => "Authentication Error",
            ErrorType::RateLimit => "Rate Limit",
            ErrorType::Timeout => "Timeout Error",
            ErrorType::Provider => "AI Provider Error",
            ErrorType::Configuration => "Configuration Error",
            ErrorType::General => "Error",
        }
    }
}

impl UserFriendlyError {
    pub fn new(error_type: ErrorType, message: &str) -> Self {
        Self {
            error_type,
            message: message.to_string(),
            suggestions: Vec::new(),
            technical_details: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: &[&str]) -> Self {
        self.suggestions
            .extend(suggestions.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_technical_details(mut self, details: String) -> Self {
        self.technical_details = Some(details);
        self
    }

    /// Print to stderr with colors
    pub fn display(&self) {
        eprintln!(
            "{} {}: {}",
            self.error_type.icon(),
            self.error_type.title().bold().red(),
            self.message
        );

        if !self.suggestions.is_empty() {
            eprintln!("{}", "Suggested solutions:".bold().yellow());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", (i + 1).to_string().green(), suggestion);
            }
        }

        if let Some(details) = &self.technical_details {
            eprintln!("   {}", details.dimmed());
        }
    }
}

impl fmt::Display for UserFriendlyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UserFriendlyError {}

/// Classify a translation failure and attach suggestions
pub fn enhance_error(error: &anyhow::Error) -> UserFriendlyError {
    let error_msg = error.to_string().to_lowercase();
    let details = error.to_string();

    if error_msg.contains("authentication")
        || error_msg.contains("unauthorized")
        || error_msg.contains("api key")
    {
        return UserFriendlyError::new(ErrorType::Authentication, "The AI provider rejected the credentials")
            .with_suggestions(&[
                "Check OPENAI_API_KEY or ANTHROPIC_API_KEY in your environment",
                "Verify the key has not expired or been revoked",
                "Switch preferred_api in ~/.webwright/config.json to another provider",
            ])
            .with_technical_details(details);
    }

    if error_msg.contains("rate limit") || error_msg.contains("too many requests") {
        return UserFriendlyError::new(ErrorType::RateLimit, "Rate limit exceeded for AI provider")
            .with_suggestions(&[
                "Wait a moment and try again",
                "Use a local Ollama model to avoid rate limits",
                "Check your API usage limits",
            ])
            .with_technical_details(details);
    }

    if error_msg.contains("timed out") || error_msg.contains("timeout") {
        return UserFriendlyError::new(ErrorType::Timeout, "Request timed out while waiting for AI response")
            .with_suggestions(&[
                "Try again - the AI provider might be temporarily busy",
                "Raise ai_timeout in ~/.webwright/config.json",
                "Try a shorter request",
            ])
            .with_technical_details(details);
    }

    if error_msg.contains("connection refused")
        || error_msg.contains("failed to connect")
        || error_msg.contains("dns")
        || error_msg.contains("network")
    {
        return UserFriendlyError::new(ErrorType::Connection, "Unable to connect to AI provider")
            .with_suggestions(&[
                "Ensure Ollama is running: ollama serve",
                "Check the provider URL in ~/.webwright/config.json",
                "Verify your internet connection for cloud providers",
            ])
            .with_technical_details(details);
    }

    if error_msg.contains("config") {
        return UserFriendlyError::new(ErrorType::Configuration, "Configuration issue detected")
            .with_suggestions(&[
                "Review ~/.webwright/config.json",
                "Delete the file to regenerate defaults",
            ])
            .with_technical_details(details);
    }

    if error_msg.contains("provider") || error_msg.contains("model") {
        return UserFriendlyError::new(ErrorType::Provider, "The AI provider could not answer")
            .with_suggestions(&[
                "Check that the configured model exists: ollama list",
                "Install the default model: ollama pull llama3",
                "Ensure at least one provider is configured",
            ])
            .with_technical_details(details);
    }

    UserFriendlyError::new(ErrorType::General, "Translation failed")
        .with_suggestions(&["Try rephrasing the request", "Run the command directly instead"])
        .with_technical_details(details)
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

/// Instruction-styled line, used for notices the shell prints between commands
pub fn display_info(message: &str) {
    println!("{}", message.cyan());
}

pub fn display_error(message: &str) {
    eprintln!("{}", message.red());
}

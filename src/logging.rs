use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// File logger for the shell.
///
/// Outside debug mode the logger records only system events, provider
/// health and error summaries. Typed commands, prompts and model replies
/// are written only once debug mode has been enabled with consent.
pub struct ShellLogger {
    log_file_path: PathBuf,
    debug_mode: bool,
    debug_consent_given: bool,
    writer: Arc<Mutex<Option<std::fs::File>>>,
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub context: Option<LogContext>,
    pub is_debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogCategory {
    System,
    Configuration,
    Provider,
    Translation,
    Execution,
    Session,
}

/// Context information for log entries (privacy-safe)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogContext {
    pub component: Option<String>,
    pub operation: Option<String>,
    pub duration_ms: Option<u64>,
    pub error_code: Option<String>,
    pub provider: Option<String>,
    pub os_type: Option<String>,
    pub return_code: Option<i32>,
    pub success: Option<bool>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error_code(mut self, error_code: &str) -> Self {
        self.error_code = Some(error_code.to_string());
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }

    pub fn with_return_code(mut self, return_code: i32) -> Self {
        self.return_code = Some(return_code);
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }
}

static HOME_LINUX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/home/[^/\s]+").expect("valid regex"));
static HOME_MACOS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Users/[^/\s]+").expect("valid regex"));
static SECRET_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(api_key|token|password)=\S+").expect("valid regex")
});
static URL_CREDENTIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"://[^@/]+@").expect("valid regex"));

impl ShellLogger {
    /// Logger writing to `~/.webwright/webwright.log`
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    pub fn with_path(log_file_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            log_file_path,
            debug_mode: false,
            debug_consent_given: false,
            writer: Arc::new(Mutex::new(None)),
        })
    }

    /// Enable debug mode. Passing `--debug` on the command line is the consent.
    pub fn enable_debug_mode(&mut self, consent_given: bool) -> Result<()> {
        if !consent_given {
            return Err(anyhow!("Debug mode requires explicit user consent"));
        }

        self.debug_mode = true;
        self.debug_consent_given = true;

        self.log_warning(
            LogCategory::System,
            "DEBUG MODE ACTIVE: commands and prompts will be written to this log".to_string(),
            None,
        )
    }

    pub fn log_error(
        &self,
        category: LogCategory,
        message: String,
        context: Option<LogContext>,
    ) -> Result<()> {
        self.write_entry(LogLevel::Error, category, message, context)
    }

    pub fn log_warning(
        &self,
        category: LogCategory,
        message: String,
        context: Option<LogContext>,
    ) -> Result<()> {
        self.write_entry(LogLevel::Warning, category, message, context)
    }

    pub fn log_info(
        &self,
        category: LogCategory,
        message: String,
        context: Option<LogContext>,
    ) -> Result<()> {
        self.write_entry(LogLevel::Info, category, message, context)
    }

    /// Only written when debug mode is on
    pub fn log_debug(
        &self,
        category: LogCategory,
        message: String,
        context: Option<LogContext>,
    ) -> Result<()> {
        if !self.is_debug_mode() {
            return Ok(());
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Debug,
            category,
            message,
            context,
            is_debug: true,
        };

        self.write_log_entry(&entry)
    }

    pub fn log_startup(&self, version: &str, os_info: &str) -> Result<()> {
        let context = LogContext {
            component: Some("system".to_string()),
            operation: Some("startup".to_string()),
            os_type: Some(os_info.to_string()),
            ..LogContext::default()
        };

        self.log_info(
            LogCategory::System,
            format!("webwright {} started", version),
            Some(context),
        )
    }

    pub fn log_config_change(&self, setting: &str, old_value: &str, new_value: &str) -> Result<()> {
        let context = LogContext::new()
            .with_component("configuration")
            .with_operation("update");

        self.log_info(
            LogCategory::Configuration,
            format!(
                "Configuration updated: {} changed from {} to {}",
                setting,
                redact_config_value(setting, old_value),
                redact_config_value(setting, new_value)
            ),
            Some(context),
        )
    }

    pub fn log_provider_operation(
        &self,
        provider: &str,
        operation: &str,
        duration_ms: u64,
        success: bool,
    ) -> Result<()> {
        let mut context = LogContext::new()
            .with_component("provider")
            .with_operation(operation)
            .with_duration_ms(duration_ms)
            .with_provider(provider)
            .with_success(success);
        if !success {
            context = context.with_error_code("operation_failed");
        }

        let level = if success { LogLevel::Info } else { LogLevel::Warning };
        let message = format!(
            "Provider {} {}: {} ({}ms)",
            provider,
            operation,
            if success { "success" } else { "failed" },
            duration_ms
        );

        self.write_entry(level, LogCategory::Provider, message, Some(context))
    }

    /// Record an execution outcome without the command text
    pub fn log_execution(&self, builtin: bool, return_code: i32, duration_ms: u64) -> Result<()> {
        let context = LogContext::new()
            .with_component("executor")
            .with_operation(if builtin { "builtin" } else { "external" })
            .with_duration_ms(duration_ms)
            .with_return_code(return_code)
            .with_success(return_code == 0);

        let level = if return_code == 0 { LogLevel::Info } else { LogLevel::Warning };
        self.write_entry(
            level,
            LogCategory::Execution,
            "Command finished".to_string(),
            Some(context),
        )
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode && self.debug_consent_given
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_file_path
    }

    fn default_log_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".webwright").join("webwright.log"))
    }

    fn write_entry(
        &self,
        level: LogLevel,
        category: LogCategory,
        message: String,
        context: Option<LogContext>,
    ) -> Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            category,
            message: self.redact_sensitive_info(&message),
            context,
            is_debug: false,
        };

        self.write_log_entry(&entry)
    }

    fn write_log_entry(&self, entry: &LogEntry) -> Result<()> {
        let mut writer_guard = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Failed to acquire log writer lock"))?;

        if writer_guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file_path)?;
            *writer_guard = Some(file);
        }

        if let Some(ref mut file) = *writer_guard {
            writeln!(file, "{}", format_log_entry(entry))?;
            file.flush()?;
        }

        Ok(())
    }

    fn redact_sensitive_info(&self, message: &str) -> String {
        if self.debug_mode {
            return message.to_string();
        }

        let redacted = HOME_LINUX.replace_all(message, "/home/[USER]");
        let redacted = HOME_MACOS.replace_all(&redacted, "/Users/[USER]");
        SECRET_ASSIGNMENT
            .replace_all(&redacted, "$1=[REDACTED]")
            .to_string()
    }
}

fn format_log_entry(entry: &LogEntry) -> String {
    let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
    let level = format!("{:?}", entry.level).to_uppercase();
    let category = format!("{:?}", entry.category).to_uppercase();

    let mut formatted = format!("[{}] {} {} {}", timestamp, level, category, entry.message);

    if let Some(ref context) = entry.context {
        let mut parts = Vec::new();

        if let Some(ref component) = context.component {
            parts.push(format!("component={}", component));
        }
        if let Some(ref operation) = context.operation {
            parts.push(format!("operation={}", operation));
        }
        if let Some(duration) = context.duration_ms {
            parts.push(format!("duration={}ms", duration));
        }
        if let Some(ref error_code) = context.error_code {
            parts.push(format!("error={}", error_code));
        }
        if let Some(ref provider) = context.provider {
            parts.push(format!("provider={}", provider));
        }
        if let Some(ref os_type) = context.os_type {
            parts.push(format!("os={}", os_type));
        }
        if let Some(return_code) = context.return_code {
            parts.push(format!("rc={}", return_code));
        }
        if let Some(success) = context.success {
            parts.push(format!("success={}", success));
        }

        if !parts.is_empty() {
            formatted.push_str(&format!(" [{}]", parts.join(", ")));
        }
    }

    if entry.is_debug {
        formatted = format!("DEBUG: {}", formatted);
    }

    formatted
}

fn redact_config_value(setting: &str, value: &str) -> String {
    match setting.to_lowercase().as_str() {
        "api_key" | "token" | "password" | "secret" => "[REDACTED]".to_string(),
        key if key.ends_with("_url") => URL_CREDENTIALS
            .replace_all(value, "://[REDACTED]@")
            .to_string(),
        _ => value.to_string(),
    }
}

static GLOBAL_LOGGER: std::sync::OnceLock<Arc<Mutex<ShellLogger>>> = std::sync::OnceLock::new();

/// Initialize the global logger
pub fn init_logger(debug: bool) -> Result<()> {
    let mut logger = ShellLogger::new()?;
    if debug {
        logger.enable_debug_mode(true)?;
    }
    let _ = GLOBAL_LOGGER.set(Arc::new(Mutex::new(logger)));
    Ok(())
}

pub fn get_logger() -> Result<Arc<Mutex<ShellLogger>>> {
    GLOBAL_LOGGER
        .get()
        .cloned()
        .ok_or_else(|| anyhow!("Logger not initialized. Call init_logger() first."))
}

#[macro_export]
macro_rules! log_error {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_error($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_error($category, $message.to_string(), Some($context));
            }
        }
    };
}

#[macro_export]
macro_rules! log_warning {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_warning($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_warning($category, $message.to_string(), Some($context));
            }
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_info($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_info($category, $message.to_string(), Some($context));
            }
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($category:expr, $message:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_debug($category, $message.to_string(), None);
            }
        }
    };
    ($category:expr, $message:expr, $context:expr) => {
        if let Ok(logger) = $crate::logging::get_logger() {
            if let Ok(logger_guard) = logger.lock() {
                let _ = logger_guard.log_debug($category, $message.to_string(), Some($context));
            }
        }
    };
}

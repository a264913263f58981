//! Error handling for region ping

use thiserror::Error;

/// Custom error types for region ping
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input, e.g. an unknown region
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Parsing errors (URLs, JSON, durations, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// I/O errors (file operations, sockets, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Endpoint directory could not be fetched or decoded
    #[error("Directory fetch error: {0}")]
    DirectoryFetch(String),

    /// Benchmark run errors
    #[error("Test execution error: {0}")]
    TestExecution(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new directory fetch error
    pub fn directory_fetch<S: Into<String>>(message: S) -> Self {
        Self::DirectoryFetch(message.into())
    }

    /// Create a new test execution error
    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Network(_) => "NETWORK",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Parse(_) => "PARSE",
            Self::Io(_) => "IO",
            Self::DirectoryFetch(_) => "DIRECTORY",
            Self::TestExecution(_) => "TEST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::HttpRequest(_) | Self::Timeout(_) | Self::DirectoryFetch(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::TestExecution(_) | Self::Internal(_) => false,
        }
    }

    /// One-line hint on what to try next
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Config(_) => "Check your .env file, the PROBE_* variables or command line arguments.",
            Self::Validation(_) => "Pick one of the known regions listed above.",
            Self::Network(_) => "Check your internet connection and try again.",
            Self::HttpRequest(_) => "The endpoint may be down or blocking requests.",
            Self::Timeout(_) => "Increase the timeout with -t or check your network connection.",
            Self::Parse(_) => "Check the format of your input values.",
            Self::Io(_) => "Check file permissions and that the port is free.",
            Self::DirectoryFetch(_) => "Verify the directory URL serves /api/endpoints JSON, or unset ENDPOINTS_URL to use the builtin table.",
            Self::TestExecution(_) => "Make sure at least one repetition is requested (-n).",
            Self::Internal(_) => "This is likely a bug. Please report this issue with the error details.",
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        let (headline, msg) = match self {
            Self::Config(msg) => ("Configuration problem", msg),
            Self::Validation(msg) => ("Invalid input", msg),
            Self::Network(msg) => ("Network connectivity issue", msg),
            Self::HttpRequest(msg) => ("HTTP request failed", msg),
            Self::Timeout(msg) => ("Request timed out", msg),
            Self::Parse(msg) => ("Failed to parse data", msg),
            Self::Io(msg) => ("I/O operation failed", msg),
            Self::DirectoryFetch(msg) => ("Endpoint directory unavailable", msg),
            Self::TestExecution(msg) => ("Benchmark failed", msg),
            Self::Internal(msg) => ("Internal error", msg),
        };
        format!("{}: {}\n\nSuggestion: {}", headline, msg, self.suggestion())
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::Network(_) | Self::HttpRequest(_) | Self::DirectoryFetch(_) => 2,  // Network issues
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::TestExecution(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::HttpRequest(_) | Self::DirectoryFetch(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::TestExecution(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            Self::network(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user-facing error output
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user on stderr
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }

    /// `Error: [CATEGORY] message` followed by a suggestion; verbose
    /// output spells the error out in full
    pub fn render(&self, error: &AppError) -> String {
        let headline = format!("Error: {}", error.format_for_console(self.use_color));
        if self.verbose {
            format!("{}\n\n{}", headline, error.user_friendly_message())
        } else {
            format!("{}\n\nSuggestion: {}", headline, error.suggestion())
        }
    }
}

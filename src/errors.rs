//! Error handling module
//!
//! Unified application error type built on `thiserror`, replacing the
//! `soulbase-errors` object-graph integration this crate no longer carries.
#![allow(dead_code)]

use std::fmt;

/// Stable, loggable identifier for an error kind. Not an enum so call sites
/// can keep passing a plain code through `new`/`with_cause` without needing
/// a match arm added here for every new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

pub mod codes {
    use super::ErrorCode;

    pub const AUTH_UNAUTHENTICATED: ErrorCode = ErrorCode("auth.unauthenticated");
    pub const AUTH_FORBIDDEN: ErrorCode = ErrorCode("auth.forbidden");
    pub const STORAGE_NOT_FOUND: ErrorCode = ErrorCode("storage.not_found");
    pub const SCHEMA_VALIDATION: ErrorCode = ErrorCode("schema.validation");
    pub const LLM_TIMEOUT: ErrorCode = ErrorCode("llm.timeout");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("unknown.internal");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Transient,
    Permanent,
}

#[derive(Debug, Clone)]
pub struct CauseEntry {
    pub code: String,
    pub summary: String,
}

/// Unified error type carried across the binary's call boundaries.
///
/// Library crates (`core-types`, `dom-projection`, `action-registry`,
/// `cdp-adapter`, `agent-core`) each define their own `thiserror` enum; this
/// type is the application layer's single error surface, the way
/// `anyhow::Error` would be used directly if it didn't also need a stable
/// code/severity/retry classification for the HTTP and CLI surfaces.
#[derive(Debug, Clone)]
pub struct SoulBrowserError {
    code: ErrorCode,
    message_user: String,
    message_dev: Option<String>,
    http_status: u16,
    retryable: RetryClass,
    severity: Severity,
    causes: Vec<CauseEntry>,
}

impl SoulBrowserError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message_user: message.to_string(),
            message_dev: None,
            http_status: http_status_for(code),
            retryable: retry_class_for(code),
            severity: severity_for(code),
            causes: Vec::new(),
        }
    }

    fn with_dev(code: ErrorCode, user: impl Into<String>, dev: impl Into<String>) -> Self {
        let mut err = Self::new(code, &user.into());
        err.message_dev = Some(dev.into());
        err
    }

    pub fn auth_error(message: &str) -> Self {
        Self::with_dev(codes::AUTH_UNAUTHENTICATED, message, "Authentication failed")
    }

    pub fn forbidden(message: &str) -> Self {
        Self::with_dev(codes::AUTH_FORBIDDEN, message, "Authorization denied")
    }

    pub fn not_found(resource: &str) -> Self {
        Self::with_dev(
            codes::STORAGE_NOT_FOUND,
            format!("{resource} not found"),
            format!("Resource '{resource}' does not exist"),
        )
    }

    pub fn validation_error(message: &str, details: &str) -> Self {
        Self::with_dev(codes::SCHEMA_VALIDATION, message, details)
    }

    pub fn timeout(operation: &str, timeout_ms: u64) -> Self {
        Self::with_dev(
            codes::LLM_TIMEOUT,
            format!("{operation} timed out"),
            format!("Operation '{operation}' exceeded timeout of {timeout_ms}ms"),
        )
    }

    pub fn internal(message: &str) -> Self {
        Self::with_dev(codes::UNKNOWN_INTERNAL, "An internal error occurred", message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.message_user
    }

    pub fn dev_message(&self) -> Option<&str> {
        self.message_dev.as_deref()
    }

    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.retryable, RetryClass::Transient)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Appends a cause to the error chain, preserving the original message.
    pub fn with_cause(mut self, code: &str, summary: &str) -> Self {
        self.causes.push(CauseEntry {
            code: code.to_string(),
            summary: summary.to_string(),
        });
        self
    }
}

fn http_status_for(code: ErrorCode) -> u16 {
    match code.0 {
        "auth.unauthenticated" => 401,
        "auth.forbidden" => 403,
        "storage.not_found" => 404,
        "schema.validation" => 400,
        "llm.timeout" => 504,
        _ => 500,
    }
}

fn retry_class_for(code: ErrorCode) -> RetryClass {
    match code.0 {
        "llm.timeout" => RetryClass::Transient,
        _ => RetryClass::Permanent,
    }
}

fn severity_for(code: ErrorCode) -> Severity {
    match code.0 {
        "auth.unauthenticated" | "auth.forbidden" => Severity::Warn,
        "storage.not_found" | "schema.validation" => Severity::Error,
        "llm.timeout" => Severity::Warn,
        _ => Severity::Critical,
    }
}

impl fmt::Display for SoulBrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message_user)
    }
}

impl std::error::Error for SoulBrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<std::io::Error> for SoulBrowserError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(&format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for SoulBrowserError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation_error("Invalid JSON", &err.to_string())
    }
}

impl From<anyhow::Error> for SoulBrowserError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(&err.to_string())
    }
}

pub type SoulResult<T> = Result<T, SoulBrowserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SoulBrowserError::auth_error("Invalid credentials");
        assert_eq!(err.code(), codes::AUTH_UNAUTHENTICATED);
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(err.dev_message().is_some());
    }

    #[test]
    fn test_error_with_cause() {
        let err = SoulBrowserError::internal("Database connection failed")
            .with_cause("DB_CONN", "Connection timeout");
        assert_eq!(err.code(), codes::UNKNOWN_INTERNAL);
        assert_eq!(err.causes.len(), 1);
    }

    #[test]
    fn test_retryable_check() {
        let timeout_err = SoulBrowserError::timeout("Request", 5000);
        assert!(timeout_err.is_retryable());

        let auth_err = SoulBrowserError::auth_error("Invalid token");
        assert!(!auth_err.is_retryable());
    }
}

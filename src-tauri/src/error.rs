//! Central error types for WebTray.
//!
//! Errors fall into two groups: user/environment failures (bad configuration,
//! a shortcut the OS refused, an origin we cannot resolve) which callers
//! handle softly, and invariant violations such as creating a second window
//! for a page, which are propagated to the top level and logged.
//! All errors implement `Serialize` for Tauri IPC compatibility.

use serde::Serialize;
use thiserror::Error;

/// Main error type for WebTray operations.
#[derive(Error, Debug)]
pub enum WebTrayError {
    /// Backing store could not be read or written
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Filesystem I/O failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A page already owns a live window
    #[error("Page {page_id} already has a window")]
    WindowExists { page_id: String },

    /// The page is missing a label or a URL with a scheme
    #[error("Page {page_id} cannot open a window")]
    PageNotOpenable { page_id: String },

    /// No page with this id
    #[error("Page not found with ID {id}")]
    PageNotFound { id: String },

    /// No window with this id
    #[error("Window not found with ID {id}")]
    WindowNotFound { id: String },

    /// Native window operation failed
    #[error("Window error: {0}")]
    WindowError(String),

    /// Global shortcut could not be registered
    #[error("Shortcut '{accelerator}' could not be registered: {reason}")]
    ShortcutError { accelerator: String, reason: String },

    /// Permission origin could not be resolved
    #[error("Cannot resolve permission origin: {0}")]
    OriginError(String),

    /// Modal window failed to open or was used with the wrong shape
    #[error("Modal error: {0}")]
    ModalError(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Implement Serialize for Tauri IPC compatibility.
/// Tauri requires errors to be serializable to send to the frontend.
impl Serialize for WebTrayError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<tauri::Error> for WebTrayError {
    fn from(err: tauri::Error) -> Self {
        WebTrayError::WindowError(err.to_string())
    }
}

impl From<String> for WebTrayError {
    fn from(msg: String) -> Self {
        WebTrayError::Other(msg)
    }
}

impl From<&str> for WebTrayError {
    fn from(msg: &str) -> Self {
        WebTrayError::Other(msg.to_string())
    }
}

/// Extension trait for adding context to Results.
///
/// Similar to anyhow's `Context` trait, this allows chaining context
/// information onto errors for better debugging.
pub trait ResultExt<T> {
    /// Add context to an error, converting it to WebTrayError::Other.
    fn context(self, msg: &str) -> WebTrayResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> WebTrayResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> WebTrayResult<T> {
        self.map_err(|e| WebTrayError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> WebTrayResult<T> {
        self.map_err(|e| WebTrayError::Other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types.
pub trait OptionExt<T> {
    /// Convert None to WebTrayError::Other with the given message.
    fn context(self, msg: &str) -> WebTrayResult<T>;

    /// Convert None to WebTrayError::Other with a lazily evaluated message.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> WebTrayResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, msg: &str) -> WebTrayResult<T> {
        self.ok_or_else(|| WebTrayError::Other(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> WebTrayResult<T> {
        self.ok_or_else(|| WebTrayError::Other(f()))
    }
}

/// Type alias for Results using WebTrayError.
pub type WebTrayResult<T> = Result<T, WebTrayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WebTrayError::WindowExists {
            page_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Page abc already has a window");
    }

    #[test]
    fn test_error_serialization() {
        let err = WebTrayError::OriginError("null".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Cannot resolve permission origin"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WebTrayError = io_err.into();
        assert!(matches!(err, WebTrayError::IoError(_)));
    }

    #[test]
    fn test_shortcut_error_mentions_accelerator() {
        let err = WebTrayError::ShortcutError {
            accelerator: "Ctrl+Shift+X".to_string(),
            reason: "already taken".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Ctrl+Shift+X"));
        assert!(msg.contains("already taken"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<(), &str> = Err("original error");
        let with_context = result.context("operation failed");

        let msg = with_context.unwrap_err().to_string();
        assert!(msg.contains("operation failed"));
        assert!(msg.contains("original error"));
    }

    #[test]
    fn test_result_ext_ok_passthrough() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(result.context("should not appear").unwrap(), 42);
    }

    #[test]
    fn test_option_ext_with_context() {
        let opt: Option<i32> = None;
        let result = opt.with_context(|| format!("missing value at index {}", 5));

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("missing value at index 5"));
    }
}

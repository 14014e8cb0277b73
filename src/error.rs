//! Driver error types and the stable failure-code taxonomy.

use thiserror::Error;

/// Stable failure codes surfaced to RPC callers in `error.data.error_code`.
///
/// Automated callers branch on these to decide whether to retry, pick a
/// different element, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    ElementNotFound,
    ElementNotVisible,
    OperationTimeout,
    ElementDetached,
    ElementReadonly,
    ElementDisabled,
    UnsupportedElementType,
    SetValueFailed,
    TypeValueFailed,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::ElementNotFound => "ELEMENT_NOT_FOUND",
            FailureCode::ElementNotVisible => "ELEMENT_NOT_VISIBLE",
            FailureCode::OperationTimeout => "OPERATION_TIMEOUT",
            FailureCode::ElementDetached => "ELEMENT_DETACHED",
            FailureCode::ElementReadonly => "ELEMENT_READONLY",
            FailureCode::ElementDisabled => "ELEMENT_DISABLED",
            FailureCode::UnsupportedElementType => "UNSUPPORTED_ELEMENT_TYPE",
            FailureCode::SetValueFailed => "SET_VALUE_FAILED",
            FailureCode::TypeValueFailed => "TYPE_VALUE_FAILED",
        }
    }
}

/// Errors raised while driving the live document.
///
/// Variants carry an explicit kind where the point of failure knows it;
/// free-form failures fall back to [`classify_message`] at the dispatcher
/// boundary.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element is not visible or interactive")]
    NotInteractable,

    #[error("Element is disabled")]
    Disabled,

    #[error("Element is readonly")]
    ReadOnly,

    #[error("Element detached from document: {0}")]
    Detached(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Keyboard operation failed: {0}")]
    Keyboard(String),

    #[error("{0}")]
    ActionFailed(String),
}

impl DriverError {
    /// Classified failure code, if one applies.
    ///
    /// Typed variants map directly; message-carrying variants go through
    /// the substring classifier. `None` means the caller should use its
    /// operation-specific generic code.
    pub fn failure_code(&self) -> Option<FailureCode> {
        match self {
            DriverError::ElementNotFound(_) => Some(FailureCode::ElementNotFound),
            DriverError::NotInteractable => Some(FailureCode::ElementNotVisible),
            DriverError::Disabled => Some(FailureCode::ElementDisabled),
            DriverError::ReadOnly => Some(FailureCode::ElementReadonly),
            DriverError::Detached(_) => Some(FailureCode::ElementDetached),
            DriverError::Timeout(_) => Some(FailureCode::OperationTimeout),
            DriverError::Keyboard(msg) | DriverError::ActionFailed(msg) => classify_message(msg),
        }
    }
}

/// Substring classification of failure messages into stable codes.
///
/// This is the historical wire contract: messages produced deep in the
/// interaction layer are sniffed for well-known fragments. New code should
/// raise typed [`DriverError`] variants instead and only fall through here.
pub fn classify_message(message: &str) -> Option<FailureCode> {
    if message.contains("not found") {
        Some(FailureCode::ElementNotFound)
    } else if message.contains("not visible") {
        Some(FailureCode::ElementNotVisible)
    } else if message.contains("timeout") {
        Some(FailureCode::OperationTimeout)
    } else if message.contains("detached") {
        Some(FailureCode::ElementDetached)
    } else if message.contains("readonly") {
        Some(FailureCode::ElementReadonly)
    } else if message.contains("disabled") {
        Some(FailureCode::ElementDisabled)
    } else {
        None
    }
}

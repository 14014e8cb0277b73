//! Value-setting executor.
//!
//! Shared by both RPC operations so `set_value` and `type_value` cannot
//! drift apart: interactability checks, scroll-into-view, clearing,
//! chunked typing with one retry, select/toggle mutation, event dispatch
//! and read-back verification.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DriverError;
use crate::locator::LocatedElement;
use crate::page::{DomEvent, ElementHandle, PageDriver, SelectOption};
use crate::strategy::{ElementKind, InputMethod, InputStrategy};

/// Per-character delay for short values typed in one operation.
const SHORT_TYPE_DELAY: Duration = Duration::from_millis(50);
/// Values longer than this (in characters) are entered progressively.
const PROGRESSIVE_THRESHOLD: usize = 100;
const CHUNK_SIZE: usize = 80;
const CHUNK_TYPE_DELAY: Duration = Duration::from_millis(35);
/// Slower per-character delay for the single retry of a failed chunk.
const CHUNK_RETRY_TYPE_DELAY: Duration = Duration::from_millis(50);
const CHUNK_PAUSE: Duration = Duration::from_millis(250);
/// Later chunks give the renderer more time to keep up.
const LATE_CHUNK_PAUSE: Duration = Duration::from_millis(300);
const RETRY_BACKOFF: Duration = Duration::from_millis(500);
/// An input event fires every this many chunks to keep the host responsive.
const INPUT_EVENT_INTERVAL: usize = 3;
const SCROLL_SETTLE: Duration = Duration::from_millis(100);

/// Options shared by both RPC operations, merged over these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetValueOptions {
    #[serde(default = "default_clear_first")]
    pub clear_first: bool,
    #[serde(default)]
    pub submit: bool,
    /// Seconds to wait after the action, validated to `[0, 30]` upstream.
    #[serde(default = "default_wait_after")]
    pub wait_after: f64,
}

fn default_clear_first() -> bool {
    true
}

fn default_wait_after() -> f64 {
    1.0
}

impl Default for SetValueOptions {
    fn default() -> Self {
        Self {
            clear_first: true,
            submit: false,
            wait_after: 1.0,
        }
    }
}

/// Outcome of a value-setting run.
#[derive(Debug, Clone)]
pub struct SetOutcome {
    /// The value actually achieved, shaped per strategy: string for typed
    /// input, string array for multi-select, bool for toggles.
    pub actual_value: Value,
}

/// Stringify a requested value the way the wire reads it: strings
/// verbatim, everything else via its JSON rendering.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Drive a located element according to its resolved strategy.
pub async fn set_element_value(
    page: &dyn PageDriver,
    element: &LocatedElement,
    value: &Value,
    strategy: &InputStrategy,
    options: &SetValueOptions,
) -> Result<SetOutcome, DriverError> {
    let handle = page.element(element.index).await?;
    ensure_interactable(handle.as_ref()).await?;

    handle.scroll_into_view().await?;
    tokio::time::sleep(SCROLL_SETTLE).await;

    match strategy.method {
        InputMethod::Type => type_value(handle.as_ref(), value, options).await,
        InputMethod::SingleSelect => select_single(handle.as_ref(), value).await,
        InputMethod::MultiSelect => select_multi(handle.as_ref(), value).await,
        InputMethod::Toggle => toggle(handle.as_ref(), value, &strategy.kind).await,
        InputMethod::Upload | InputMethod::Unknown => Err(DriverError::ActionFailed(format!(
            "Unsupported input method: {}",
            strategy.method.as_str()
        ))),
    }
}

/// Preconditions before any mutation: positive bounding box, not hidden,
/// not disabled, not readonly.
async fn ensure_interactable(handle: &dyn ElementHandle) -> Result<(), DriverError> {
    let state = handle.state().await?;
    if state.disabled {
        return Err(DriverError::Disabled);
    }
    if state.read_only {
        return Err(DriverError::ReadOnly);
    }
    if state.width <= 0.0 || state.height <= 0.0 || !state.visible {
        return Err(DriverError::NotInteractable);
    }
    Ok(())
}

async fn type_value(
    handle: &dyn ElementHandle,
    value: &Value,
    options: &SetValueOptions,
) -> Result<SetOutcome, DriverError> {
    let text = value_text(value);

    if options.clear_first {
        handle.clear().await?;
    }

    if text.chars().count() > PROGRESSIVE_THRESHOLD {
        type_progressive(handle, &text).await?;
    } else {
        handle.type_text(&text, SHORT_TYPE_DELAY).await?;
    }

    handle.dispatch(DomEvent::Change).await?;

    // Best-effort verification; a mismatch is logged, never a failure.
    match handle.read_value().await {
        Ok(live) if live == text => debug!("typed value verified"),
        Ok(live) => debug!(
            expected_chars = text.chars().count(),
            actual_chars = live.chars().count(),
            "typed value differs on read-back"
        ),
        Err(error) => debug!(%error, "read-back verification failed"),
    }

    Ok(SetOutcome {
        actual_value: Value::String(text),
    })
}

/// Progressive chunked entry for long text. Each chunk gets one retry
/// after a longer pause; a repeated failure aborts the whole operation.
async fn type_progressive(handle: &dyn ElementHandle, text: &str) -> Result<(), DriverError> {
    let chunks = chunk_text(text, CHUNK_SIZE);
    let total = chunks.len();
    let midpoint = total / 2;
    debug!(chars = text.chars().count(), chunks = total, "progressive text entry");

    for (index, chunk) in chunks.iter().enumerate() {
        if let Err(error) = handle.type_text(chunk, CHUNK_TYPE_DELAY).await {
            warn!(chunk = index, %error, "chunk entry failed, retrying once");
            tokio::time::sleep(RETRY_BACKOFF).await;
            handle.type_text(chunk, CHUNK_RETRY_TYPE_DELAY).await?;
        }

        if index % INPUT_EVENT_INTERVAL == 0 {
            handle.dispatch(DomEvent::Input).await?;
        }

        if index + 1 < total {
            let pause = if index > midpoint {
                LATE_CHUNK_PAUSE
            } else {
                CHUNK_PAUSE
            };
            tokio::time::sleep(pause).await;
        }
    }

    handle.dispatch(DomEvent::Input).await?;
    handle.dispatch(DomEvent::Change).await?;
    Ok(())
}

/// Split on character boundaries, not bytes.
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Match an option by exact trimmed display text or raw value.
fn find_option(options: &[SelectOption], wanted: &str) -> Option<usize> {
    options
        .iter()
        .position(|o| o.text.trim() == wanted || o.value == wanted)
}

/// Enumerate up to five options plus a remainder count for error messages.
fn enumerate_options(options: &[SelectOption]) -> String {
    let shown: Vec<String> = options
        .iter()
        .take(5)
        .map(|o| format!("\"{}\"", o.text.trim()))
        .collect();
    let mut message = format!("Available options: {}", shown.join(", "));
    if options.len() > 5 {
        message.push_str(&format!(" (and {} more)", options.len() - 5));
    }
    message
}

async fn select_single(handle: &dyn ElementHandle, value: &Value) -> Result<SetOutcome, DriverError> {
    let wanted = value_text(value);
    let options = handle.options().await?;

    let Some(index) = find_option(&options, &wanted) else {
        return Err(DriverError::ActionFailed(format!(
            "Option \"{wanted}\" not found. {}",
            enumerate_options(&options)
        )));
    };

    let changed = !options[index].selected;
    handle.set_selected(&[index]).await?;

    // Events fire only when the resulting value differs from the prior one.
    if changed {
        handle.dispatch(DomEvent::Change).await?;
        handle.dispatch(DomEvent::Input).await?;
    }

    Ok(SetOutcome {
        actual_value: Value::String(options[index].text.trim().to_string()),
    })
}

async fn select_multi(handle: &dyn ElementHandle, value: &Value) -> Result<SetOutcome, DriverError> {
    let wanted: Vec<String> = match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        other => vec![value_text(other)],
    };

    let options = handle.options().await?;
    let mut indices = Vec::new();
    let mut selected = Vec::new();
    for want in &wanted {
        if let Some(index) = find_option(&options, want) {
            if !indices.contains(&index) {
                indices.push(index);
                selected.push(options[index].text.trim().to_string());
            }
        }
    }

    if indices.is_empty() {
        return Err(DriverError::ActionFailed(format!(
            "No matching options found. {}",
            enumerate_options(&options)
        )));
    }

    // Replaces the whole selection, then fires events once.
    handle.set_selected(&indices).await?;
    handle.dispatch(DomEvent::Change).await?;
    handle.dispatch(DomEvent::Input).await?;

    Ok(SetOutcome {
        actual_value: Value::Array(selected.into_iter().map(Value::String).collect()),
    })
}

async fn toggle(
    handle: &dyn ElementHandle,
    value: &Value,
    kind: &ElementKind,
) -> Result<SetOutcome, DriverError> {
    let target = value_truthy(value);

    // Radios only check; unchecking happens through another radio in the
    // same group.
    if *kind == ElementKind::Radio && !target {
        return Err(DriverError::ActionFailed(
            "Cannot uncheck a radio button - use another radio button in the same group".into(),
        ));
    }

    let current = handle.is_checked().await?;
    if current != target {
        handle.set_checked(target).await?;
        handle.dispatch(DomEvent::Change).await?;
        handle.dispatch(DomEvent::Input).await?;
    }

    Ok(SetOutcome {
        actual_value: Value::Bool(handle.is_checked().await?),
    })
}

/// Truthiness for toggle requests: booleans as-is, `"false"`/`"0"`/empty
/// strings are false, numeric zero is false.
fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            !(s.is_empty() || s == "false" || s == "0")
        }
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        _ => true,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

//! Keyboard macro interpreter.
//!
//! A value string is a sequence of literal-text runs interleaved with
//! bracketed commands: `"hi {Tab}there"`, `"{Ctrl+A}{Delete}"`. Commands
//! with a `+` between non-empty sides are modifier combinations; everything
//! else is a single special key, falling back to the literal token when the
//! alias table does not know it.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::DriverError;
use crate::page::PageDriver;

/// Fixed delay between consecutive keyboard operations.
const INTER_OP_DELAY: Duration = Duration::from_millis(50);

static MACRO_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("macro span pattern is valid"));

/// One parsed keyboard operation, consumed strictly in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyOperation {
    Text { content: String },
    SpecialKey { key: String },
    ModifierCombination { modifiers: Vec<String>, key: String },
}

/// True when the value contains at least one complete `{...}` span.
///
/// Used for keyboard-mode auto-detection when the caller did not force a
/// mode explicitly.
pub fn contains_macro(value: &str) -> bool {
    MACRO_SPAN.is_match(value)
}

/// Single-pass left-to-right parse into ordered operations.
///
/// Adjacent literal text is coalesced into one `Text` operation before
/// each command; concatenating all `Text` contents reproduces exactly the
/// non-bracketed portions of the input in order.
pub fn parse_sequence(value: &str) -> Vec<KeyOperation> {
    let mut operations = Vec::new();
    let mut text = String::new();
    let mut last = 0;

    for span in MACRO_SPAN.find_iter(value) {
        text.push_str(&value[last..span.start()]);
        if !text.is_empty() {
            operations.push(KeyOperation::Text {
                content: std::mem::take(&mut text),
            });
        }

        let command = value[span.start() + 1..span.end() - 1].trim();
        operations.push(parse_command(command));
        last = span.end();
    }

    text.push_str(&value[last..]);
    if !text.is_empty() {
        operations.push(KeyOperation::Text { content: text });
    }

    operations
}

/// A `+` with non-empty text on both sides marks a modifier combination;
/// the last token is the key, the rest are modifiers.
fn parse_command(command: &str) -> KeyOperation {
    let is_combo =
        command.contains('+') && !command.starts_with('+') && !command.ends_with('+');

    if is_combo {
        let mut parts: Vec<&str> = command.split('+').map(str::trim).collect();
        let key = parts.pop().unwrap_or_default();
        KeyOperation::ModifierCombination {
            modifiers: parts.into_iter().map(map_modifier).collect(),
            key: map_special_key(key),
        }
    } else {
        KeyOperation::SpecialKey {
            key: map_special_key(command),
        }
    }
}

/// Alias table for special keys; unrecognized names pass through as-is.
fn map_special_key(name: &str) -> String {
    let mapped = match name.trim().to_lowercase().as_str() {
        "enter" => "Enter",
        "tab" => "Tab",
        "esc" | "escape" => "Escape",
        "backspace" => "Backspace",
        "delete" | "del" => "Delete",
        "space" => " ",
        "up" | "arrowup" => "ArrowUp",
        "down" | "arrowdown" => "ArrowDown",
        "left" | "arrowleft" => "ArrowLeft",
        "right" | "arrowright" => "ArrowRight",
        "home" => "Home",
        "end" => "End",
        "pageup" => "PageUp",
        "pagedown" => "PageDown",
        "f1" => "F1",
        "f2" => "F2",
        "f3" => "F3",
        "f4" => "F4",
        "f5" => "F5",
        "f6" => "F6",
        "f7" => "F7",
        "f8" => "F8",
        "f9" => "F9",
        "f10" => "F10",
        "f11" => "F11",
        "f12" => "F12",
        "insert" | "ins" => "Insert",
        _ => return name.trim().to_string(),
    };
    mapped.to_string()
}

/// Alias table for modifier keys; unrecognized names pass through as-is.
fn map_modifier(name: &str) -> String {
    let mapped = match name.trim().to_lowercase().as_str() {
        "ctrl" | "control" => "Control",
        "shift" => "Shift",
        "alt" | "option" => "Alt",
        "cmd" | "command" | "meta" | "win" | "windows" => "Meta",
        _ => return name.trim().to_string(),
    };
    mapped.to_string()
}

/// Execute operations strictly in order with a fixed inter-op delay.
///
/// Modifier combinations press all modifiers down in listed order,
/// press-and-release the key, then release the modifiers in reverse. A
/// failed operation aborts the remainder; operations already applied stay
/// applied to the live document.
pub async fn run_sequence(
    page: &dyn PageDriver,
    operations: &[KeyOperation],
) -> Result<Vec<KeyOperation>, DriverError> {
    let mut performed = Vec::with_capacity(operations.len());

    for operation in operations {
        match operation {
            KeyOperation::Text { content } => {
                if content.is_empty() {
                    continue;
                }
                page.keyboard_type(content).await.map_err(keyboard_failure)?;
            }
            KeyOperation::SpecialKey { key } => {
                page.key_press(key).await.map_err(keyboard_failure)?;
            }
            KeyOperation::ModifierCombination { modifiers, key } => {
                for modifier in modifiers {
                    page.key_down(modifier).await.map_err(keyboard_failure)?;
                }
                page.key_press(key).await.map_err(keyboard_failure)?;
                for modifier in modifiers.iter().rev() {
                    page.key_up(modifier).await.map_err(keyboard_failure)?;
                }
            }
        }

        performed.push(operation.clone());
        tokio::time::sleep(INTER_OP_DELAY).await;
    }

    Ok(performed)
}

fn keyboard_failure(error: DriverError) -> DriverError {
    DriverError::Keyboard(error.to_string())
}

#[cfg(test)]
#[path = "keyboard_tests.rs"]
mod tests;

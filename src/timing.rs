//! Adaptive operation timeout and settle-delay model.
//!
//! Both quantities are derived per request and never persisted. The
//! timeout is an advisory soft budget for the caller; the executor does
//! not enforce a hard deadline abort.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::strategy::ElementKind;

/// Requested timeout for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutSpec {
    #[default]
    Auto,
    Millis(u64),
}

impl TimeoutSpec {
    /// Parse the RPC `timeout` param: absent or `"auto"` means auto,
    /// numbers and numeric strings are explicit milliseconds.
    pub fn from_param(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => TimeoutSpec::Auto,
            Some(v) => {
                if let Some(n) = v.as_i64() {
                    TimeoutSpec::Millis(n.max(0) as u64)
                } else if let Some(s) = v.as_str() {
                    match s.trim().parse::<i64>() {
                        Ok(n) => TimeoutSpec::Millis(n.max(0) as u64),
                        Err(_) => TimeoutSpec::Auto,
                    }
                } else {
                    TimeoutSpec::Auto
                }
            }
        }
    }
}

/// Tuning knobs for the timeout/pacing model.
///
/// Constants may be recalibrated; the derived budgets stay monotone in
/// text length, inventory size and element-type factor.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    pub base_timeout_ms: u64,
    /// Floor for caller-supplied explicit timeouts.
    pub explicit_floor_ms: u64,
    /// Floor for computed timeouts.
    pub floor_ms: u64,
    /// Leaves headroom under the host's outer RPC deadline.
    pub ceiling_ms: u64,
    pub settle_cap_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_timeout_ms: 12_000,
            explicit_floor_ms: 5_000,
            floor_ms: 12_000,
            ceiling_ms: 590_000,
            settle_cap_ms: 3_000,
        }
    }
}

/// Piecewise text-length contribution in milliseconds.
fn length_factor_ms(text_len: usize) -> u64 {
    let len = text_len as u64;
    if len <= 100 {
        0
    } else if len <= 500 {
        (len - 100).div_ceil(40) * 1000
    } else if len <= 1000 {
        10_000 + (len - 500).div_ceil(30) * 1000
    } else {
        26_000 + (len - 1000).div_ceil(25) * 1000
    }
}

/// Richer render targets get proportionally more budget.
fn type_factor(kind: &ElementKind) -> f64 {
    match kind {
        ElementKind::ContentEditable => 2.2,
        ElementKind::Textarea => 1.5,
        ElementKind::TextInput => 1.0,
        ElementKind::Select => 0.8,
        ElementKind::MultiSelect => 1.0,
        ElementKind::Checkbox | ElementKind::Radio => 0.5,
        ElementKind::Keyboard => 1.8,
        _ => 1.0,
    }
}

/// Stepped document-complexity factor from inventory size.
fn complexity_factor(element_count: usize) -> f64 {
    if element_count > 150 {
        1.8
    } else if element_count > 100 {
        1.6
    } else if element_count > 60 {
        1.4
    } else if element_count > 30 {
        1.2
    } else {
        1.0
    }
}

/// Compute the advisory operation timeout.
///
/// Explicit values clamp to the configured range; auto mode scales the
/// base by text length, element kind and document complexity.
pub fn operation_timeout(
    config: &PacingConfig,
    spec: TimeoutSpec,
    text_len: usize,
    kind: &ElementKind,
    element_count: usize,
) -> Duration {
    if let TimeoutSpec::Millis(ms) = spec {
        return Duration::from_millis(ms.clamp(config.explicit_floor_ms, config.ceiling_ms));
    }

    let raw = (config.base_timeout_ms + length_factor_ms(text_len)) as f64
        * type_factor(kind)
        * complexity_factor(element_count);
    let bounded = (raw as u64).clamp(config.floor_ms, config.ceiling_ms);

    debug!(
        text_len,
        kind = kind.as_str(),
        element_count,
        timeout_ms = bounded,
        "computed operation timeout"
    );

    Duration::from_millis(bounded)
}

/// Post-action settle delay: `wait_after` seconds scaled per element kind
/// and capped.
pub fn settle_delay(config: &PacingConfig, kind: &ElementKind, wait_after_secs: f64) -> Duration {
    let multiplier = match kind {
        ElementKind::TextInput => 0.5,
        ElementKind::Select => 1.5,
        ElementKind::Checkbox | ElementKind::Radio => 0.3,
        ElementKind::Textarea => 0.8,
        ElementKind::Keyboard => 1.2,
        _ => 1.0,
    };
    let ms = (wait_after_secs * 1000.0 * multiplier)
        .clamp(0.0, config.settle_cap_ms as f64);
    Duration::from_millis(ms as u64)
}

//! Request dispatcher for the form-driving operations.
//!
//! Validation happens up front and produces `-32602` before any page
//! access, so a rejected request has no side effects. Locate and
//! classification failures are `-32000`; anything that fails after
//! mutation started is `-32603` with a classified `error_code`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{DriverError, FailureCode};
use crate::executor::{self, SetValueOptions};
use crate::keyboard;
use crate::locator::{self, LocatedElement, Target};
use crate::page::{PageDriver, PageProvider};
use crate::strategy::{resolve_strategy, ElementKind, InputMethod, InputStrategy, SUPPORTED_TAGS};
use crate::timing::{self, PacingConfig, TimeoutSpec};

use super::envelope::{RpcError, RpcRequest, RpcResponse};

/// Stateless request handler; all document access goes through the
/// injected page provider.
pub struct FormDispatcher {
    pages: Arc<dyn PageProvider>,
    pacing: PacingConfig,
}

impl FormDispatcher {
    pub fn new(pages: Arc<dyn PageProvider>) -> Self {
        Self {
            pages,
            pacing: PacingConfig::default(),
        }
    }

    pub fn with_pacing(pages: Arc<dyn PageProvider>, pacing: PacingConfig) -> Self {
        Self { pages, pacing }
    }

    /// Route a request to its handler. Unknown methods get `-32601`.
    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        debug!(method = %request.method, "dispatching request");
        let outcome = match request.method.as_str() {
            "set_value" => self.set_value(&request.params).await,
            "type_value" => self.type_value(&request.params).await,
            other => Err(RpcError::method_not_found(other)),
        };
        match outcome {
            Ok(result) => RpcResponse::ok(result),
            Err(error) => {
                warn!(code = error.code, reason = %error.message, "request failed");
                RpcResponse::err(error)
            }
        }
    }

    async fn set_value(&self, params: &Value) -> Result<Value, RpcError> {
        let Some(raw_target) = params.get("target") else {
            return Err(RpcError::invalid_params("Missing required parameter: target"));
        };
        let Some(value) = params.get("value") else {
            return Err(RpcError::invalid_params("Missing required parameter: value"));
        };
        let forced_type = match params.get("target_type") {
            None | Some(Value::Null) => None,
            Some(Value::String(kind)) => Some(kind.as_str()),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "target_type must be \"index\" or \"description\"",
                ))
            }
        };
        let (target, target_type) = parse_target(raw_target, forced_type)?;
        let options = parse_options(params)?;
        let timeout = TimeoutSpec::from_param(params.get("timeout"));

        let page = self.current_page().await?;
        let located = self
            .locate(page.as_ref(), &target, raw_target, target_type)
            .await?;

        let strategy = resolve_strategy(&located.descriptor);
        if !strategy.can_handle {
            return Err(unsupported_element(&strategy.kind, &located.descriptor.tag_name));
        }

        let mut result = self
            .drive_element(
                page.as_ref(),
                &located,
                &strategy,
                value,
                &options,
                timeout,
                FailureCode::SetValueFailed,
            )
            .await?;
        if let Some(map) = result.as_object_mut() {
            map.insert("target".into(), raw_target.clone());
            map.insert("target_type".into(), json!(target_type));
        }
        Ok(result)
    }

    async fn type_value(&self, params: &Value) -> Result<Value, RpcError> {
        let Some(raw_index) = params.get("element_index") else {
            return Err(RpcError::invalid_params(
                "Missing required parameter: element_index",
            ));
        };
        let Some(index) = raw_index.as_i64().filter(|i| *i >= 0) else {
            return Err(RpcError::invalid_params(
                "element_index must be a non-negative number",
            ));
        };
        let Some(value) = params.get("value") else {
            return Err(RpcError::invalid_params("Missing required parameter: value"));
        };
        let keyboard_mode = match params.get("keyboard_mode") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(forced)) => Some(*forced),
            Some(_) => {
                return Err(RpcError::invalid_params("keyboard_mode must be a boolean"))
            }
        };
        let options = parse_options(params)?;
        let timeout = TimeoutSpec::from_param(params.get("timeout"));

        let page = self.current_page().await?;
        let located = self
            .locate(page.as_ref(), &Target::Index(index), raw_index, "index")
            .await?;
        let strategy = resolve_strategy(&located.descriptor);

        // Absent keyboard_mode auto-detects on macro syntax in the value.
        let use_keyboard = keyboard_mode
            .unwrap_or_else(|| value.as_str().is_some_and(keyboard::contains_macro));

        if use_keyboard {
            return self
                .run_keyboard(page.as_ref(), &located, &strategy, value, &options, timeout)
                .await;
        }

        if !strategy.can_handle {
            return Err(unsupported_element(&strategy.kind, &located.descriptor.tag_name));
        }
        self.drive_element(
            page.as_ref(),
            &located,
            &strategy,
            value,
            &options,
            timeout,
            FailureCode::TypeValueFailed,
        )
        .await
    }

    async fn current_page(&self) -> Result<Arc<dyn PageDriver>, RpcError> {
        self.pages
            .current_page()
            .await
            .ok_or_else(|| RpcError::application("No active page available"))
    }

    async fn locate(
        &self,
        page: &dyn PageDriver,
        target: &Target,
        raw_target: &Value,
        target_type: &str,
    ) -> Result<LocatedElement, RpcError> {
        match locator::locate(page, target).await {
            Ok(located) => Ok(located),
            Err(failure) => {
                let element_count = page.inventory_size().await;
                Err(element_not_found(
                    &failure.reason,
                    element_count,
                    raw_target,
                    target_type,
                ))
            }
        }
    }

    /// Shared happy path for both operations once the element is located
    /// and classified.
    #[allow(clippy::too_many_arguments)]
    async fn drive_element(
        &self,
        page: &dyn PageDriver,
        located: &LocatedElement,
        strategy: &InputStrategy,
        value: &Value,
        options: &SetValueOptions,
        timeout: TimeoutSpec,
        default_code: FailureCode,
    ) -> Result<Value, RpcError> {
        let text = executor::value_text(value);
        let element_count = page.inventory_size().await;
        let budget = timing::operation_timeout(
            &self.pacing,
            timeout,
            text.chars().count(),
            &strategy.kind,
            element_count,
        );
        debug!(
            index = located.index,
            kind = strategy.kind.as_str(),
            budget_ms = budget.as_millis() as u64,
            "driving element"
        );

        let outcome = executor::set_element_value(page, located, value, strategy, options)
            .await
            .map_err(|error| execution_failure(&error, default_code))?;

        tokio::time::sleep(timing::settle_delay(
            &self.pacing,
            &strategy.kind,
            options.wait_after,
        ))
        .await;
        self.maybe_submit(page, options).await;

        Ok(json!({
            "success": true,
            "message": format!(
                "Successfully set {} to \"{}\" using {} method",
                strategy.kind.as_str(),
                text,
                strategy.method.as_str(),
            ),
            "element_index": located.index,
            "element_type": strategy.kind.as_str(),
            "input_method": strategy.method.as_str(),
            "actual_value": outcome.actual_value,
            "element_info": located.descriptor.info(),
            "options_used": serde_json::to_value(options).unwrap_or(Value::Null),
        }))
    }

    /// Keyboard-mode path: macros run against the page keyboard while the
    /// element holds focus.
    async fn run_keyboard(
        &self,
        page: &dyn PageDriver,
        located: &LocatedElement,
        strategy: &InputStrategy,
        value: &Value,
        options: &SetValueOptions,
        timeout: TimeoutSpec,
    ) -> Result<Value, RpcError> {
        let fail = |error: DriverError| execution_failure(&error, FailureCode::TypeValueFailed);

        let text = executor::value_text(value);
        let element_count = page.inventory_size().await;
        let budget = timing::operation_timeout(
            &self.pacing,
            timeout,
            text.chars().count(),
            &ElementKind::Keyboard,
            element_count,
        );
        debug!(
            index = located.index,
            budget_ms = budget.as_millis() as u64,
            "keyboard input on element"
        );

        let handle = page.element(located.index).await.map_err(fail)?;
        handle.focus().await.map_err(fail)?;

        // Clearing only makes sense where a keyboard could type.
        if options.clear_first && strategy.method == InputMethod::Type {
            handle.clear().await.map_err(fail)?;
        }

        let operations = keyboard::parse_sequence(&text);
        let performed = keyboard::run_sequence(page, &operations).await.map_err(fail)?;
        page.wait_for_settled().await.map_err(fail)?;

        tokio::time::sleep(timing::settle_delay(
            &self.pacing,
            &ElementKind::Keyboard,
            options.wait_after,
        ))
        .await;
        self.maybe_submit(page, options).await;

        Ok(json!({
            "success": true,
            "message": "Successfully executed keyboard input on element",
            "element_index": located.index,
            "element_type": located.descriptor.tag_name.to_lowercase(),
            "input_method": "keyboard",
            "operations_performed": performed,
            "element_info": located.descriptor.info(),
            "options_used": serde_json::to_value(options).unwrap_or(Value::Null),
        }))
    }

    /// Submit is best effort: a failed Enter press is logged, never
    /// escalated, because the value change already landed.
    async fn maybe_submit(&self, page: &dyn PageDriver, options: &SetValueOptions) {
        if !options.submit {
            return;
        }
        if let Err(error) = page.key_press("Enter").await {
            warn!(%error, "submit key press failed");
        }
    }
}

/// Numbers and numeric strings are indices; other strings are
/// descriptions. An explicit `target_type` overrides the inference.
fn parse_target(
    raw: &Value,
    forced: Option<&str>,
) -> Result<(Target, &'static str), RpcError> {
    match forced {
        Some("index") => {
            let index = raw
                .as_i64()
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()));
            match index {
                Some(index) => Ok((Target::Index(index), "index")),
                None => Err(RpcError::invalid_params(
                    "target must be a numeric index when target_type is \"index\"",
                )),
            }
        }
        Some("description") => match raw.as_str() {
            Some(text) => Ok((Target::Description(text.to_string()), "description")),
            None => Err(RpcError::invalid_params(
                "target must be a description string when target_type is \"description\"",
            )),
        },
        Some(_) => Err(RpcError::invalid_params(
            "target_type must be \"index\" or \"description\"",
        )),
        None => {
            if let Some(index) = raw.as_i64() {
                return Ok((Target::Index(index), "index"));
            }
            if let Some(text) = raw.as_str() {
                return Ok(match text.trim().parse::<i64>() {
                    Ok(index) => (Target::Index(index), "index"),
                    Err(_) => (Target::Description(text.to_string()), "description"),
                });
            }
            Err(RpcError::invalid_params(
                "target must be an element index or description string",
            ))
        }
    }
}

fn parse_options(params: &Value) -> Result<SetValueOptions, RpcError> {
    let raw = match params.get("options") {
        None | Some(Value::Null) => return Ok(SetValueOptions::default()),
        Some(raw) => raw,
    };
    if !raw.is_object() {
        return Err(RpcError::invalid_params("options must be an object"));
    }
    if let Some(wait) = raw.get("wait_after") {
        let valid = wait.as_f64().is_some_and(|w| (0.0..=30.0).contains(&w));
        if !valid {
            return Err(RpcError::invalid_params(
                "options.wait_after must be a number between 0 and 30 seconds",
            ));
        }
    }
    serde_json::from_value(raw.clone())
        .map_err(|error| RpcError::invalid_params(format!("Invalid options: {error}")))
}

fn element_not_found(
    reason: &str,
    element_count: usize,
    target: &Value,
    target_type: &str,
) -> RpcError {
    RpcError::application(format!(
        "{reason}. Page has {element_count} interactive elements. \
         Use get_dom_extra_elements tool to see available elements."
    ))
    .with_data(json!({
        "error_code": FailureCode::ElementNotFound.as_str(),
        "target": target,
        "target_type": target_type,
        "available_element_count": element_count,
        "suggested_action": "Use get_dom_extra_elements tool to list available elements",
    }))
}

fn unsupported_element(kind: &ElementKind, tag: &str) -> RpcError {
    RpcError::application(format!(
        "Cannot set value on element type: {}. Supported types: {}",
        kind.as_str(),
        SUPPORTED_TAGS.join(", "),
    ))
    .with_data(json!({
        "error_code": FailureCode::UnsupportedElementType.as_str(),
        "element_type": kind.as_str(),
        "element_tag": tag,
        "supported_types": SUPPORTED_TAGS,
        "suggested_actions": [
            "Check if element is actually interactive",
            "Verify element type matches expected behavior",
            "Use click_element tool for non-form elements",
        ],
    }))
}

/// Wrap an execution error, classifying it into a stable `error_code` and
/// falling back to the operation's generic code.
fn execution_failure(error: &DriverError, default_code: FailureCode) -> RpcError {
    RpcError::internal(error.to_string()).with_data(json!({
        "error_code": error.failure_code().unwrap_or(default_code).as_str(),
    }))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

use std::sync::Arc;

use serde_json::{json, Value};

use super::*;
use crate::rpc::{
    RpcError, RpcRequest, RpcResponse, APPLICATION_ERROR, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND,
};
use crate::testing::{FakeElement, FakePage, FakePages};

fn dispatcher_with(elements: Vec<FakeElement>) -> (FormDispatcher, Arc<FakePage>) {
    let page = Arc::new(FakePage::new(elements.into_iter().map(Arc::new).collect()));
    let dispatcher = FormDispatcher::new(FakePages::single(page.clone()));
    (dispatcher, page)
}

async fn call(dispatcher: &FormDispatcher, method: &str, params: Value) -> RpcResponse {
    dispatcher.dispatch(RpcRequest::new(method, params)).await
}

fn error_of(response: RpcResponse) -> RpcError {
    response.error.expect("expected an error response")
}

fn result_of(response: RpcResponse) -> Value {
    match response {
        RpcResponse {
            result: Some(result),
            error: None,
        } => result,
        RpcResponse { error, .. } => panic!("expected success, got {error:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn unknown_method_is_rejected() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(call(&dispatcher, "fill_form", json!({})).await);
    assert_eq!(error.code, METHOD_NOT_FOUND);
    assert_eq!(error.message, "Method not found: fill_form");
}

#[tokio::test(start_paused = true)]
async fn set_value_requires_target_and_value() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(call(&dispatcher, "set_value", json!({"value": "x"})).await);
    assert_eq!(error.code, INVALID_PARAMS);
    assert_eq!(error.message, "Missing required parameter: target");

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 0})).await);
    assert_eq!(error.message, "Missing required parameter: value");
}

#[tokio::test(start_paused = true)]
async fn target_must_be_index_or_description() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(
        call(&dispatcher, "set_value", json!({"target": true, "value": "x"})).await,
    );
    assert_eq!(error.code, INVALID_PARAMS);
    assert_eq!(
        error.message,
        "target must be an element index or description string"
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_wait_after_rejects_before_touching_the_page() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text").with_value("kept")]);

    for wait in [json!(-1), json!(31), json!("soon")] {
        let error = error_of(
            call(
                &dispatcher,
                "set_value",
                json!({"target": 0, "value": "x", "options": {"wait_after": wait}}),
            )
            .await,
        );
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(
            error.message,
            "options.wait_after must be a number between 0 and 30 seconds"
        );
    }

    let element = page.element_at(0);
    assert_eq!(element.live_value(), "kept");
    assert_eq!(element.clear_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn no_active_page_is_an_application_error() {
    let dispatcher = FormDispatcher::new(FakePages::empty());

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 0, "value": "x"})).await);
    assert_eq!(error.code, APPLICATION_ERROR);
    assert_eq!(error.message, "No active page available");
}

#[tokio::test(start_paused = true)]
async fn set_value_by_index_reports_the_full_result() {
    let (dispatcher, page) = dispatcher_with(vec![
        FakeElement::input("text").with_name("first_name").with_placeholder("First name"),
    ]);

    let result = result_of(
        call(&dispatcher, "set_value", json!({"target": 0, "value": "Alice"})).await,
    );

    assert_eq!(result["success"], json!(true));
    assert_eq!(
        result["message"],
        json!("Successfully set text-input to \"Alice\" using type method")
    );
    assert_eq!(result["element_index"], json!(0));
    assert_eq!(result["element_type"], json!("text-input"));
    assert_eq!(result["input_method"], json!("type"));
    assert_eq!(result["actual_value"], json!("Alice"));
    assert_eq!(result["element_info"]["name"], json!("first_name"));
    assert_eq!(result["element_info"]["placeholder"], json!("First name"));
    assert_eq!(result["options_used"]["clear_first"], json!(true));
    assert_eq!(result["target"], json!(0));
    assert_eq!(result["target_type"], json!("index"));
    assert_eq!(page.element_at(0).live_value(), "Alice");
}

#[tokio::test(start_paused = true)]
async fn numeric_string_targets_are_indices() {
    let (dispatcher, page) = dispatcher_with(vec![
        FakeElement::input("text"),
        FakeElement::input("text"),
    ]);

    let result = result_of(
        call(&dispatcher, "set_value", json!({"target": "1", "value": "x"})).await,
    );
    assert_eq!(result["target_type"], json!("index"));
    assert_eq!(result["element_index"], json!(1));
    assert_eq!(page.element_at(1).live_value(), "x");
}

#[tokio::test(start_paused = true)]
async fn description_targets_scan_the_inventory() {
    let (dispatcher, page) = dispatcher_with(vec![
        FakeElement::input("text").with_name("company"),
        FakeElement::input("email").with_placeholder("Work email"),
    ]);

    let result = result_of(
        call(
            &dispatcher,
            "set_value",
            json!({"target": "work EMAIL", "value": "a@b.example"}),
        )
        .await,
    );
    assert_eq!(result["target_type"], json!("description"));
    assert_eq!(result["element_index"], json!(1));
    assert_eq!(page.element_at(1).live_value(), "a@b.example");
}

#[tokio::test(start_paused = true)]
async fn explicit_target_type_overrides_inference() {
    let (dispatcher, page) = dispatcher_with(vec![
        FakeElement::input("text").with_name("42"),
        FakeElement::input("text"),
    ]);

    // "42" would parse as an index; forcing description matches the name.
    let result = result_of(
        call(
            &dispatcher,
            "set_value",
            json!({"target": "42", "target_type": "description", "value": "x"}),
        )
        .await,
    );
    assert_eq!(result["element_index"], json!(0));
    assert_eq!(result["target_type"], json!("description"));
    assert_eq!(page.element_at(0).live_value(), "x");

    let error = error_of(
        call(
            &dispatcher,
            "set_value",
            json!({"target": "name", "target_type": "index", "value": "x"}),
        )
        .await,
    );
    assert_eq!(
        error.message,
        "target must be a numeric index when target_type is \"index\""
    );

    let error = error_of(
        call(
            &dispatcher,
            "set_value",
            json!({"target": 0, "target_type": "both", "value": "x"}),
        )
        .await,
    );
    assert_eq!(error.message, "target_type must be \"index\" or \"description\"");
}

#[tokio::test(start_paused = true)]
async fn unknown_index_reports_inventory_context() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 9, "value": "x"})).await);
    assert_eq!(error.code, APPLICATION_ERROR);
    assert_eq!(
        error.message,
        "Element with index 9 not found in DOM state. Page has 1 interactive elements. \
         Use get_dom_extra_elements tool to see available elements."
    );
    let data = error.data.unwrap();
    assert_eq!(data["error_code"], json!("ELEMENT_NOT_FOUND"));
    assert_eq!(data["target"], json!(9));
    assert_eq!(data["target_type"], json!("index"));
    assert_eq!(data["available_element_count"], json!(1));
    assert_eq!(
        data["suggested_action"],
        json!("Use get_dom_extra_elements tool to list available elements")
    );
}

#[tokio::test(start_paused = true)]
async fn unknown_description_reports_the_description() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(
        call(&dispatcher, "set_value", json!({"target": "phone", "value": "x"})).await,
    );
    assert!(error
        .message
        .starts_with("No element found matching description: \"phone\""));
}

#[tokio::test(start_paused = true)]
async fn unsupported_elements_list_supported_types() {
    let (dispatcher, _) =
        dispatcher_with(vec![FakeElement::new("button").with_text("Submit")]);

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 0, "value": "x"})).await);
    assert_eq!(error.code, APPLICATION_ERROR);
    assert_eq!(
        error.message,
        "Cannot set value on element type: button. Supported types: input, select, textarea, contenteditable"
    );
    let data = error.data.unwrap();
    assert_eq!(data["error_code"], json!("UNSUPPORTED_ELEMENT_TYPE"));
    assert_eq!(data["element_type"], json!("button"));
    assert_eq!(data["element_tag"], json!("button"));
    assert_eq!(
        data["suggested_actions"],
        json!([
            "Check if element is actually interactive",
            "Verify element type matches expected behavior",
            "Use click_element tool for non-form elements",
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn file_inputs_are_unsupported() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("file")]);

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 0, "value": "x"})).await);
    assert_eq!(error.code, APPLICATION_ERROR);
    let data = error.data.unwrap();
    assert_eq!(data["error_code"], json!("UNSUPPORTED_ELEMENT_TYPE"));
    assert_eq!(data["element_tag"], json!("input"));
}

#[tokio::test(start_paused = true)]
async fn hidden_element_fails_with_a_classified_code() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text").hidden()]);

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 0, "value": "x"})).await);
    assert_eq!(error.code, INTERNAL_ERROR);
    assert_eq!(error.message, "Element is not visible or interactive");
    assert_eq!(error.data.unwrap()["error_code"], json!("ELEMENT_NOT_VISIBLE"));
}

#[tokio::test(start_paused = true)]
async fn disabled_element_fails_with_a_classified_code() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text").disabled()]);

    let error = error_of(call(&dispatcher, "set_value", json!({"target": 0, "value": "x"})).await);
    assert_eq!(error.code, INTERNAL_ERROR);
    assert_eq!(error.data.unwrap()["error_code"], json!("ELEMENT_DISABLED"));
}

#[tokio::test(start_paused = true)]
async fn select_end_to_end_with_missing_option() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::select(&[
        ("us", "United States"),
        ("ca", "Canada"),
    ])]);

    let result = result_of(
        call(&dispatcher, "set_value", json!({"target": 0, "value": "Canada"})).await,
    );
    assert_eq!(result["input_method"], json!("single-select"));
    assert_eq!(result["actual_value"], json!("Canada"));
    assert_eq!(page.element_at(0).selected_texts(), vec!["Canada"]);

    // Message sniffing keeps this on the not-found code.
    let error = error_of(
        call(&dispatcher, "set_value", json!({"target": 0, "value": "Mexico"})).await,
    );
    assert_eq!(error.code, INTERNAL_ERROR);
    assert_eq!(error.data.unwrap()["error_code"], json!("ELEMENT_NOT_FOUND"));
}

#[tokio::test(start_paused = true)]
async fn checkbox_end_to_end() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::checkbox(false)]);

    let result = result_of(
        call(&dispatcher, "set_value", json!({"target": 0, "value": true})).await,
    );
    assert_eq!(result["element_type"], json!("checkbox"));
    assert_eq!(result["input_method"], json!("toggle"));
    assert_eq!(result["actual_value"], json!(true));
    assert!(page.element_at(0).checked_now());
}

#[tokio::test(start_paused = true)]
async fn submit_presses_enter_after_the_value_lands() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text")]);

    result_of(
        call(
            &dispatcher,
            "set_value",
            json!({"target": 0, "value": "x", "options": {"submit": true}}),
        )
        .await,
    );
    assert_eq!(page.key_log(), vec!["press:Enter"]);
}

#[tokio::test(start_paused = true)]
async fn submit_failure_does_not_fail_the_request() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text")]);
    page.fail_key_press("Enter");

    let result = result_of(
        call(
            &dispatcher,
            "set_value",
            json!({"target": 0, "value": "x", "options": {"submit": true}}),
        )
        .await,
    );
    assert_eq!(result["success"], json!(true));
    assert_eq!(page.element_at(0).live_value(), "x");
}

#[tokio::test(start_paused = true)]
async fn type_value_validates_element_index() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(call(&dispatcher, "type_value", json!({"value": "x"})).await);
    assert_eq!(error.code, INVALID_PARAMS);
    assert_eq!(error.message, "Missing required parameter: element_index");

    for bad in [json!(-1), json!("0"), json!(1.5)] {
        let error = error_of(
            call(&dispatcher, "type_value", json!({"element_index": bad, "value": "x"})).await,
        );
        assert_eq!(error.message, "element_index must be a non-negative number");
    }
}

#[tokio::test(start_paused = true)]
async fn type_value_rejects_non_boolean_keyboard_mode() {
    let (dispatcher, _) = dispatcher_with(vec![FakeElement::input("text")]);

    let error = error_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "x", "keyboard_mode": "yes"}),
        )
        .await,
    );
    assert_eq!(error.code, INVALID_PARAMS);
    assert_eq!(error.message, "keyboard_mode must be a boolean");
}

#[tokio::test(start_paused = true)]
async fn type_value_without_macros_types_normally() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::textarea()]);

    let result = result_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "plain text"}),
        )
        .await,
    );
    assert_eq!(result["input_method"], json!("type"));
    assert_eq!(result["element_type"], json!("textarea"));
    assert_eq!(page.element_at(0).live_value(), "plain text");
    assert!(page.key_log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn macro_values_auto_detect_keyboard_mode() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text").with_value("old")]);

    let result = result_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "hi {Tab}there"}),
        )
        .await,
    );

    assert_eq!(
        result["message"],
        json!("Successfully executed keyboard input on element")
    );
    assert_eq!(result["input_method"], json!("keyboard"));
    assert_eq!(result["element_type"], json!("input"));
    let performed = result["operations_performed"].as_array().unwrap();
    assert_eq!(performed.len(), 3);
    assert_eq!(performed[1]["type"], json!("specialKey"));
    assert_eq!(result["options_used"]["clear_first"], json!(true));
    assert_eq!(result["options_used"]["wait_after"], json!(1.0));
    assert_eq!(
        page.key_log(),
        vec!["type:hi ", "press:Tab", "type:there"]
    );

    // Focused and cleared before the sequence ran.
    let element = page.element_at(0);
    assert_eq!(element.focus_count(), 1);
    assert_eq!(element.clear_count(), 1);
    assert_eq!(element.live_value(), "");
    assert_eq!(page.settle_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn explicit_keyboard_mode_false_types_braces_literally() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text")]);

    let result = result_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "hi {Tab}", "keyboard_mode": false}),
        )
        .await,
    );
    assert_eq!(result["input_method"], json!("type"));
    assert_eq!(page.element_at(0).live_value(), "hi {Tab}");
    assert!(page.key_log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn explicit_keyboard_mode_true_without_macros() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text")]);

    let result = result_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "just text", "keyboard_mode": true}),
        )
        .await,
    );
    assert_eq!(result["input_method"], json!("keyboard"));
    assert_eq!(result["operations_performed"].as_array().unwrap().len(), 1);
    assert_eq!(page.key_log(), vec!["type:just text"]);
}

#[tokio::test(start_paused = true)]
async fn keyboard_failure_surfaces_the_type_value_code() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text")]);
    page.fail_key_press("Tab");

    let error = error_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "a{Tab}b"}),
        )
        .await,
    );
    assert_eq!(error.code, INTERNAL_ERROR);
    assert!(error.message.starts_with("Keyboard operation failed:"));
    assert_eq!(error.data.unwrap()["error_code"], json!("TYPE_VALUE_FAILED"));
    // The literal before the failing key was applied; nothing after.
    assert_eq!(page.key_log(), vec!["type:a"]);
}

#[tokio::test(start_paused = true)]
async fn keyboard_mode_on_a_button_still_works() {
    // Keyboard macros bypass the value-setting strategy entirely.
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::new("button").with_text("Go")]);

    let result = result_of(
        call(
            &dispatcher,
            "type_value",
            json!({"element_index": 0, "value": "{Enter}", "keyboard_mode": true}),
        )
        .await,
    );
    assert_eq!(result["input_method"], json!("keyboard"));
    assert_eq!(page.key_log(), vec!["press:Enter"]);
    // Buttons are not typeable, so nothing was cleared.
    assert_eq!(page.element_at(0).clear_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn type_value_submit_appends_enter_after_the_sequence() {
    let (dispatcher, page) = dispatcher_with(vec![FakeElement::input("text")]);

    result_of(
        call(
            &dispatcher,
            "type_value",
            json!({
                "element_index": 0,
                "value": "x{Tab}",
                "options": {"submit": true, "clear_first": false},
            }),
        )
        .await,
    );
    assert_eq!(page.key_log(), vec!["type:x", "press:Tab", "press:Enter"]);
}

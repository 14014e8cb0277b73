//! Input-strategy classification.

use crate::dom::ElementDescriptor;

/// Classified element kind. Drives the input method, timeout factors and
/// the `element_type` field of result payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    TextInput,
    Textarea,
    ContentEditable,
    Select,
    MultiSelect,
    Checkbox,
    Radio,
    File,
    /// Page-level keyboard input; never produced by classification.
    Keyboard,
    /// Anything the executor cannot drive; carries the tag name.
    Unsupported(String),
}

impl ElementKind {
    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::TextInput => "text-input",
            ElementKind::Textarea => "textarea",
            ElementKind::ContentEditable => "contenteditable",
            ElementKind::Select => "select",
            ElementKind::MultiSelect => "multi-select",
            ElementKind::Checkbox => "checkbox",
            ElementKind::Radio => "radio",
            ElementKind::File => "file",
            ElementKind::Keyboard => "keyboard",
            ElementKind::Unsupported(tag) => tag,
        }
    }
}

/// How a classified element is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMethod {
    Type,
    SingleSelect,
    MultiSelect,
    Toggle,
    Upload,
    Unknown,
}

impl InputMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMethod::Type => "type",
            InputMethod::SingleSelect => "single-select",
            InputMethod::MultiSelect => "multi-select",
            InputMethod::Toggle => "toggle",
            InputMethod::Upload => "upload",
            InputMethod::Unknown => "unknown",
        }
    }
}

/// Derived, stateless classification.
///
/// Recomputed per request and never cached: the live document may have
/// changed between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct InputStrategy {
    pub kind: ElementKind,
    pub method: InputMethod,
    pub can_handle: bool,
}

/// Tags the executor can drive, surfaced in unsupported-element errors.
pub const SUPPORTED_TAGS: [&str; 4] = ["input", "select", "textarea", "contenteditable"];

/// Classify an element descriptor. Pure function of tag, subtype and
/// editability.
pub fn resolve_strategy(descriptor: &ElementDescriptor) -> InputStrategy {
    let tag = descriptor.tag_name.to_lowercase();

    if tag == "select" {
        return if descriptor.is_multiple() {
            InputStrategy {
                kind: ElementKind::MultiSelect,
                method: InputMethod::MultiSelect,
                can_handle: true,
            }
        } else {
            InputStrategy {
                kind: ElementKind::Select,
                method: InputMethod::SingleSelect,
                can_handle: true,
            }
        };
    }

    if tag == "input" {
        return match descriptor.input_type().as_str() {
            "checkbox" => InputStrategy {
                kind: ElementKind::Checkbox,
                method: InputMethod::Toggle,
                can_handle: true,
            },
            "radio" => InputStrategy {
                kind: ElementKind::Radio,
                method: InputMethod::Toggle,
                can_handle: true,
            },
            // File uploads are explicitly unsupported.
            "file" => InputStrategy {
                kind: ElementKind::File,
                method: InputMethod::Upload,
                can_handle: false,
            },
            // text, password, email, tel, url, search, number, date, time,
            // datetime-local, month, week, and unknown subtypes all type.
            _ => InputStrategy {
                kind: ElementKind::TextInput,
                method: InputMethod::Type,
                can_handle: true,
            },
        };
    }

    if tag == "textarea" {
        return InputStrategy {
            kind: ElementKind::Textarea,
            method: InputMethod::Type,
            can_handle: true,
        };
    }

    if descriptor.is_content_editable() {
        return InputStrategy {
            kind: ElementKind::ContentEditable,
            method: InputMethod::Type,
            can_handle: true,
        };
    }

    InputStrategy {
        kind: ElementKind::Unsupported(tag),
        method: InputMethod::Unknown,
        can_handle: false,
    }
}

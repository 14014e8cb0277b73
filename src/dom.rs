//! Read-only element descriptors from the collaborator inventory.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Attribute snapshot for an interactive element.
///
/// Only the attributes the locator and strategy resolver consult; the
/// inventory owner may track more.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementAttributes {
    pub id: Option<String>,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub title: Option<String>,
    pub value: Option<String>,
    pub aria_label: Option<String>,
    /// Input subtype (`type` attribute).
    pub r#type: Option<String>,
    /// Present (any value) on multi-selects.
    pub multiple: Option<String>,
    pub contenteditable: Option<String>,
}

/// Read-only snapshot of one element in the inventory.
///
/// Owned by the external DOM-extraction collaborator; this core only reads
/// it. All mutation goes through [`crate::page::ElementHandle`] primitives
/// on the live element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Tag name (lowercase by convention; classification lowercases again).
    pub tag_name: String,

    pub attributes: ElementAttributes,

    /// Visible text content up to the next clickable element.
    #[serde(default)]
    pub text: String,
}

impl ElementDescriptor {
    /// Input subtype, defaulting to `text` like the DOM does.
    pub fn input_type(&self) -> String {
        self.attributes
            .r#type
            .as_deref()
            .unwrap_or("text")
            .to_lowercase()
    }

    pub fn is_multiple(&self) -> bool {
        self.attributes.multiple.is_some()
    }

    pub fn is_content_editable(&self) -> bool {
        self.attributes.contenteditable.as_deref() == Some("true")
    }

    /// The `element_info` payload echoed in every success result.
    pub fn info(&self) -> serde_json::Value {
        let attr = |a: &Option<String>| a.clone().unwrap_or_default();
        json!({
            "tag_name": self.tag_name,
            "text": self.text,
            "placeholder": attr(&self.attributes.placeholder),
            "name": attr(&self.attributes.name),
            "id": attr(&self.attributes.id),
            "type": attr(&self.attributes.r#type),
        })
    }
}

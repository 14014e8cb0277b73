//! Capability traits for the live document.
//!
//! The host injects these into the dispatcher; the core never reaches the
//! document through ambient lookup. The surface is deliberately narrow so
//! the whole pipeline runs against the in-memory fakes in
//! [`crate::testing`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::dom::ElementDescriptor;
use crate::error::DriverError;

/// Geometry and interactability probe of a live element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementState {
    /// Bounding-box width in CSS pixels.
    pub width: f64,
    /// Bounding-box height in CSS pixels.
    pub height: f64,
    /// False when hidden by visibility/display/opacity styling.
    pub visible: bool,
    pub disabled: bool,
    pub read_only: bool,
}

/// One `<option>` of a select element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// DOM events the executor dispatches after mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
}

/// Live-element interaction primitives.
///
/// The only write path into the document. Implementations wrap whatever
/// evaluation mechanism the host has (CDP `Runtime.callFunctionOn`,
/// injected scripts, a fake in tests).
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Probe geometry, styling and disabled/readonly state.
    async fn state(&self) -> Result<ElementState, DriverError>;

    /// Scroll the element into centered view.
    async fn scroll_into_view(&self) -> Result<(), DriverError>;

    async fn focus(&self) -> Result<(), DriverError>;

    /// Empty the value (or text content for contenteditable) and fire an
    /// input event.
    async fn clear(&self) -> Result<(), DriverError>;

    /// Type text into the element with a per-character delay.
    async fn type_text(&self, text: &str, char_delay: Duration) -> Result<(), DriverError>;

    /// Dispatch a bubbling DOM event on the element.
    async fn dispatch(&self, event: DomEvent) -> Result<(), DriverError>;

    /// Read back the live value (text content for contenteditable).
    async fn read_value(&self) -> Result<String, DriverError>;

    /// Options of a select element, in document order.
    async fn options(&self) -> Result<Vec<SelectOption>, DriverError>;

    /// Replace the selection with exactly the given option indices.
    async fn set_selected(&self, indices: &[usize]) -> Result<(), DriverError>;

    async fn is_checked(&self) -> Result<bool, DriverError>;

    async fn set_checked(&self, checked: bool) -> Result<(), DriverError>;
}

/// One rendered page: the element inventory plus page-level keyboard.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Number of elements currently in the interactive-element inventory.
    async fn inventory_size(&self) -> usize;

    /// Descriptor snapshot for an inventory index.
    async fn descriptor(&self, index: usize) -> Option<ElementDescriptor>;

    /// Full inventory in iteration order.
    async fn inventory(&self) -> Vec<(usize, ElementDescriptor)>;

    /// Resolve an inventory index to a live element handle.
    async fn element(&self, index: usize) -> Result<Arc<dyn ElementHandle>, DriverError>;

    /// Type literal text through the page keyboard.
    async fn keyboard_type(&self, text: &str) -> Result<(), DriverError>;

    /// Press and release a key.
    async fn key_press(&self, key: &str) -> Result<(), DriverError>;

    async fn key_down(&self, key: &str) -> Result<(), DriverError>;

    async fn key_up(&self, key: &str) -> Result<(), DriverError>;

    /// Wait until the document reaches steady state after an action.
    async fn wait_for_settled(&self) -> Result<(), DriverError>;
}

/// Source of the currently active page.
#[async_trait]
pub trait PageProvider: Send + Sync {
    async fn current_page(&self) -> Option<Arc<dyn PageDriver>>;
}

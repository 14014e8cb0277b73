//! In-memory fakes for driving the pipeline without a browser.
//!
//! The capability traits in [`crate::page`] are narrow enough that a form
//! document can be simulated entirely in memory. Tests build pages out of
//! [`FakeElement`]s, hand them to the dispatcher through [`FakePages`],
//! and assert on envelopes and recorded interactions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::dom::ElementDescriptor;
use crate::error::DriverError;
use crate::page::{
    DomEvent, ElementHandle, ElementState, PageDriver, PageProvider, SelectOption,
};

#[derive(Debug, Default)]
struct FakeElementInner {
    value: String,
    checked: bool,
    options: Vec<SelectOption>,
    state: ElementState,
    events: Vec<DomEvent>,
    typed: Vec<String>,
    cleared: u32,
    focused: u32,
    scrolled: u32,
    /// Remaining `type_text` calls that fail before succeeding.
    fail_type: u32,
}

/// One simulated form element with recorded interactions.
pub struct FakeElement {
    descriptor: ElementDescriptor,
    inner: Mutex<FakeElementInner>,
}

impl FakeElement {
    /// A visible, enabled element of the given tag.
    pub fn new(tag: &str) -> Self {
        Self {
            descriptor: ElementDescriptor {
                tag_name: tag.into(),
                ..Default::default()
            },
            inner: Mutex::new(FakeElementInner {
                state: ElementState {
                    width: 120.0,
                    height: 24.0,
                    visible: true,
                    ..Default::default()
                },
                ..Default::default()
            }),
        }
    }

    pub fn input(subtype: &str) -> Self {
        let mut element = Self::new("input");
        element.descriptor.attributes.r#type = Some(subtype.into());
        element
    }

    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    pub fn content_editable() -> Self {
        let mut element = Self::new("div");
        element.descriptor.attributes.contenteditable = Some("true".into());
        element
    }

    /// Single select with `(value, display text)` options.
    pub fn select(options: &[(&str, &str)]) -> Self {
        let element = Self::new("select");
        element.inner.lock().options = options
            .iter()
            .map(|(value, text)| SelectOption {
                value: (*value).into(),
                text: (*text).into(),
                selected: false,
            })
            .collect();
        element
    }

    pub fn multi_select(options: &[(&str, &str)]) -> Self {
        let mut element = Self::select(options);
        element.descriptor.attributes.multiple = Some(String::new());
        element
    }

    pub fn checkbox(checked: bool) -> Self {
        let element = Self::input("checkbox");
        element.inner.lock().checked = checked;
        element
    }

    pub fn radio(checked: bool) -> Self {
        let element = Self::input("radio");
        element.inner.lock().checked = checked;
        element
    }

    // Descriptor builders.

    pub fn with_name(mut self, name: &str) -> Self {
        self.descriptor.attributes.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.descriptor.attributes.id = Some(id.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.descriptor.attributes.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.descriptor.attributes.title = Some(title.into());
        self
    }

    pub fn with_aria_label(mut self, label: &str) -> Self {
        self.descriptor.attributes.aria_label = Some(label.into());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.descriptor.text = text.into();
        self
    }

    /// Pre-existing live value.
    pub fn with_value(self, value: &str) -> Self {
        self.inner.lock().value = value.into();
        self
    }

    // Live-state builders.

    pub fn hidden(self) -> Self {
        self.inner.lock().state.visible = false;
        self
    }

    pub fn disabled(self) -> Self {
        self.inner.lock().state.disabled = true;
        self
    }

    pub fn read_only(self) -> Self {
        self.inner.lock().state.read_only = true;
        self
    }

    /// Make the next `attempts` calls to `type_text` fail.
    pub fn fail_next_type(&self, attempts: u32) {
        self.inner.lock().fail_type = attempts;
    }

    // Inspection.

    pub fn descriptor(&self) -> ElementDescriptor {
        self.descriptor.clone()
    }

    pub fn live_value(&self) -> String {
        self.inner.lock().value.clone()
    }

    pub fn recorded_events(&self) -> Vec<DomEvent> {
        self.inner.lock().events.clone()
    }

    pub fn typed_chunks(&self) -> Vec<String> {
        self.inner.lock().typed.clone()
    }

    pub fn checked_now(&self) -> bool {
        self.inner.lock().checked
    }

    pub fn selected_texts(&self) -> Vec<String> {
        self.inner
            .lock()
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.text.clone())
            .collect()
    }

    pub fn clear_count(&self) -> u32 {
        self.inner.lock().cleared
    }

    pub fn focus_count(&self) -> u32 {
        self.inner.lock().focused
    }

    pub fn scroll_count(&self) -> u32 {
        self.inner.lock().scrolled
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn state(&self) -> Result<ElementState, DriverError> {
        Ok(self.inner.lock().state)
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        self.inner.lock().scrolled += 1;
        Ok(())
    }

    async fn focus(&self) -> Result<(), DriverError> {
        self.inner.lock().focused += 1;
        Ok(())
    }

    async fn clear(&self) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        inner.value.clear();
        inner.cleared += 1;
        inner.events.push(DomEvent::Input);
        Ok(())
    }

    async fn type_text(&self, text: &str, _char_delay: Duration) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        if inner.fail_type > 0 {
            inner.fail_type -= 1;
            return Err(DriverError::ActionFailed("synthetic type failure".into()));
        }
        inner.value.push_str(text);
        inner.typed.push(text.into());
        Ok(())
    }

    async fn dispatch(&self, event: DomEvent) -> Result<(), DriverError> {
        self.inner.lock().events.push(event);
        Ok(())
    }

    async fn read_value(&self) -> Result<String, DriverError> {
        Ok(self.inner.lock().value.clone())
    }

    async fn options(&self) -> Result<Vec<SelectOption>, DriverError> {
        Ok(self.inner.lock().options.clone())
    }

    async fn set_selected(&self, indices: &[usize]) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        for (index, option) in inner.options.iter_mut().enumerate() {
            option.selected = indices.contains(&index);
        }
        if let Some(first) = indices.first().and_then(|i| inner.options.get(*i)) {
            inner.value = first.value.clone();
        }
        Ok(())
    }

    async fn is_checked(&self) -> Result<bool, DriverError> {
        Ok(self.inner.lock().checked)
    }

    async fn set_checked(&self, checked: bool) -> Result<(), DriverError> {
        self.inner.lock().checked = checked;
        Ok(())
    }
}

/// One simulated page: an element inventory plus a page-level key log.
pub struct FakePage {
    elements: Vec<Arc<FakeElement>>,
    keys: Mutex<Vec<String>>,
    fail_press: Mutex<Option<String>>,
    settled: Mutex<u32>,
}

impl FakePage {
    pub fn new(elements: Vec<Arc<FakeElement>>) -> Self {
        Self {
            elements,
            keys: Mutex::new(Vec::new()),
            fail_press: Mutex::new(None),
            settled: Mutex::new(0),
        }
    }

    pub fn element_at(&self, index: usize) -> Arc<FakeElement> {
        self.elements[index].clone()
    }

    /// Recorded page-level keyboard events, in order, as
    /// `type:`/`press:`/`down:`/`up:` prefixed entries.
    pub fn key_log(&self) -> Vec<String> {
        self.keys.lock().clone()
    }

    /// Make presses of the given key fail.
    pub fn fail_key_press(&self, key: &str) {
        *self.fail_press.lock() = Some(key.into());
    }

    pub fn settle_count(&self) -> u32 {
        *self.settled.lock()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn inventory_size(&self) -> usize {
        self.elements.len()
    }

    async fn descriptor(&self, index: usize) -> Option<ElementDescriptor> {
        self.elements.get(index).map(|e| e.descriptor())
    }

    async fn inventory(&self) -> Vec<(usize, ElementDescriptor)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(index, element)| (index, element.descriptor()))
            .collect()
    }

    async fn element(&self, index: usize) -> Result<Arc<dyn ElementHandle>, DriverError> {
        self.elements
            .get(index)
            .cloned()
            .map(|element| element as Arc<dyn ElementHandle>)
            .ok_or_else(|| {
                DriverError::ActionFailed("Element could not be located on the page".into())
            })
    }

    async fn keyboard_type(&self, text: &str) -> Result<(), DriverError> {
        self.keys.lock().push(format!("type:{text}"));
        Ok(())
    }

    async fn key_press(&self, key: &str) -> Result<(), DriverError> {
        if self.fail_press.lock().as_deref() == Some(key) {
            return Err(DriverError::ActionFailed(format!("key press failed: {key}")));
        }
        self.keys.lock().push(format!("press:{key}"));
        Ok(())
    }

    async fn key_down(&self, key: &str) -> Result<(), DriverError> {
        self.keys.lock().push(format!("down:{key}"));
        Ok(())
    }

    async fn key_up(&self, key: &str) -> Result<(), DriverError> {
        self.keys.lock().push(format!("up:{key}"));
        Ok(())
    }

    async fn wait_for_settled(&self) -> Result<(), DriverError> {
        *self.settled.lock() += 1;
        Ok(())
    }
}

/// Provider holding at most one current page.
pub struct FakePages {
    page: Mutex<Option<Arc<FakePage>>>,
}

impl FakePages {
    pub fn single(page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new(Some(page)),
        })
    }

    /// No active page; requests fail with the no-page application error.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new(None),
        })
    }
}

#[async_trait]
impl PageProvider for FakePages {
    async fn current_page(&self) -> Option<Arc<dyn PageDriver>> {
        self.page
            .lock()
            .clone()
            .map(|page| page as Arc<dyn PageDriver>)
    }
}

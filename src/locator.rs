//! Target resolution against the element inventory.

use crate::dom::ElementDescriptor;
use crate::page::PageDriver;

/// Target specifier for the two RPC operations.
///
/// Exactly one resolution strategy applies per kind: indices hit the
/// inventory directly, descriptions scan it in iteration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Index(i64),
    Description(String),
}

/// Successfully resolved target.
#[derive(Debug, Clone)]
pub struct LocatedElement {
    pub index: usize,
    pub descriptor: ElementDescriptor,
}

/// Locate failure with a human-readable reason.
///
/// Deliberately not a [`crate::error::DriverError`]: the dispatcher
/// enriches it with inventory context before wrapping, so it must not
/// bypass that path.
#[derive(Debug, Clone)]
pub struct LocateFailure {
    pub reason: String,
}

/// Resolve a target specifier to an inventory element.
pub async fn locate(
    page: &dyn PageDriver,
    target: &Target,
) -> Result<LocatedElement, LocateFailure> {
    match target {
        Target::Index(index) => {
            let descriptor = if *index >= 0 {
                page.descriptor(*index as usize).await
            } else {
                None
            };
            match descriptor {
                Some(descriptor) => Ok(LocatedElement {
                    index: *index as usize,
                    descriptor,
                }),
                None => Err(LocateFailure {
                    reason: format!("Element with index {index} not found in DOM state"),
                }),
            }
        }
        Target::Description(description) => {
            for (index, descriptor) in page.inventory().await {
                if matches_description(&descriptor, description) {
                    return Ok(LocatedElement { index, descriptor });
                }
            }
            Err(LocateFailure {
                reason: format!("No element found matching description: \"{description}\""),
            })
        }
    }
}

/// Ordered substring match, case-insensitive and trimmed.
///
/// Cheap attributes first (placeholder, name, id), then visible text, then
/// the remaining attributes (aria-label, title, value). First hit wins.
pub fn matches_description(descriptor: &ElementDescriptor, description: &str) -> bool {
    let needle = description.trim().to_lowercase();
    let attrs = &descriptor.attributes;

    for attr in [&attrs.placeholder, &attrs.name, &attrs.id] {
        if attr_contains(attr, &needle) {
            return true;
        }
    }

    if !descriptor.text.is_empty() && descriptor.text.to_lowercase().contains(&needle) {
        return true;
    }

    for attr in [&attrs.aria_label, &attrs.title, &attrs.value] {
        if attr_contains(attr, &needle) {
            return true;
        }
    }

    false
}

fn attr_contains(attr: &Option<String>, needle: &str) -> bool {
    attr.as_deref()
        .is_some_and(|a| a.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dom::ElementAttributes;
    use crate::testing::{FakeElement, FakePage};

    fn page_with(elements: Vec<FakeElement>) -> FakePage {
        FakePage::new(elements.into_iter().map(Arc::new).collect())
    }

    #[tokio::test]
    async fn index_lookup_returns_matching_descriptor() {
        let page = page_with(vec![
            FakeElement::input("text").with_name("first"),
            FakeElement::input("text").with_name("second"),
        ]);

        let located = locate(&page, &Target::Index(1)).await.unwrap();
        assert_eq!(located.index, 1);
        assert_eq!(located.descriptor.attributes.name.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn absent_index_is_a_failure_citing_the_index() {
        let page = page_with(vec![FakeElement::input("text")]);

        let failure = locate(&page, &Target::Index(7)).await.unwrap_err();
        assert_eq!(failure.reason, "Element with index 7 not found in DOM state");

        let failure = locate(&page, &Target::Index(-1)).await.unwrap_err();
        assert!(failure.reason.contains("index -1"));
    }

    #[tokio::test]
    async fn description_match_is_case_insensitive_and_trimmed() {
        let page = page_with(vec![
            FakeElement::input("text").with_name("unrelated"),
            FakeElement::input("email").with_placeholder("Your Email Address"),
        ]);

        let located = locate(&page, &Target::Description("  email ADDRESS  ".into()))
            .await
            .unwrap();
        assert_eq!(located.index, 1);
    }

    #[tokio::test]
    async fn first_inventory_match_wins() {
        let page = page_with(vec![
            FakeElement::input("text").with_name("billing-street"),
            FakeElement::input("text").with_name("shipping-street"),
        ]);

        let located = locate(&page, &Target::Description("street".into()))
            .await
            .unwrap();
        assert_eq!(located.index, 0);
    }

    #[tokio::test]
    async fn no_match_lists_the_attempted_description() {
        let page = page_with(vec![FakeElement::input("text")]);

        let failure = locate(&page, &Target::Description("phone number".into()))
            .await
            .unwrap_err();
        assert_eq!(
            failure.reason,
            "No element found matching description: \"phone number\""
        );
    }

    #[test]
    fn match_order_checks_text_and_slow_attributes() {
        let descriptor = ElementDescriptor {
            tag_name: "button".into(),
            attributes: ElementAttributes {
                aria_label: Some("Submit the order".into()),
                ..Default::default()
            },
            text: "Place order".into(),
        };

        assert!(matches_description(&descriptor, "place ORDER"));
        assert!(matches_description(&descriptor, "submit"));
        assert!(!matches_description(&descriptor, "cancel"));
    }
}

//! Form-driving RPC core for browser automation agents.
//!
//! An external controller (an AI agent or automation host) manipulates
//! form-like elements in a live, already-rendered document through a
//! JSON-RPC style request/response protocol: locate an element, decide how
//! it must be driven (typed, selected, toggled, or sent keyboard macros),
//! perform the action reliably, and report a verifiable result.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  RpcRequest   ┌────────────────┐   capability traits   ┌──────────────┐
//! │ Controller │ ────────────► │ FormDispatcher │ ◄───────────────────► │ Live document│
//! │ (MCP host) │ ◄──────────── │  (this crate)  │  PageDriver/Element   │  (external)  │
//! └────────────┘  RpcResponse  └────────────────┘        Handle         └──────────────┘
//! ```
//!
//! Control flow per request: the dispatcher validates params, the
//! [`locator`] resolves the target against the element inventory, the
//! [`strategy`] resolver classifies the element, [`timing`] derives the
//! advisory operation budget and settle delay, then either the
//! [`executor`] or the [`keyboard`] interpreter performs the action and
//! the dispatcher wraps the outcome into a uniform envelope. Nothing below
//! the dispatcher boundary escapes un-wrapped.
//!
//! ## Collaborators
//!
//! The live document is never reached through globals. The host injects
//! implementations of [`page::PageProvider`], [`page::PageDriver`] and
//! [`page::ElementHandle`]; the [`testing`] module ships in-memory fakes so
//! the whole pipeline runs without a browser.
//!
//! ## Operations
//!
//! - `set_value` - set a value on an element targeted by index or by a
//!   free-text description.
//! - `type_value` - type into an element by index, with an optional
//!   keyboard-macro mode (`"hi {Tab}there"`, `"{Ctrl+A}{Delete}"`).
//!
//! File uploads are explicitly unsupported and reported as such.

pub mod dom;
pub mod error;
pub mod executor;
pub mod keyboard;
pub mod locator;
pub mod page;
pub mod rpc;
pub mod strategy;
pub mod testing;
pub mod timing;

pub use dom::{ElementAttributes, ElementDescriptor};
pub use error::{DriverError, FailureCode};
pub use executor::SetValueOptions;
pub use keyboard::KeyOperation;
pub use locator::{LocatedElement, Target};
pub use page::{DomEvent, ElementHandle, ElementState, PageDriver, PageProvider, SelectOption};
pub use rpc::{FormDispatcher, RpcError, RpcRequest, RpcResponse};
pub use strategy::{resolve_strategy, ElementKind, InputMethod, InputStrategy};
pub use timing::{PacingConfig, TimeoutSpec};

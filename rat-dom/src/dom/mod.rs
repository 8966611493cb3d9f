//! Node construction and event dispatch.
//!
//! `Node` is a retained element/text/fragment tree with attributes, inline style and
//! listeners. `el` builds elements from a tag, an attribute list and a children list;
//! `Document` owns the `#app` mount point and dispatches events with bubbling.

pub mod builder;
pub mod event;
pub mod html;
pub mod node;

pub use builder::{clear, el, fragment, replace, text, Attr, Child, Element};
pub use event::{Document, DomEvent, Handler};
pub use node::{Node, NodeId};

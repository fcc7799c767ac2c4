//! Accessibility-tree processing.
//!
//! Parses platform-specific tree dumps, prunes semantic noise, assigns dense
//! opaque element ids for model consumption, renders canonical XML, and maps
//! opaque ids back to raw driver ids. Also hosts the structural diff engine
//! used by the changes analyzer.

pub mod chromium;
pub mod diff;
pub mod mobile;
pub mod node;
pub mod tree;

pub use node::Node;
pub use tree::{AccessibilityTree, Platform};

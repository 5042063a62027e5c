//! Message templates and their compiled matchers
//!
//! Templates describe the shape of a device message. They are parsed and
//! compiled exactly once, when the parser is constructed.

pub mod matcher;
pub mod syntax;

// Re-export key types for convenience
pub use matcher::{Matcher, TemplateOptions};
pub use syntax::{Capture, CaptureKind, Segment, Template};

//! Pan, zoom and drag for diagrams embedded in a document view.
//!
//! The [`viewport::Engine`] watches a [`document::DocumentTree`], wraps each
//! diagram element in a clipped container with its own transform, builds
//! on-screen control panels and reconciles drag, wheel and button input into
//! that transform. [`settings`] holds the user configuration, including the
//! edge-snapping panel layout editor.

pub mod document;
pub mod error;
pub mod geometry;
pub mod markdown;
pub mod render;
pub mod settings;
pub mod viewport;

pub use error::{Error, Result};

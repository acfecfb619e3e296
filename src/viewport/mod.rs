//! Pan, zoom and drag viewports for diagrams embedded in a document.

pub mod fit;
pub mod input;
pub mod instance;
pub mod panel;
pub mod supervisor;
pub mod transform;

pub use fit::{FitPolicy, FitScheduler, fit_transform};
pub use input::{DragState, InputEvent, InputOutcome, InputReconciler, PointerButton};
pub use instance::DiagramInstance;
pub use panel::PanelAction;
pub use supervisor::{DiscoveryAdapter, DocumentMode, Engine, EngineOptions, LivePreviewAdapter, RenderedAdapter};
pub use transform::Transform;

/// Class of a diagram element.
pub const DIAGRAM_CLASS: &str = "mermaid";
/// Class of the viewport container wrapping a diagram element.
pub const CONTAINER_CLASS: &str = "mermaid-container";
/// Marker class of a container whose input listeners are attached.
pub const BOUND_CLASS: &str = "events-bound";
/// Class of a diagram source code block in live preview.
pub const CODE_LANGUAGE_CLASS: &str = "language-mermaid";

use crate::document::NodeId;

use super::transform::Transform;

/// One diagram element together with the viewport container wrapping it.
#[derive(Clone, Debug)]
pub struct DiagramInstance {
    raw_content: String,
    container: NodeId,
    element: NodeId,
    pub(crate) transform: Transform,
    pub(crate) bound: bool,
    pub(crate) panel_hidden: bool,
    pub(crate) folded: bool,
    pub(crate) fitted: bool,
}

impl DiagramInstance {
    pub(crate) fn new(raw_content: String, container: NodeId, element: NodeId) -> Self {
        Self {
            raw_content,
            container,
            element,
            transform: Transform::default(),
            bound: false,
            panel_hidden: false,
            folded: false,
            fitted: false,
        }
    }

    /// Diagram source text captured when the instance was created.
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Points the instance at a diagram element the host swapped in. The new
    /// element still needs its initial fit.
    pub(crate) fn rebind(&mut self, element: NodeId, raw_content: String) {
        self.element = element;
        self.raw_content = raw_content;
        self.fitted = false;
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn is_panel_hidden(&self) -> bool {
        self.panel_hidden
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Whether an auto-fit has been applied at least once.
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}

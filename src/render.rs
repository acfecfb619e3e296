//! Diagram measurement seam between the host's renderer and the engine.
//!
//! The engine never renders diagrams. It only needs the natural size of the
//! rendered content (`scroll_size`) to fit it, which a [`DiagramRenderer`]
//! provides once it has laid the source out.

use crate::document::DocumentTree;
use crate::geometry::Size;
use crate::viewport::Engine;

pub trait DiagramRenderer {
    /// Natural size of the rendering of `source`, or `None` while it is not
    /// available yet.
    fn measure(&mut self, source: &str) -> Option<Size>;
}

/// Writes measurements for every diagram that does not have one yet.
/// Returns how many elements were measured.
pub fn sync_measurements(
    engine: &Engine,
    doc: &mut DocumentTree,
    renderer: &mut dyn DiagramRenderer,
) -> usize {
    let mut measured = 0;
    for instance in engine.instances() {
        let element = instance.element();
        if doc.scroll_size(element).is_measurable() {
            continue;
        }
        if let Some(size) = renderer.measure(instance.raw_content()) {
            doc.set_scroll_size(element, size);
            measured += 1;
        }
    }
    measured
}

/// Lays diagram source out as a monospace text card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceCard {
    pub char_width: f32,
    pub line_height: f32,
    pub padding: f32,
}

impl Default for SourceCard {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 18.0,
            padding: 16.0,
        }
    }
}

impl SourceCard {
    pub fn layout(&self, source: &str) -> Size {
        let lines = source.lines().count().max(1);
        let columns = source
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        Size::new(
            columns as f32 * self.char_width + 2.0 * self.padding,
            lines as f32 * self.line_height + 2.0 * self.padding,
        )
    }
}

impl DiagramRenderer for SourceCard {
    fn measure(&mut self, source: &str) -> Option<Size> {
        if source.trim().is_empty() {
            return None;
        }
        Some(self.layout(source))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::viewport::{DIAGRAM_CLASS, Engine};

    #[test]
    fn test_source_card_layout() {
        let card = SourceCard::default();
        let size = card.layout("graph TD\nA-->B");
        assert_approx_eq!(f32, size.width, 8.0 * 8.0 + 32.0);
        assert_approx_eq!(f32, size.height, 2.0 * 18.0 + 32.0);
    }

    #[test]
    fn test_empty_source_is_not_measurable() {
        assert_eq!(SourceCard::default().measure("  \n"), None);
    }

    #[test]
    fn test_sync_measures_only_once() {
        let mut doc = DocumentTree::new();
        let root = doc.root();
        let diagram = doc.create_element("div");
        doc.add_class(diagram, DIAGRAM_CLASS);
        doc.set_text(diagram, "graph LR\nA-->B");
        doc.append_child(root, diagram);

        let mut engine = Engine::default();
        engine.observe(&mut doc, root);
        let mut card = SourceCard::default();
        assert_eq!(sync_measurements(&engine, &mut doc, &mut card), 1);
        assert!(doc.scroll_size(diagram).is_measurable());
        assert_eq!(sync_measurements(&engine, &mut doc, &mut card), 0);
    }
}

//! Discovery of diagram elements and the lifecycle of their viewports.
//!
//! The [`Engine`] watches document subtrees, wraps every new diagram element
//! in a clipped container, builds its control panels, schedules an initial
//! fit and binds input. All state is kept per container; nothing is shared
//! between diagrams.

use std::collections::HashMap;

use log::{debug, info, trace};

use crate::document::{DocumentTree, NodeId};
use crate::settings::{PanelsConfig, Settings};

use super::fit::{FitPoll, FitPolicy, FitScheduler, fit_transform};
use super::input::{InputEvent, InputOutcome, InputReconciler};
use super::instance::DiagramInstance;
use super::panel::{self, PanelAction};
use super::{CODE_LANGUAGE_CLASS, CONTAINER_CLASS, DIAGRAM_CLASS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocumentMode {
    /// Diagrams arrive already rendered as `.mermaid` elements.
    #[default]
    Rendered,
    /// Diagrams are still source code blocks that have to be turned into
    /// diagram elements first.
    LivePreview,
}

/// Produces the diagram elements of a freshly added subtree.
pub trait DiscoveryAdapter {
    fn discover(&self, doc: &mut DocumentTree, root: NodeId) -> Vec<NodeId>;
}

fn with_class_inclusive(doc: &DocumentTree, root: NodeId, class: &str) -> Vec<NodeId> {
    doc.subtree(root)
        .into_iter()
        .filter(|id| doc.has_class(*id, class))
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderedAdapter;

impl DiscoveryAdapter for RenderedAdapter {
    fn discover(&self, doc: &mut DocumentTree, root: NodeId) -> Vec<NodeId> {
        with_class_inclusive(doc, root, DIAGRAM_CLASS)
    }
}

/// Replaces every `pre > code.language-mermaid` block with a `div.mermaid`
/// carrying the code text.
#[derive(Clone, Copy, Debug, Default)]
pub struct LivePreviewAdapter;

impl DiscoveryAdapter for LivePreviewAdapter {
    fn discover(&self, doc: &mut DocumentTree, root: NodeId) -> Vec<NodeId> {
        let blocks: Vec<NodeId> = with_class_inclusive(doc, root, CODE_LANGUAGE_CLASS)
            .into_iter()
            .filter(|code| {
                doc.parent(*code)
                    .is_some_and(|pre| doc.tag(pre) == Some("pre"))
            })
            .collect();

        let mut diagrams = Vec::new();
        for code in blocks {
            let Some(pre) = doc.parent(code) else {
                continue;
            };
            let source = doc.text(code).to_string();
            let diagram = doc.create_element("div");
            doc.add_class(diagram, DIAGRAM_CLASS);
            doc.set_text(diagram, source);
            if !doc.replace_with(pre, diagram) {
                doc.remove(diagram);
                continue;
            }
            trace!(block = pre.to_string(), diagram = diagram.to_string(); "Converted code block");
            diagrams.push(diagram);
        }

        // root is gone if it was one of the replaced blocks
        if doc.contains(root) {
            for existing in with_class_inclusive(doc, root, DIAGRAM_CLASS) {
                if !diagrams.contains(&existing) {
                    diagrams.push(existing);
                }
            }
        }
        diagrams
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    pub panels: PanelsConfig,
    pub collapse_by_default: bool,
    pub fit: FitPolicy,
    /// CSS height of an expanded container.
    pub expanded_height: String,
    /// CSS height of a folded container.
    pub folded_height: String,
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            panels: settings.panels_config.clone(),
            collapse_by_default: settings.collapse_by_default,
            fit: FitPolicy {
                max_attempts: settings.fit_max_attempts.max(1),
            },
            expanded_height: settings.diagram_size.expanded_css(),
            folded_height: settings.diagram_size.folded_css(),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

#[derive(Debug, Default)]
pub struct Engine {
    mode: DocumentMode,
    options: EngineOptions,
    instances: HashMap<NodeId, DiagramInstance>,
    input: InputReconciler,
    fits: FitScheduler,
}

impl Engine {
    pub fn new(mode: DocumentMode, options: EngineOptions) -> Self {
        Self {
            mode,
            fits: FitScheduler::new(options.fit),
            options,
            instances: HashMap::new(),
            input: InputReconciler::new(),
        }
    }

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    /// Switches the discovery adapter used for subsequent passes.
    pub fn set_mode(&mut self, mode: DocumentMode) {
        self.mode = mode;
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Applies new options to every live container.
    pub fn set_options(&mut self, doc: &mut DocumentTree, options: EngineOptions) {
        self.fits.set_policy(options.fit);
        self.options = options;
        for instance in self.instances.values_mut() {
            let container = instance.container();
            panel::build_control_panel(
                doc,
                container,
                &self.options.panels,
                instance.panel_hidden,
                instance.folded,
            );
            // the toggle lives in the move grid, so nothing could show them again
            if instance.panel_hidden
                && panel::find_button(doc, container, PanelAction::ToggleHide).is_none()
            {
                instance.panel_hidden = false;
                panel::apply_hidden(doc, container, false);
            }
        }
        for instance in self.instances.values() {
            self.apply_container_height(doc, instance);
        }
    }

    pub fn instance(&self, container: NodeId) -> Option<&DiagramInstance> {
        self.instances.get(&container)
    }

    pub fn instances(&self) -> impl Iterator<Item = &DiagramInstance> {
        self.instances.values()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn input(&self) -> &InputReconciler {
        &self.input
    }

    pub fn is_fit_pending(&self, container: NodeId) -> bool {
        self.fits.is_pending(container)
    }

    pub fn has_pending_fits(&self) -> bool {
        !self.fits.is_empty()
    }

    /// Nearest container around `node` (inclusive) that has an instance.
    pub fn container_of(&self, doc: &DocumentTree, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.instances.contains_key(&id) {
                return Some(id);
            }
            current = doc.parent(id);
        }
        None
    }

    /// Watches `root` for added content and attaches everything already there.
    pub fn observe(&mut self, doc: &mut DocumentTree, root: NodeId) -> Vec<NodeId> {
        doc.observe(root);
        self.attach_subtree(doc, root)
    }

    /// Runs the active discovery adapter over `root` and attaches every
    /// diagram that is not wrapped yet. Returns the new containers.
    pub fn attach_subtree(&mut self, doc: &mut DocumentTree, root: NodeId) -> Vec<NodeId> {
        if !doc.is_attached(root) {
            return Vec::new();
        }
        let elements = match self.mode {
            DocumentMode::Rendered => RenderedAdapter.discover(doc, root),
            DocumentMode::LivePreview => LivePreviewAdapter.discover(doc, root),
        };
        elements
            .into_iter()
            .filter_map(|element| self.attach(doc, element))
            .collect()
    }

    /// Drains the document's mutation records. Only added subtrees are
    /// scanned; removals drop the instances that left the document.
    pub fn process_mutations(&mut self, doc: &mut DocumentTree) -> Vec<NodeId> {
        let records = doc.take_records();
        if records.is_empty() {
            return Vec::new();
        }
        let mut attached = Vec::new();
        let mut saw_removal = false;
        for record in records {
            saw_removal |= !record.removed.is_empty();

            if let Some(container) = self.container_of(doc, record.target) {
                self.refit_if_unfitted(doc, container);
            }
            for node in record.added {
                if !doc.is_attached(node) {
                    continue;
                }
                attached.extend(self.attach_subtree(doc, node));
            }
        }
        if saw_removal {
            self.forget_detached(doc);
        }
        attached
    }

    /// Drops instances whose container is no longer in the document.
    pub fn forget_detached(&mut self, doc: &DocumentTree) -> Vec<NodeId> {
        let gone: Vec<NodeId> = self
            .instances
            .keys()
            .copied()
            .filter(|c| !doc.is_attached(*c))
            .collect();
        for container in &gone {
            self.instances.remove(container);
            self.input.unbind(*container);
            self.fits.cancel(*container);
            debug!(container = container.to_string(); "Forgot detached diagram");
        }
        gone
    }

    /// Host frame hook: retries pending fits. Returns the fitted containers.
    pub fn tick(&mut self, doc: &mut DocumentTree) -> Vec<NodeId> {
        if self.fits.is_empty() {
            return Vec::new();
        }
        let Self {
            fits, instances, ..
        } = self;
        fits.poll(|container| {
            let Some(instance) = instances.get_mut(&container) else {
                return FitPoll::Gone;
            };
            if !doc.is_attached(container) || instance.folded {
                return FitPoll::Gone;
            }
            if doc.parent(instance.element()) != Some(container) {
                return FitPoll::Gone;
            }
            let content = doc.scroll_size(instance.element());
            let size = doc.client_size(container);
            match fit_transform(content, size) {
                Some(t) => {
                    instance.transform = t;
                    instance.fitted = true;
                    project(doc, instance);
                    debug!(container = container.to_string(), scale = t.scale; "Fitted diagram");
                    FitPoll::Ready
                }
                None => FitPoll::NotReady,
            }
        })
    }

    /// Feeds a pointer or wheel event to the container's listeners and
    /// re-projects its transform.
    pub fn handle_input(
        &mut self,
        doc: &mut DocumentTree,
        container: NodeId,
        event: InputEvent,
    ) -> InputOutcome {
        if self.live_element(doc, container).is_none() {
            return InputOutcome::PassThrough;
        }
        let Some(instance) = self.instances.get_mut(&container) else {
            return InputOutcome::PassThrough;
        };
        if instance.folded {
            return InputOutcome::PassThrough;
        }
        let outcome = self.input.dispatch(container, event, &mut instance.transform);
        let cursor = if self.input.drag_state(container).is_dragging() {
            "grabbing"
        } else {
            "grab"
        };
        doc.set_style(instance.element(), "cursor", cursor);
        project(doc, instance);
        outcome
    }

    /// Runs the action of a clicked panel button against its own container.
    /// Hidden buttons and buttons of collapsed panels do nothing.
    pub fn click(&mut self, doc: &mut DocumentTree, button: NodeId) -> Option<PanelAction> {
        if !panel::is_interactive(doc, button) {
            trace!(button = button.to_string(); "Ignoring click on hidden button");
            return None;
        }
        let action = panel::action_of(doc, button)?;
        let container = self.container_of(doc, button)?;
        self.dispatch_action(doc, container, action).then_some(action)
    }

    pub fn dispatch_action(
        &mut self,
        doc: &mut DocumentTree,
        container: NodeId,
        action: PanelAction,
    ) -> bool {
        if !self.instances.contains_key(&container) {
            debug!(container = container.to_string(), action = action.name(); "Action for unknown container");
            return false;
        }
        trace!(container = container.to_string(), action = action.name(); "Panel action");
        if let Some((dx, dy)) = action.move_delta() {
            return self.move_by(doc, container, dx, dy);
        }
        if let Some(factor) = action.zoom_factor() {
            return self.zoom_around_center(doc, container, factor);
        }
        match action {
            PanelAction::ResetView => self.reset_view(doc, container),
            PanelAction::ToggleHide => self.toggle_hide(doc, container).is_some(),
            PanelAction::ToggleFold => self.toggle_fold(doc, container).is_some(),
            _ => false,
        }
    }

    pub fn move_by(&mut self, doc: &mut DocumentTree, container: NodeId, dx: f32, dy: f32) -> bool {
        if self.live_element(doc, container).is_none() {
            return false;
        }
        let Some(instance) = self.instances.get_mut(&container) else {
            return false;
        };
        instance.transform.move_by(dx, dy);
        project(doc, instance);
        true
    }

    pub fn zoom_around_center(&mut self, doc: &mut DocumentTree, container: NodeId, factor: f32) -> bool {
        if self.live_element(doc, container).is_none() {
            return false;
        }
        let Some(instance) = self.instances.get_mut(&container) else {
            return false;
        };
        let size = doc.client_size(container);
        instance.transform.zoom_around_center(factor, size);
        project(doc, instance);
        true
    }

    /// Re-fits with the current measurements, or queues a fit while the
    /// content cannot be measured.
    pub fn reset_view(&mut self, doc: &mut DocumentTree, container: NodeId) -> bool {
        if self.live_element(doc, container).is_none() {
            return false;
        }
        let Some(instance) = self.instances.get_mut(&container) else {
            return false;
        };
        let content = doc.scroll_size(instance.element());
        match fit_transform(content, doc.client_size(container)) {
            Some(t) => {
                instance.transform = t;
                instance.fitted = true;
                project(doc, instance);
            }
            None => {
                debug!(container = container.to_string(); "Content not measurable, deferring reset");
                self.fits.schedule(container);
            }
        }
        true
    }

    /// Flips the hidden state of the container's panel buttons.
    pub fn toggle_hide(&mut self, doc: &mut DocumentTree, container: NodeId) -> Option<bool> {
        let instance = self.instances.get_mut(&container)?;
        instance.panel_hidden = !instance.panel_hidden;
        panel::apply_hidden(doc, container, instance.panel_hidden);
        Some(instance.panel_hidden)
    }

    pub fn toggle_fold(&mut self, doc: &mut DocumentTree, container: NodeId) -> Option<bool> {
        let folded = !self.instances.get(&container)?.folded;
        self.set_folded(doc, container, folded);
        Some(folded)
    }

    pub fn set_folded(&mut self, doc: &mut DocumentTree, container: NodeId, folded: bool) -> bool {
        if !self.instances.contains_key(&container) {
            return false;
        }
        let element = self.live_element(doc, container);
        let Some(instance) = self.instances.get_mut(&container) else {
            return false;
        };
        instance.folded = folded;
        let fitted = instance.fitted;
        if folded {
            if let Some(element) = element {
                doc.set_style(element, "display", "none");
            }
            self.fits.cancel(container);
        } else if let Some(element) = element {
            doc.remove_style(element, "display");
            if !fitted {
                self.fits.schedule(container);
            }
        }
        panel::apply_fold(doc, container, folded);
        if let Some(instance) = self.instances.get(&container) {
            self.apply_container_height(doc, instance);
        }
        true
    }

    /// Folds every expanded diagram. Returns how many were folded.
    pub fn collapse_all(&mut self, doc: &mut DocumentTree) -> usize {
        let expanded: Vec<NodeId> = self
            .instances
            .values()
            .filter(|i| !i.folded)
            .map(DiagramInstance::container)
            .collect();
        for container in &expanded {
            self.set_folded(doc, *container, true);
        }
        if !expanded.is_empty() {
            info!(count = expanded.len(); "Collapsed diagrams");
        }
        expanded.len()
    }

    /// Re-fits every diagram from scratch.
    pub fn reset_all(&mut self, doc: &mut DocumentTree) {
        let containers: Vec<NodeId> = self.instances.keys().copied().collect();
        for container in containers {
            self.reset_view(doc, container);
        }
    }

    fn refit_if_unfitted(&mut self, doc: &mut DocumentTree, container: NodeId) {
        if self.live_element(doc, container).is_none() {
            return;
        }
        let Some(instance) = self.instances.get(&container) else {
            return;
        };
        if !instance.fitted && !instance.folded && !self.fits.is_pending(container) {
            trace!(container = container.to_string(); "Rescheduling fit after mutation");
            self.fits.schedule(container);
        }
    }

    /// Resolves the diagram element currently inside `container`. An element
    /// the host swapped in takes over the instance and gets a fresh fit.
    fn live_element(&mut self, doc: &mut DocumentTree, container: NodeId) -> Option<NodeId> {
        let instance = self.instances.get_mut(&container)?;
        if doc.parent(instance.element()) == Some(container) {
            return Some(instance.element());
        }
        let Some(element) = doc
            .children_with_class(container, DIAGRAM_CLASS)
            .into_iter()
            .next()
        else {
            debug!(container = container.to_string(); "Diagram element missing");
            self.fits.cancel(container);
            return None;
        };

        instance.rebind(element, doc.text(element).to_string());
        style_element(doc, element);
        if instance.folded {
            doc.set_style(element, "display", "none");
        } else {
            self.fits.schedule(container);
        }
        project(doc, instance);
        debug!(container = container.to_string(), element = element.to_string(); "Rebound swapped diagram element");
        Some(element)
    }

    fn apply_container_height(&self, doc: &mut DocumentTree, instance: &DiagramInstance) {
        let height = if instance.folded {
            &self.options.folded_height
        } else {
            &self.options.expanded_height
        };
        doc.set_style(instance.container(), "height", height.as_str());
    }

    fn attach(&mut self, doc: &mut DocumentTree, element: NodeId) -> Option<NodeId> {
        let Some(parent) = doc.parent(element) else {
            debug!(element = element.to_string(); "Diagram element has no parent, skipping");
            return None;
        };
        if doc.has_class(parent, CONTAINER_CLASS) {
            if self.instances.contains_key(&parent) {
                self.live_element(doc, parent);
            } else {
                trace!(element = element.to_string(); "Diagram already wrapped");
            }
            return None;
        }

        let container = doc.create_element("div");
        doc.add_class(container, CONTAINER_CLASS);
        doc.set_styles(
            container,
            &[
                ("position", "relative"),
                ("overflow", "hidden"),
                ("width", "100%"),
            ],
        );
        doc.insert_before(parent, container, element);
        doc.append_child(container, element);
        style_element(doc, element);

        let mut instance =
            DiagramInstance::new(doc.text(element).to_string(), container, element);
        instance.folded = self.options.collapse_by_default;
        project(doc, &instance);
        panel::build_control_panel(doc, container, &self.options.panels, false, instance.folded);
        if instance.folded {
            doc.set_style(element, "display", "none");
        } else {
            self.fits.schedule(container);
        }
        self.apply_container_height(doc, &instance);
        instance.bound = self.input.bind(doc, container);

        debug!(
            container = container.to_string(),
            element = element.to_string(),
            folded = instance.folded;
            "Attached diagram"
        );
        self.instances.insert(container, instance);
        Some(container)
    }
}

fn style_element(doc: &mut DocumentTree, element: NodeId) {
    doc.set_styles(
        element,
        &[
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("transform-origin", "top left"),
            ("cursor", "grab"),
            ("width", "100%"),
            ("height", "100%"),
        ],
    );
}

fn project(doc: &mut DocumentTree, instance: &DiagramInstance) {
    doc.set_style(instance.element(), "transform", instance.transform.to_css());
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::geometry::{Point, Size};
    use crate::viewport::input::PointerButton;
    use crate::viewport::{BOUND_CLASS, transform::Transform};

    fn rendered_doc() -> (DocumentTree, NodeId, NodeId) {
        let mut doc = DocumentTree::new();
        let root = doc.root();
        let view = doc.create_element("div");
        doc.append_child(root, view);
        let diagram = doc.create_element("div");
        doc.add_class(diagram, DIAGRAM_CLASS);
        doc.set_text(diagram, "graph TD; A-->B");
        doc.append_child(view, diagram);
        (doc, view, diagram)
    }

    fn measured(doc: &mut DocumentTree, container: NodeId, element: NodeId) {
        doc.set_client_size(container, Size::new(800.0, 600.0));
        doc.set_scroll_size(element, Size::new(1600.0, 300.0));
    }

    #[test]
    fn test_attach_wraps_diagram() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let containers = engine.observe(&mut doc, view);
        assert_eq!(containers.len(), 1);

        let container = containers[0];
        assert_eq!(doc.parent(diagram), Some(container));
        assert_eq!(doc.parent(container), Some(view));
        assert!(doc.has_class(container, CONTAINER_CLASS));
        assert!(doc.has_class(container, BOUND_CLASS));
        assert_eq!(doc.style(container, "height"), Some("70vh"));
        assert_eq!(doc.style(diagram, "transform-origin"), Some("top left"));
        assert_eq!(doc.style(diagram, "transform"), Some("translate(0px, 0px) scale(1)"));

        let instance = engine.instance(container).unwrap();
        assert_eq!(instance.raw_content(), "graph TD; A-->B");
        assert!(instance.is_bound());
        assert!(engine.is_fit_pending(container));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let (mut doc, view, _) = rendered_doc();
        let mut engine = Engine::default();
        engine.observe(&mut doc, view);
        assert!(engine.attach_subtree(&mut doc, view).is_empty());
        assert!(engine.process_mutations(&mut doc).is_empty());
        assert_eq!(engine.instance_count(), 1);
    }

    #[test]
    fn test_fit_waits_for_measurements() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];

        assert!(engine.tick(&mut doc).is_empty());
        assert!(engine.is_fit_pending(container));

        measured(&mut doc, container, diagram);
        assert_eq!(engine.tick(&mut doc), vec![container]);
        let t = engine.instance(container).unwrap().transform();
        assert_approx_eq!(f32, t.scale, 0.5);
        assert_approx_eq!(f32, t.offset_x, 0.0);
        assert_approx_eq!(f32, t.offset_y, 225.0);
        assert_eq!(doc.style(diagram, "transform"), Some("translate(0px, 225px) scale(0.5)"));
    }

    #[test]
    fn test_abandoned_fit_retries_on_mutation() {
        let (mut doc, view, diagram) = rendered_doc();
        let options = EngineOptions {
            fit: FitPolicy { max_attempts: 1 },
            ..EngineOptions::default()
        };
        let mut engine = Engine::new(DocumentMode::Rendered, options);
        let container = engine.observe(&mut doc, view)[0];
        doc.take_records();

        engine.tick(&mut doc);
        assert!(!engine.is_fit_pending(container));

        // host renders into the diagram
        let svg = doc.create_element("svg");
        doc.append_child(diagram, svg);
        engine.process_mutations(&mut doc);
        assert!(engine.is_fit_pending(container));
    }

    #[test]
    fn test_live_preview_converts_code_blocks() {
        let mut doc = DocumentTree::new();
        let root = doc.root();
        let editor = doc.create_element("div");
        doc.append_child(root, editor);
        let mut engine = Engine::new(DocumentMode::LivePreview, EngineOptions::default());
        engine.observe(&mut doc, editor);

        let pre = doc.create_element("pre");
        let code = doc.create_element("code");
        doc.add_class(code, CODE_LANGUAGE_CLASS);
        doc.set_text(code, "sequenceDiagram\nA->>B: hi");
        doc.append_child(pre, code);
        doc.append_child(editor, pre);

        let containers = engine.process_mutations(&mut doc);
        assert_eq!(containers.len(), 1);
        assert!(!doc.contains(pre));
        let instance = engine.instance(containers[0]).unwrap();
        assert!(doc.has_class(instance.element(), DIAGRAM_CLASS));
        assert_eq!(instance.raw_content(), "sequenceDiagram\nA->>B: hi");
    }

    #[test]
    fn test_removal_forgets_instance() {
        let (mut doc, view, _) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        doc.take_records();

        doc.clear_children(view);
        engine.process_mutations(&mut doc);
        assert_eq!(engine.instance_count(), 0);
        assert_eq!(engine.input().listener_count(container), 0);
        assert!(!engine.is_fit_pending(container));
    }

    #[test]
    fn test_drag_updates_cursor_and_transform() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];

        engine.handle_input(
            &mut doc,
            container,
            InputEvent::PointerDown {
                position: Point::new(10.0, 10.0),
                button: PointerButton::Primary,
            },
        );
        assert_eq!(doc.style(diagram, "cursor"), Some("grabbing"));
        engine.handle_input(
            &mut doc,
            container,
            InputEvent::PointerMove {
                position: Point::new(40.0, 30.0),
            },
        );
        engine.handle_input(&mut doc, container, InputEvent::PointerLeave);
        assert_eq!(doc.style(diagram, "cursor"), Some("grab"));
        assert_eq!(
            engine.instance(container).unwrap().transform(),
            Transform::new(30.0, 20.0, 1.0)
        );
    }

    #[test]
    fn test_instances_are_independent() {
        let (mut doc, view, _) = rendered_doc();
        let second = doc.create_element("div");
        doc.add_class(second, DIAGRAM_CLASS);
        doc.append_child(view, second);
        let mut engine = Engine::default();
        let containers = engine.observe(&mut doc, view);
        assert_eq!(containers.len(), 2);

        engine.dispatch_action(&mut doc, containers[0], PanelAction::MoveRight);
        assert_eq!(
            engine.instance(containers[0]).unwrap().transform(),
            Transform::new(-50.0, 0.0, 1.0)
        );
        assert_eq!(engine.instance(containers[1]).unwrap().transform(), Transform::default());
    }

    #[test]
    fn test_click_routes_to_owning_container() {
        let (mut doc, view, _) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        doc.set_client_size(container, Size::new(800.0, 600.0));

        let zoom_in = panel::find_button(&doc, container, PanelAction::ZoomIn).unwrap();
        assert_eq!(engine.click(&mut doc, zoom_in), Some(PanelAction::ZoomIn));
        let t = engine.instance(container).unwrap().transform();
        assert_approx_eq!(f32, t.scale, 1.1);
        assert_approx_eq!(f32, t.offset_x, -40.0, epsilon = 1e-3);
        assert_approx_eq!(f32, t.offset_y, -30.0, epsilon = 1e-3);
    }

    #[test]
    fn test_reset_view_refits() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        measured(&mut doc, container, diagram);
        engine.move_by(&mut doc, container, 120.0, -80.0);
        engine.zoom_around_center(&mut doc, container, 3.0);

        assert!(engine.dispatch_action(&mut doc, container, PanelAction::ResetView));
        assert_eq!(
            engine.instance(container).unwrap().transform(),
            fit_transform(Size::new(1600.0, 300.0), Size::new(800.0, 600.0)).unwrap()
        );
    }

    #[test]
    fn test_fold_and_collapse_all() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];

        assert_eq!(engine.collapse_all(&mut doc), 1);
        assert!(engine.instance(container).unwrap().is_folded());
        assert_eq!(doc.style(container, "height"), Some("50px"));
        assert_eq!(doc.style(diagram, "display"), Some("none"));
        assert!(!engine.is_fit_pending(container));
        assert_eq!(
            engine.handle_input(&mut doc, container, InputEvent::PointerLeave),
            InputOutcome::PassThrough
        );

        assert_eq!(engine.toggle_fold(&mut doc, container), Some(false));
        assert_eq!(doc.style(container, "height"), Some("70vh"));
        assert_eq!(doc.style(diagram, "display"), None);
        assert!(engine.is_fit_pending(container));
    }

    #[test]
    fn test_collapse_by_default() {
        let (mut doc, view, _) = rendered_doc();
        let options = EngineOptions {
            collapse_by_default: true,
            ..EngineOptions::default()
        };
        let mut engine = Engine::new(DocumentMode::Rendered, options);
        let container = engine.observe(&mut doc, view)[0];
        assert!(engine.instance(container).unwrap().is_folded());
        assert!(!engine.is_fit_pending(container));
    }

    #[test]
    fn test_set_options_rebuilds_panels() {
        let (mut doc, view, _) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        engine.toggle_hide(&mut doc, container);

        let mut options = EngineOptions::default();
        options.panels.move_panel.enabled = false;
        engine.set_options(&mut doc, options);

        assert!(panel::find_button(&doc, container, PanelAction::MoveUp).is_none());
        assert!(panel::find_button(&doc, container, PanelAction::ToggleHide).is_none());
        assert!(!engine.instance(container).unwrap().is_panel_hidden());
        let zoom_in = panel::find_button(&doc, container, PanelAction::ZoomIn).unwrap();
        assert_eq!(doc.style(zoom_in, "visibility"), Some("visible"));
        assert_eq!(engine.click(&mut doc, zoom_in), Some(PanelAction::ZoomIn));
    }

    #[test]
    fn test_set_options_keeps_hidden_state_with_toggle() {
        let (mut doc, view, _) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        engine.toggle_hide(&mut doc, container);

        let mut options = EngineOptions::default();
        options.panels.zoom_panel.enabled = false;
        engine.set_options(&mut doc, options);

        assert!(engine.instance(container).unwrap().is_panel_hidden());
        let move_up = panel::find_button(&doc, container, PanelAction::MoveUp).unwrap();
        assert_eq!(doc.style(move_up, "visibility"), Some("hidden"));
    }

    #[test]
    fn test_hidden_buttons_ignore_clicks() {
        let (mut doc, view, _) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        doc.set_client_size(container, Size::new(800.0, 600.0));
        engine.toggle_hide(&mut doc, container);

        let zoom_in = panel::find_button(&doc, container, PanelAction::ZoomIn).unwrap();
        assert_eq!(engine.click(&mut doc, zoom_in), None);
        assert_eq!(engine.instance(container).unwrap().transform(), Transform::default());

        let toggle = panel::find_button(&doc, container, PanelAction::ToggleHide).unwrap();
        assert_eq!(engine.click(&mut doc, toggle), Some(PanelAction::ToggleHide));
        assert_eq!(engine.click(&mut doc, zoom_in), Some(PanelAction::ZoomIn));

        engine.collapse_all(&mut doc);
        let move_up = panel::find_button(&doc, container, PanelAction::MoveUp).unwrap();
        assert_eq!(engine.click(&mut doc, move_up), None);
    }

    #[test]
    fn test_swapped_element_takes_over_instance() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        measured(&mut doc, container, diagram);
        engine.tick(&mut doc);
        doc.take_records();

        // host re-renders the diagram in place
        let fresh = doc.create_element("div");
        doc.add_class(fresh, DIAGRAM_CLASS);
        doc.set_text(fresh, "graph LR; B-->C");
        assert!(doc.replace_with(diagram, fresh));
        assert!(engine.process_mutations(&mut doc).is_empty());

        let instance = engine.instance(container).unwrap();
        assert_eq!(instance.element(), fresh);
        assert_eq!(instance.raw_content(), "graph LR; B-->C");
        assert!(!instance.is_fitted());
        assert!(engine.is_fit_pending(container));
        assert_eq!(doc.style(fresh, "transform-origin"), Some("top left"));

        assert!(engine.dispatch_action(&mut doc, container, PanelAction::MoveRight));
        let t = engine.instance(container).unwrap().transform();
        assert_eq!(t, Transform::new(-50.0, 225.0, 0.5));
        assert_eq!(doc.style(fresh, "transform"), Some(t.to_css().as_str()));

        doc.set_scroll_size(fresh, Size::new(400.0, 300.0));
        assert_eq!(engine.tick(&mut doc), vec![container]);
        assert_eq!(
            engine.instance(container).unwrap().transform(),
            fit_transform(Size::new(400.0, 300.0), Size::new(800.0, 600.0)).unwrap()
        );
    }

    #[test]
    fn test_operations_without_element_do_nothing() {
        let (mut doc, view, diagram) = rendered_doc();
        let mut engine = Engine::default();
        let container = engine.observe(&mut doc, view)[0];
        measured(&mut doc, container, diagram);
        doc.take_records();

        assert!(doc.remove(diagram));
        assert!(!engine.move_by(&mut doc, container, 50.0, 0.0));
        assert!(!engine.zoom_around_center(&mut doc, container, 1.1));
        assert!(!engine.reset_view(&mut doc, container));
        assert!(!engine.dispatch_action(&mut doc, container, PanelAction::ZoomOut));
        assert!(!engine.is_fit_pending(container));
        assert_eq!(
            engine.handle_input(&mut doc, container, InputEvent::PointerLeave),
            InputOutcome::PassThrough
        );

        engine.process_mutations(&mut doc);
        assert!(!engine.is_fit_pending(container));
        assert!(engine.tick(&mut doc).is_empty());
        assert_eq!(engine.instance(container).unwrap().transform(), Transform::default());
    }
}

//! Pointer, wheel and drag handling for viewport containers.
//!
//! Every bound container owns one listener with its own drag state. Wheel
//! input is orthogonal to dragging: with the zoom modifier held it zooms
//! around the cursor in any state, without it the event is left to the host
//! so ordinary document scrolling keeps working.

use log::{debug, trace};

use crate::document::{DocumentTree, NodeId};
use crate::geometry::Point;

use super::BOUND_CLASS;
use super::transform::Transform;

/// Wheel delta (in pixels, positive = scroll down) to scale delta.
pub const WHEEL_ZOOM_SPEED: f32 = -0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Input delivered to a container. Positions are container-local pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown {
        position: Point,
        button: PointerButton,
    },
    PointerMove {
        position: Point,
    },
    PointerUp {
        button: PointerButton,
    },
    /// The pointer left the container boundary.
    PointerLeave,
    Wheel {
        position: Point,
        delta_y: f32,
        zoom_modifier: bool,
    },
}

/// Whether the host should suppress its default handling of the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Consumed,
    PassThrough,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Pointer position when the drag started.
        start: Point,
        /// Transform offset when the drag started.
        origin: Point,
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}

#[derive(Debug)]
struct Listener {
    container: NodeId,
    drag: DragState,
}

impl Listener {
    fn handle(&mut self, event: InputEvent, transform: &mut Transform) -> InputOutcome {
        match event {
            InputEvent::PointerDown { position, button } => {
                if button != PointerButton::Primary {
                    return InputOutcome::PassThrough;
                }
                self.drag = DragState::Dragging {
                    start: position,
                    origin: transform.offset(),
                };
                InputOutcome::Consumed
            }
            InputEvent::PointerMove { position } => {
                let DragState::Dragging { start, origin } = self.drag else {
                    return InputOutcome::PassThrough;
                };
                transform.offset_x = origin.x + (position.x - start.x);
                transform.offset_y = origin.y + (position.y - start.y);
                trace!(
                    container = self.container.to_string(),
                    offset_x = transform.offset_x,
                    offset_y = transform.offset_y;
                    "Dragged"
                );
                InputOutcome::Consumed
            }
            InputEvent::PointerUp { button } => {
                if button == PointerButton::Primary && self.drag.is_dragging() {
                    self.drag = DragState::Idle;
                }
                InputOutcome::PassThrough
            }
            InputEvent::PointerLeave => {
                self.drag = DragState::Idle;
                InputOutcome::PassThrough
            }
            InputEvent::Wheel {
                position,
                delta_y,
                zoom_modifier,
            } => {
                if !zoom_modifier {
                    return InputOutcome::PassThrough;
                }
                transform.zoom_around_cursor(position, delta_y * WHEEL_ZOOM_SPEED);
                trace!(
                    container = self.container.to_string(),
                    scale = transform.scale;
                    "Wheel zoom"
                );
                InputOutcome::Consumed
            }
        }
    }
}

/// Event bindings of all containers in a document.
#[derive(Debug, Default)]
pub struct InputReconciler {
    listeners: Vec<Listener>,
}

impl InputReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener to `container` unless it already carries the
    /// bound marker. Returns whether a listener was added.
    pub fn bind(&mut self, doc: &mut DocumentTree, container: NodeId) -> bool {
        if !doc.contains(container) || doc.has_class(container, BOUND_CLASS) {
            return false;
        }
        doc.add_class(container, BOUND_CLASS);
        self.listeners.push(Listener {
            container,
            drag: DragState::Idle,
        });
        debug!(container = container.to_string(); "Bound input listener");
        true
    }

    /// Drops the listeners of a container that left the document.
    pub fn unbind(&mut self, container: NodeId) {
        self.listeners.retain(|l| l.container != container);
    }

    pub fn listener_count(&self, container: NodeId) -> usize {
        self.listeners
            .iter()
            .filter(|l| l.container == container)
            .count()
    }

    pub fn drag_state(&self, container: NodeId) -> DragState {
        self.listeners
            .iter()
            .find(|l| l.container == container)
            .map(|l| l.drag)
            .unwrap_or_default()
    }

    /// Runs every listener bound to `container` against `event`.
    pub fn dispatch(
        &mut self,
        container: NodeId,
        event: InputEvent,
        transform: &mut Transform,
    ) -> InputOutcome {
        let mut outcome = InputOutcome::PassThrough;
        for listener in self
            .listeners
            .iter_mut()
            .filter(|l| l.container == container)
        {
            if listener.handle(event, transform) == InputOutcome::Consumed {
                outcome = InputOutcome::Consumed;
            }
        }
        outcome
    }
}

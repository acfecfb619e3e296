//! On-screen control panels of a viewport container.
//!
//! A container gets up to three clusters of buttons: a 3×3 move grid with the
//! hide/show toggle in its center, a zoom row and a fold toggle. Buttons carry
//! their action name in `data-action`; the host routes clicks back through
//! [`action_of`]. Everything here only ever looks inside one container.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::document::{DocumentTree, NodeId};
use crate::settings::{PanelKind, PanelPosition, PanelsConfig};

pub const MOVE_PANEL_CLASS: &str = "mermaid-move-panel";
pub const ZOOM_PANEL_CLASS: &str = "mermaid-zoom-panel";
pub const FOLD_PANEL_CLASS: &str = "mermaid-fold-panel";
pub const BUTTON_CLASS: &str = "button";
pub const ACTION_ATTRIBUTE: &str = "data-action";
pub const ICON_ATTRIBUTE: &str = "icon";
pub const LABEL_ATTRIBUTE: &str = "aria-label";
pub const HIDE_TOGGLE_ID: &str = "hide-show-button";

/// Pixel step of the move buttons.
pub const MOVE_STEP: f32 = 50.0;
pub const ZOOM_IN_FACTOR: f32 = 1.1;
pub const ZOOM_OUT_FACTOR: f32 = 0.9;

const PANEL_STYLES: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("display", "grid"),
    ("gap", "5px"),
    ("background", "transparent"),
    ("padding", "5px"),
    ("border-radius", "5px"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelAction {
    MoveUpLeft,
    MoveUp,
    MoveUpRight,
    MoveLeft,
    MoveRight,
    MoveDownLeft,
    MoveDown,
    MoveDownRight,
    ZoomIn,
    ZoomOut,
    ResetView,
    ToggleHide,
    ToggleFold,
}

/// Move grid in row-major order.
pub const MOVE_GRID: [PanelAction; 9] = [
    PanelAction::MoveUpLeft,
    PanelAction::MoveUp,
    PanelAction::MoveUpRight,
    PanelAction::MoveLeft,
    PanelAction::ToggleHide,
    PanelAction::MoveRight,
    PanelAction::MoveDownLeft,
    PanelAction::MoveDown,
    PanelAction::MoveDownRight,
];

pub const ZOOM_ROW: [PanelAction; 3] = [
    PanelAction::ZoomOut,
    PanelAction::ResetView,
    PanelAction::ZoomIn,
];

impl PanelAction {
    pub const ALL: [PanelAction; 13] = [
        PanelAction::MoveUpLeft,
        PanelAction::MoveUp,
        PanelAction::MoveUpRight,
        PanelAction::MoveLeft,
        PanelAction::MoveRight,
        PanelAction::MoveDownLeft,
        PanelAction::MoveDown,
        PanelAction::MoveDownRight,
        PanelAction::ZoomIn,
        PanelAction::ZoomOut,
        PanelAction::ResetView,
        PanelAction::ToggleHide,
        PanelAction::ToggleFold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PanelAction::MoveUpLeft => "move-up-left",
            PanelAction::MoveUp => "move-up",
            PanelAction::MoveUpRight => "move-up-right",
            PanelAction::MoveLeft => "move-left",
            PanelAction::MoveRight => "move-right",
            PanelAction::MoveDownLeft => "move-down-left",
            PanelAction::MoveDown => "move-down",
            PanelAction::MoveDownRight => "move-down-right",
            PanelAction::ZoomIn => "zoom-in",
            PanelAction::ZoomOut => "zoom-out",
            PanelAction::ResetView => "reset-view",
            PanelAction::ToggleHide => "toggle-hide",
            PanelAction::ToggleFold => "toggle-fold",
        }
    }

    /// Icon name for the default state of the button.
    pub fn icon(self) -> &'static str {
        match self {
            PanelAction::MoveUpLeft => "arrow-up-left",
            PanelAction::MoveUp => "arrow-up",
            PanelAction::MoveUpRight => "arrow-up-right",
            PanelAction::MoveLeft => "arrow-left",
            PanelAction::MoveRight => "arrow-right",
            PanelAction::MoveDownLeft => "arrow-down-left",
            PanelAction::MoveDown => "arrow-down",
            PanelAction::MoveDownRight => "arrow-down-right",
            PanelAction::ZoomIn => "zoom-in",
            PanelAction::ZoomOut => "zoom-out",
            PanelAction::ResetView => "refresh-cw",
            PanelAction::ToggleHide => "eye",
            PanelAction::ToggleFold => "fold-vertical",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PanelAction::MoveUpLeft => "Move up left",
            PanelAction::MoveUp => "Move up",
            PanelAction::MoveUpRight => "Move up right",
            PanelAction::MoveLeft => "Move left",
            PanelAction::MoveRight => "Move right",
            PanelAction::MoveDownLeft => "Move down left",
            PanelAction::MoveDown => "Move down",
            PanelAction::MoveDownRight => "Move down right",
            PanelAction::ZoomIn => "Zoom In",
            PanelAction::ZoomOut => "Zoom Out",
            PanelAction::ResetView => "Reset Zoom and Position",
            PanelAction::ToggleHide => "Hide control panel",
            PanelAction::ToggleFold => "Fold diagram",
        }
    }

    /// Offset change of a move action. "Up" shifts the diagram down so the
    /// view travels up over it.
    pub fn move_delta(self) -> Option<(f32, f32)> {
        let s = MOVE_STEP;
        match self {
            PanelAction::MoveUpLeft => Some((s, s)),
            PanelAction::MoveUp => Some((0.0, s)),
            PanelAction::MoveUpRight => Some((-s, s)),
            PanelAction::MoveLeft => Some((s, 0.0)),
            PanelAction::MoveRight => Some((-s, 0.0)),
            PanelAction::MoveDownLeft => Some((s, -s)),
            PanelAction::MoveDown => Some((0.0, -s)),
            PanelAction::MoveDownRight => Some((-s, -s)),
            _ => None,
        }
    }

    /// Center zoom factor of a zoom button.
    pub fn zoom_factor(self) -> Option<f32> {
        match self {
            PanelAction::ZoomIn => Some(ZOOM_IN_FACTOR),
            PanelAction::ZoomOut => Some(ZOOM_OUT_FACTOR),
            _ => None,
        }
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown panel action `{0}`")]
pub struct UnknownPanelAction(pub String);

impl FromStr for PanelAction {
    type Err = UnknownPanelAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PanelAction::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownPanelAction(s.to_string()))
    }
}

/// Panel nodes built for one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlPanel {
    pub move_panel: Option<NodeId>,
    pub zoom_panel: Option<NodeId>,
    pub fold_panel: NodeId,
}

fn panel_class(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::Move => MOVE_PANEL_CLASS,
        PanelKind::Zoom => ZOOM_PANEL_CLASS,
    }
}

fn fold_panel_position() -> PanelPosition {
    PanelPosition {
        left: Some("10px".to_string()),
        top: Some("10px".to_string()),
        ..PanelPosition::default()
    }
}

fn create_button(doc: &mut DocumentTree, action: PanelAction) -> NodeId {
    let button = doc.create_element("button");
    doc.add_class(button, BUTTON_CLASS);
    doc.set_attribute(button, ACTION_ATTRIBUTE, action.name());
    doc.set_attribute(button, ICON_ATTRIBUTE, action.icon());
    doc.set_attribute(button, LABEL_ATTRIBUTE, action.title());
    if action == PanelAction::ToggleHide {
        doc.set_attribute(button, "id", HIDE_TOGGLE_ID);
    }
    doc.set_styles(
        button,
        &[
            ("background", "transparent"),
            ("border", "none"),
            ("cursor", "pointer"),
            ("padding", "4px"),
            ("pointer-events", "auto"),
        ],
    );
    button
}

fn create_panel(
    doc: &mut DocumentTree,
    container: NodeId,
    class: &str,
    position: &PanelPosition,
    columns: usize,
    actions: &[PanelAction],
) -> NodeId {
    let panel = doc.create_element("div");
    doc.add_class(panel, class);
    doc.set_styles(panel, PANEL_STYLES);
    doc.set_styles(panel, &position.styles());
    doc.set_style(panel, "grid-template-columns", format!("repeat({columns}, 1fr)"));
    for action in actions {
        let button = create_button(doc, *action);
        doc.append_child(panel, button);
    }
    doc.append_child(container, panel);
    panel
}

/// Builds the panels of `container` from `panels`, replacing any it already
/// has, and applies the current hidden/folded state to them.
pub fn build_control_panel(
    doc: &mut DocumentTree,
    container: NodeId,
    panels: &PanelsConfig,
    hidden: bool,
    folded: bool,
) -> ControlPanel {
    remove_panels(doc, container);

    let mut built = |kind: PanelKind, columns: usize, actions: &[PanelAction]| {
        let config = panels.get(kind);
        config
            .enabled
            .then(|| create_panel(doc, container, panel_class(kind), &config.position, columns, actions))
    };
    let move_panel = built(PanelKind::Move, 3, &MOVE_GRID);
    let zoom_panel = built(PanelKind::Zoom, 3, &ZOOM_ROW);
    let fold_panel = create_panel(
        doc,
        container,
        FOLD_PANEL_CLASS,
        &fold_panel_position(),
        1,
        &[PanelAction::ToggleFold],
    );

    apply_hidden(doc, container, hidden);
    apply_fold(doc, container, folded);

    ControlPanel {
        move_panel,
        zoom_panel,
        fold_panel,
    }
}

pub fn remove_panels(doc: &mut DocumentTree, container: NodeId) {
    for class in [MOVE_PANEL_CLASS, ZOOM_PANEL_CLASS, FOLD_PANEL_CLASS] {
        for panel in doc.children_with_class(container, class) {
            doc.remove(panel);
        }
    }
}

fn panels_of(doc: &DocumentTree, container: NodeId, classes: &[&str]) -> Vec<NodeId> {
    classes
        .iter()
        .flat_map(|class| doc.children_with_class(container, class))
        .collect()
}

/// Every button in the panels of `container`.
pub fn buttons(doc: &DocumentTree, container: NodeId) -> Vec<NodeId> {
    panels_of(doc, container, &[MOVE_PANEL_CLASS, ZOOM_PANEL_CLASS, FOLD_PANEL_CLASS])
        .into_iter()
        .flat_map(|panel| doc.children_with_class(panel, BUTTON_CLASS))
        .collect()
}

pub fn action_of(doc: &DocumentTree, button: NodeId) -> Option<PanelAction> {
    doc.attribute(button, ACTION_ATTRIBUTE)?.parse().ok()
}

pub fn find_button(doc: &DocumentTree, container: NodeId, action: PanelAction) -> Option<NodeId> {
    buttons(doc, container)
        .into_iter()
        .find(|b| action_of(doc, *b) == Some(action))
}

/// Whether `button` can currently receive clicks: not hidden itself and not
/// inside a collapsed panel.
pub fn is_interactive(doc: &DocumentTree, button: NodeId) -> bool {
    if doc.style(button, "visibility") == Some("hidden")
        || doc.style(button, "pointer-events") == Some("none")
    {
        return false;
    }
    doc.parent(button)
        .is_none_or(|panel| doc.style(panel, "display") != Some("none"))
}

/// Shows or hides the move and zoom buttons of `container`, except the
/// hide toggle itself, and updates the toggle's icon and label.
pub fn apply_hidden(doc: &mut DocumentTree, container: NodeId, hidden: bool) {
    let (visibility, pointer_events) = if hidden {
        ("hidden", "none")
    } else {
        ("visible", "auto")
    };
    for panel in panels_of(doc, container, &[MOVE_PANEL_CLASS, ZOOM_PANEL_CLASS]) {
        for button in doc.children_with_class(panel, BUTTON_CLASS) {
            if doc.attribute(button, "id") == Some(HIDE_TOGGLE_ID) {
                doc.set_attribute(button, ICON_ATTRIBUTE, if hidden { "eye-off" } else { "eye" });
                doc.set_attribute(
                    button,
                    LABEL_ATTRIBUTE,
                    if hidden { "Show control panel" } else { "Hide control panel" },
                );
                continue;
            }
            doc.set_styles(button, &[("visibility", visibility), ("pointer-events", pointer_events)]);
        }
    }
}

/// Hides the move and zoom panels of a folded container and flips the fold
/// toggle.
pub fn apply_fold(doc: &mut DocumentTree, container: NodeId, folded: bool) {
    for panel in panels_of(doc, container, &[MOVE_PANEL_CLASS, ZOOM_PANEL_CLASS]) {
        if folded {
            doc.set_style(panel, "display", "none");
        } else {
            doc.set_style(panel, "display", "grid");
        }
    }
    if let Some(button) = find_button(doc, container, PanelAction::ToggleFold) {
        let (icon, label) = if folded {
            ("unfold-vertical", "Expand diagram")
        } else {
            (PanelAction::ToggleFold.icon(), PanelAction::ToggleFold.title())
        };
        doc.set_attribute(button, ICON_ATTRIBUTE, icon);
        doc.set_attribute(button, LABEL_ATTRIBUTE, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_doc() -> (DocumentTree, NodeId) {
        let mut doc = DocumentTree::new();
        let container = doc.create_element("div");
        let root = doc.root();
        doc.append_child(root, container);
        (doc, container)
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in PanelAction::ALL {
            assert_eq!(action.name().parse::<PanelAction>(), Ok(action));
        }
        assert_eq!(
            "spin".parse::<PanelAction>(),
            Err(UnknownPanelAction("spin".to_string()))
        );
    }

    #[test]
    fn test_move_deltas_use_fixed_step() {
        assert_eq!(PanelAction::MoveUpLeft.move_delta(), Some((50.0, 50.0)));
        assert_eq!(PanelAction::MoveRight.move_delta(), Some((-50.0, 0.0)));
        assert_eq!(PanelAction::MoveDown.move_delta(), Some((0.0, -50.0)));
        assert_eq!(PanelAction::ZoomIn.move_delta(), None);
        assert_eq!(PanelAction::ZoomOut.zoom_factor(), Some(0.9));
    }

    #[test]
    fn test_build_default_panels() {
        let (mut doc, container) = container_doc();
        let panel = build_control_panel(&mut doc, container, &PanelsConfig::default(), false, false);

        let move_panel = panel.move_panel.unwrap();
        let zoom_panel = panel.zoom_panel.unwrap();
        assert_eq!(doc.children(move_panel).len(), 9);
        assert_eq!(doc.children(zoom_panel).len(), 3);
        assert_eq!(doc.style(move_panel, "right"), Some("10px"));
        assert_eq!(doc.style(zoom_panel, "right"), Some("120px"));
        assert_eq!(buttons(&doc, container).len(), 13);

        let toggle = doc.element_by_id(container, HIDE_TOGGLE_ID).unwrap();
        assert_eq!(doc.parent(toggle), Some(move_panel));
        assert_eq!(action_of(&doc, toggle), Some(PanelAction::ToggleHide));
    }

    #[test]
    fn test_disabled_panels_are_not_built() {
        let (mut doc, container) = container_doc();
        let mut panels = PanelsConfig::default();
        panels.zoom_panel.enabled = false;
        let panel = build_control_panel(&mut doc, container, &panels, false, false);
        assert!(panel.zoom_panel.is_none());
        assert!(find_button(&doc, container, PanelAction::ZoomIn).is_none());
        assert!(find_button(&doc, container, PanelAction::MoveUp).is_some());
    }

    #[test]
    fn test_rebuild_replaces_panels() {
        let (mut doc, container) = container_doc();
        build_control_panel(&mut doc, container, &PanelsConfig::default(), false, false);
        build_control_panel(&mut doc, container, &PanelsConfig::default(), false, false);
        assert_eq!(doc.children(container).len(), 3);
    }

    #[test]
    fn test_hide_is_scoped_to_its_container() {
        let (mut doc, a) = container_doc();
        let b = doc.create_element("div");
        let root = doc.root();
        doc.append_child(root, b);
        build_control_panel(&mut doc, a, &PanelsConfig::default(), false, false);
        build_control_panel(&mut doc, b, &PanelsConfig::default(), false, false);

        apply_hidden(&mut doc, b, true);

        let zoom_in_a = find_button(&doc, a, PanelAction::ZoomIn).unwrap();
        let zoom_in_b = find_button(&doc, b, PanelAction::ZoomIn).unwrap();
        assert_eq!(doc.style(zoom_in_a, "visibility"), Some("visible"));
        assert_eq!(doc.style(zoom_in_b, "visibility"), Some("hidden"));
        assert_eq!(doc.style(zoom_in_b, "pointer-events"), Some("none"));

        let toggle_a = doc.element_by_id(a, HIDE_TOGGLE_ID).unwrap();
        let toggle_b = doc.element_by_id(b, HIDE_TOGGLE_ID).unwrap();
        assert_eq!(doc.attribute(toggle_a, ICON_ATTRIBUTE), Some("eye"));
        assert_eq!(doc.attribute(toggle_b, ICON_ATTRIBUTE), Some("eye-off"));
        assert_eq!(doc.attribute(toggle_b, LABEL_ATTRIBUTE), Some("Show control panel"));
        assert_eq!(doc.style(toggle_b, "visibility"), None);

        assert!(is_interactive(&doc, zoom_in_a));
        assert!(!is_interactive(&doc, zoom_in_b));
        assert!(is_interactive(&doc, toggle_b));
    }

    #[test]
    fn test_fold_hides_panels_but_not_fold_toggle() {
        let (mut doc, container) = container_doc();
        let panel = build_control_panel(&mut doc, container, &PanelsConfig::default(), false, true);
        assert_eq!(doc.style(panel.move_panel.unwrap(), "display"), Some("none"));
        assert_eq!(doc.style(panel.fold_panel, "display"), Some("grid"));

        let fold = find_button(&doc, container, PanelAction::ToggleFold).unwrap();
        assert_eq!(doc.attribute(fold, ICON_ATTRIBUTE), Some("unfold-vertical"));
        assert!(is_interactive(&doc, fold));
        let move_up = find_button(&doc, container, PanelAction::MoveUp).unwrap();
        assert!(!is_interactive(&doc, move_up));

        apply_fold(&mut doc, container, false);
        assert_eq!(doc.style(panel.zoom_panel.unwrap(), "display"), Some("grid"));
        assert_eq!(doc.attribute(fold, LABEL_ATTRIBUTE), Some("Fold diagram"));
    }
}

//! Edge-snapping placement of control panels in the settings preview.
//!
//! Panels are dragged around a scaled-down container preview. On drop the
//! panel's top-left corner is turned into a [`PanelPosition`]: snapped to the
//! nearest container edge when close enough, otherwise stored as percentages
//! so the placement scales with real containers.

use log::{debug, warn};

use crate::geometry::{Point, Rect, Size};

use super::{PanelKind, PanelPosition, PanelsConfig, Settings, SettingsSink};

/// Size of a panel tile in the preview.
pub const PANEL_WIDTH: f32 = 60.0;
pub const PANEL_HEIGHT: f32 = 40.0;
/// Distance under which a panel attaches to an edge.
pub const SNAP_THRESHOLD: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

fn percent(value: f32, total: f32) -> String {
    if total <= 0.0 || !total.is_finite() {
        return "0.0%".to_string();
    }
    format!("{:.1}%", value / total * 100.0)
}

fn px_zero() -> Option<String> {
    Some("0px".to_string())
}

/// Snapped position for a default-sized panel whose top-left corner is at
/// (`x`, `y`) inside `container`.
pub fn calculate_position(x: f32, y: f32, container: Size) -> PanelPosition {
    calculate_position_with(x, y, container, Size::new(PANEL_WIDTH, PANEL_HEIGHT), SNAP_THRESHOLD)
}

pub fn calculate_position_with(
    x: f32,
    y: f32,
    container: Size,
    panel: Size,
    threshold: f32,
) -> PanelPosition {
    let panel_left = x;
    let panel_right = x + panel.width;
    let panel_top = y;
    let panel_bottom = y + panel.height;

    let to_left = panel_left;
    let to_right = container.width - panel_right;
    let to_top = panel_top;
    let to_bottom = container.height - panel_bottom;

    // Ties go to the earlier edge.
    let (edge, distance) = [
        (Edge::Left, to_left),
        (Edge::Right, to_right),
        (Edge::Top, to_top),
        (Edge::Bottom, to_bottom),
    ]
    .into_iter()
    .reduce(|a, b| if a.1.abs() <= b.1.abs() { a } else { b })
    .unwrap_or((Edge::Left, to_left));

    let mut position = PanelPosition::default();
    if distance.abs() > threshold {
        position.left = Some(percent(panel_left, container.width));
        position.top = Some(percent(panel_top, container.height));
        return position;
    }

    match edge {
        Edge::Left | Edge::Right => {
            if edge == Edge::Left {
                position.left = px_zero();
            } else {
                position.right = px_zero();
            }
            if panel_top <= threshold {
                position.top = px_zero();
            } else if to_bottom <= threshold {
                position.bottom = px_zero();
            } else {
                position.top = Some(percent(panel_top, container.height));
            }
        }
        Edge::Top | Edge::Bottom => {
            if edge == Edge::Top {
                position.top = px_zero();
            } else {
                position.bottom = px_zero();
            }
            if panel_left <= threshold {
                position.left = px_zero();
            } else if to_right <= threshold {
                position.right = px_zero();
            } else {
                position.left = Some(percent(panel_left, container.width));
            }
        }
    }
    position
}

/// A panel being dragged, with the grab point relative to its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragItem {
    pub panel: PanelKind,
    pub offset_x: f32,
    pub offset_y: f32,
}

#[derive(Clone, Debug)]
pub struct PanelLayoutEditor {
    positions: PanelsConfig,
    dragged: Option<DragItem>,
    preview: Option<PanelPosition>,
}

impl PanelLayoutEditor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            positions: settings.panels_config.clone(),
            dragged: None,
            preview: None,
        }
    }

    pub fn positions(&self) -> &PanelsConfig {
        &self.positions
    }

    /// Picks up external settings changes.
    pub fn reload(&mut self, settings: &Settings) {
        self.positions = settings.panels_config.clone();
    }

    pub fn dragged(&self) -> Option<DragItem> {
        self.dragged
    }

    /// Live position of the dragged panel, if it has moved since the grab.
    pub fn preview_position(&self) -> Option<&PanelPosition> {
        self.preview.as_ref()
    }

    /// Grabs `panel` (displayed at `panel_rect`) at `pointer`.
    pub fn drag_start(&mut self, panel: PanelKind, pointer: Point, panel_rect: Rect) {
        let grab = panel_rect.to_local(pointer);
        self.dragged = Some(DragItem {
            panel,
            offset_x: grab.x,
            offset_y: grab.y,
        });
        self.preview = None;
        debug!(panel = panel.name(); "Started panel drag");
    }

    /// Updates the live preview without touching the stored settings.
    pub fn drag_move(&mut self, pointer: Point, container: Rect) -> Option<&PanelPosition> {
        let item = self.dragged?;
        self.preview = Some(Self::snapped(item, pointer, container));
        self.preview.as_ref()
    }

    /// Stores the snapped position of the dragged panel and saves. Save
    /// failures are logged and do not roll back the in-memory change.
    pub fn drop(
        &mut self,
        pointer: Point,
        container: Rect,
        settings: &mut Settings,
        sink: &mut dyn SettingsSink,
    ) -> Option<PanelPosition> {
        let item = self.dragged.take()?;
        self.preview = None;
        let position = Self::snapped(item, pointer, container);
        self.positions.get_mut(item.panel).position = position.clone();
        debug!(panel = item.panel.name(), position:? = position; "Dropped panel");
        self.commit(settings, sink);
        Some(position)
    }

    pub fn cancel(&mut self) {
        self.dragged = None;
        self.preview = None;
    }

    /// Flips whether `panel` is built at all, then saves.
    pub fn toggle_panel(
        &mut self,
        panel: PanelKind,
        settings: &mut Settings,
        sink: &mut dyn SettingsSink,
    ) -> bool {
        let config = self.positions.get_mut(panel);
        config.enabled = !config.enabled;
        let enabled = config.enabled;
        self.commit(settings, sink);
        enabled
    }

    fn snapped(item: DragItem, pointer: Point, container: Rect) -> PanelPosition {
        let local = container.to_local(pointer);
        calculate_position(local.x - item.offset_x, local.y - item.offset_y, container.size())
    }

    fn commit(&self, settings: &mut Settings, sink: &mut dyn SettingsSink) {
        settings.panels_config = self.positions.clone();
        if let Err(err) = sink.save(settings) {
            warn!(err:% = err; "Failed to save panel layout");
        }
    }
}

use eframe::egui;

use diagram_zoom_drag::document::{DocumentTree, NodeId};
use diagram_zoom_drag::geometry::Size;
use diagram_zoom_drag::render::SourceCard;
use diagram_zoom_drag::settings::PanelPosition;
use diagram_zoom_drag::viewport::panel::{
    BUTTON_CLASS, FOLD_PANEL_CLASS, ICON_ATTRIBUTE, LABEL_ATTRIBUTE, MOVE_PANEL_CLASS,
    ZOOM_PANEL_CLASS,
};
use diagram_zoom_drag::viewport::{CONTAINER_CLASS, Engine, Transform};

use super::HitAreas;

pub(super) const BUTTON_SIZE: f32 = 24.0;
const PANEL_GAP: f32 = 5.0;
const PANEL_PADDING: f32 = 5.0;

/// Everything the document pass produced for the input routing of the
/// next frame.
#[derive(Default)]
pub(super) struct FrameOutput {
    pub hits: HitAreas,
    pub clicks: Vec<NodeId>,
}

pub(super) fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "arrow-up-left" => "↖",
        "arrow-up" => "↑",
        "arrow-up-right" => "↗",
        "arrow-left" => "←",
        "arrow-right" => "→",
        "arrow-down-left" => "↙",
        "arrow-down" => "↓",
        "arrow-down-right" => "↘",
        "zoom-in" => "+",
        "zoom-out" => "−",
        "refresh-cw" => "⟳",
        "eye" => "👁",
        "eye-off" => "⊘",
        "fold-vertical" => "⏶",
        "unfold-vertical" => "⏷",
        _ => "?",
    }
}

/// Pixel height for a CSS height value (`vh`, `px` or a bare number).
pub(super) fn css_height(value: Option<&str>, viewport_height: f32) -> f32 {
    let fallback = viewport_height * 0.7;
    let Some(value) = value.map(str::trim) else {
        return fallback;
    };
    if let Some(vh) = value.strip_suffix("vh") {
        return vh.trim().parse::<f32>().map_or(fallback, |v| v * viewport_height / 100.0);
    }
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f32>()
        .unwrap_or(fallback)
}

fn subtree_text(doc: &DocumentTree, node: NodeId) -> String {
    doc.subtree(node)
        .into_iter()
        .map(|n| doc.text(n))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn draw_document(
    ui: &mut egui::Ui,
    doc: &mut DocumentTree,
    engine: &Engine,
    view: NodeId,
    card: &SourceCard,
    viewport_height: f32,
    out: &mut FrameOutput,
) {
    for child in doc.children(view).to_vec() {
        draw_block(ui, doc, engine, child, card, viewport_height, out);
    }
}

fn draw_block(
    ui: &mut egui::Ui,
    doc: &mut DocumentTree,
    engine: &Engine,
    node: NodeId,
    card: &SourceCard,
    viewport_height: f32,
    out: &mut FrameOutput,
) {
    if doc.has_class(node, CONTAINER_CLASS) {
        draw_container(ui, doc, engine, node, card, viewport_height, out);
        return;
    }
    let tag = doc.tag(node).unwrap_or("").to_string();
    match tag.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let size = match tag.as_str() {
                "h1" => 28.0,
                "h2" => 24.0,
                "h3" => 20.0,
                _ => 17.0,
            };
            ui.add_space(6.0);
            ui.label(egui::RichText::new(doc.text(node)).strong().size(size));
        }
        "p" | "span" => {
            ui.label(doc.text(node));
        }
        "pre" => {
            ui.code(subtree_text(doc, node));
        }
        "hr" => {
            ui.separator();
        }
        "ul" | "ol" => {
            let ordered = tag == "ol";
            for (idx, item) in doc.children(node).to_vec().into_iter().enumerate() {
                let bullet = if ordered {
                    format!("{}.", idx + 1)
                } else {
                    "•".to_string()
                };
                ui.horizontal_top(|ui| {
                    ui.label(bullet);
                    ui.vertical(|ui| {
                        for child in doc.children(item).to_vec() {
                            draw_block(ui, doc, engine, child, card, viewport_height, out);
                        }
                    });
                });
            }
        }
        "blockquote" => {
            ui.indent(("blockquote", node.raw()), |ui| {
                for child in doc.children(node).to_vec() {
                    draw_block(ui, doc, engine, child, card, viewport_height, out);
                }
            });
        }
        _ => {
            let children = doc.children(node).to_vec();
            if children.is_empty() {
                if !doc.text(node).is_empty() {
                    ui.label(doc.text(node));
                }
            } else {
                for child in children {
                    draw_block(ui, doc, engine, child, card, viewport_height, out);
                }
            }
        }
    }
}

fn draw_container(
    ui: &mut egui::Ui,
    doc: &mut DocumentTree,
    engine: &Engine,
    container: NodeId,
    card: &SourceCard,
    viewport_height: f32,
    out: &mut FrameOutput,
) {
    let height = css_height(doc.style(container, "height"), viewport_height);
    let width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
    doc.set_client_size(container, Size::from_vec2(rect.size()));
    out.hits.containers.push((container, rect));

    let painter = ui.painter_at(rect);
    let visuals = ui.visuals();
    painter.rect_filled(rect, 4.0, visuals.extreme_bg_color);
    painter.rect_stroke(
        rect,
        4.0,
        visuals.widgets.noninteractive.bg_stroke,
        egui::StrokeKind::Inside,
    );

    if let Some(instance) = engine.instance(container) {
        if doc.style(instance.element(), "display") == Some("none") {
            let title = instance.raw_content().lines().next().unwrap_or("diagram");
            painter.text(
                rect.left_center() + egui::vec2(48.0, 0.0),
                egui::Align2::LEFT_CENTER,
                title,
                egui::FontId::monospace(13.0),
                visuals.weak_text_color(),
            );
        } else {
            paint_source_card(&painter, rect, instance.raw_content(), instance.transform(), card);
        }
    }

    draw_panels(ui, &painter, doc, container, rect, out);
}

fn paint_source_card(
    painter: &egui::Painter,
    rect: egui::Rect,
    source: &str,
    t: Transform,
    card: &SourceCard,
) {
    let visuals = painter.ctx().style().visuals.clone();
    let origin = rect.min + egui::vec2(t.offset_x, t.offset_y);
    let size = card.layout(source).to_vec2() * t.scale;
    let card_rect = egui::Rect::from_min_size(origin, size);
    painter.rect_filled(card_rect, 6.0 * t.scale, visuals.faint_bg_color);
    painter.rect_stroke(
        card_rect,
        6.0 * t.scale,
        egui::Stroke::new(1.0, visuals.widgets.inactive.fg_stroke.color),
        egui::StrokeKind::Middle,
    );

    let font = egui::FontId::monospace(card.line_height * 0.75 * t.scale);
    for (i, line) in source.lines().enumerate() {
        let pos = origin
            + egui::vec2(card.padding, card.padding + i as f32 * card.line_height) * t.scale;
        if pos.y > rect.max.y {
            break;
        }
        painter.text(
            pos,
            egui::Align2::LEFT_TOP,
            line,
            font.clone(),
            visuals.text_color(),
        );
    }
}

fn panel_position(doc: &DocumentTree, panel: NodeId) -> PanelPosition {
    let get = |name: &str| doc.style(panel, name).map(str::to_string);
    PanelPosition {
        left: get("left"),
        right: get("right"),
        top: get("top"),
        bottom: get("bottom"),
    }
}

fn draw_panels(
    ui: &mut egui::Ui,
    painter: &egui::Painter,
    doc: &DocumentTree,
    container: NodeId,
    rect: egui::Rect,
    out: &mut FrameOutput,
) {
    let container_size = Size::from_vec2(rect.size());
    for (class, columns) in [(MOVE_PANEL_CLASS, 3), (ZOOM_PANEL_CLASS, 3), (FOLD_PANEL_CLASS, 1)] {
        for panel in doc.children_with_class(container, class) {
            if doc.style(panel, "display") == Some("none") {
                continue;
            }
            let buttons = doc.children_with_class(panel, BUTTON_CLASS);
            let cols = columns.min(buttons.len()).max(1);
            let rows = buttons.len().div_ceil(cols).max(1);
            let panel_size = Size::new(
                cols as f32 * BUTTON_SIZE + (cols - 1) as f32 * PANEL_GAP + 2.0 * PANEL_PADDING,
                rows as f32 * BUTTON_SIZE + (rows - 1) as f32 * PANEL_GAP + 2.0 * PANEL_PADDING,
            );
            let at = panel_position(doc, panel).resolve(container_size, panel_size);
            let panel_min = rect.min + egui::vec2(at.x, at.y);

            for (idx, button) in buttons.into_iter().enumerate() {
                if doc.style(button, "visibility") == Some("hidden") {
                    continue;
                }
                let (col, row) = ((idx % cols) as f32, (idx / cols) as f32);
                let button_rect = egui::Rect::from_min_size(
                    panel_min
                        + egui::vec2(
                            PANEL_PADDING + col * (BUTTON_SIZE + PANEL_GAP),
                            PANEL_PADDING + row * (BUTTON_SIZE + PANEL_GAP),
                        ),
                    egui::vec2(BUTTON_SIZE, BUTTON_SIZE),
                );
                out.hits.buttons.push(button_rect);

                let id = ui.id().with(("panel-button", button.raw()));
                let label = doc.attribute(button, LABEL_ATTRIBUTE).unwrap_or("");
                let response = ui
                    .interact(button_rect, id, egui::Sense::click())
                    .on_hover_text(label);
                let visuals = ui.visuals();
                let (fill, color) = if response.hovered() {
                    (visuals.widgets.hovered.weak_bg_fill, visuals.selection.stroke.color)
                } else {
                    (visuals.widgets.inactive.weak_bg_fill, visuals.weak_text_color())
                };
                painter.rect_filled(button_rect, 3.0, fill);
                painter.text(
                    button_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    icon_glyph(doc.attribute(button, ICON_ATTRIBUTE).unwrap_or("")),
                    egui::FontId::proportional(14.0),
                    color,
                );
                if response.clicked() {
                    out.clicks.push(button);
                }
            }
        }
    }
}

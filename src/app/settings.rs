use eframe::egui;

use diagram_zoom_drag::geometry::{Point, Rect, Size};
use diagram_zoom_drag::settings::{PanelKind, PanelPosition};
use diagram_zoom_drag::settings::layout::{PANEL_HEIGHT, PANEL_WIDTH};
use diagram_zoom_drag::viewport::EngineOptions;

use super::ViewerApp;

const PREVIEW_SIZE: egui::Vec2 = egui::vec2(400.0, 300.0);

fn describe(position: &PanelPosition) -> String {
    position
        .styles()
        .into_iter()
        .map(|(name, value)| format!("{name} {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ViewerApp {
    pub(super) fn draw_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        let mut settings_changed = false;
        let mut layout_changed = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .default_width(PREVIEW_SIZE.x + 24.0)
            .show(ctx, |ui| {
                ui.heading("Folding");
                settings_changed |= ui
                    .checkbox(&mut self.settings.collapse_by_default, "Collapse diagrams by default")
                    .changed();
                settings_changed |= ui
                    .checkbox(
                        &mut self.settings.automatic_collapsing_on_focus_change,
                        "Collapse all diagrams when the window loses focus",
                    )
                    .changed();

                ui.add_space(8.0);
                ui.heading("Size");
                egui::Grid::new("diagram_size").num_columns(2).show(ui, |ui| {
                    ui.label("Expanded height");
                    settings_changed |= ui
                        .add(
                            egui::Slider::new(&mut self.settings.diagram_size.expanded_height, 0.2..=1.0)
                                .custom_formatter(|v, _| format!("{:.0}vh", v * 100.0)),
                        )
                        .changed();
                    ui.end_row();
                    ui.label("Folded height");
                    settings_changed |= ui
                        .add(
                            egui::DragValue::new(&mut self.settings.diagram_size.folded_height)
                                .range(20.0..=200.0)
                                .suffix("px"),
                        )
                        .changed();
                    ui.end_row();
                    ui.label("Fit attempts");
                    settings_changed |= ui
                        .add(egui::DragValue::new(&mut self.settings.fit_max_attempts).range(1..=600))
                        .changed();
                    ui.end_row();
                });

                ui.add_space(8.0);
                ui.heading("Panels");
                for kind in PanelKind::ALL {
                    let mut enabled = self.layout_editor.positions().get(kind).enabled;
                    if ui
                        .checkbox(&mut enabled, format!("Show {} panel", kind.name()))
                        .changed()
                    {
                        self.layout_editor
                            .toggle_panel(kind, &mut self.settings, &mut self.settings_file);
                        layout_changed = true;
                    }
                }
                ui.label("Drag a tile to place its panel. Edges within 30px snap.");
                layout_changed |= self.layout_preview(ui);
                for (kind, config) in self.layout_editor.positions().iter() {
                    ui.small(format!("{}: {}", kind.name(), describe(&config.position)));
                }
                ui.separator();
                ui.small(format!("Saved to {}", self.settings_file.path().display()));
            });

        self.show_settings = open;
        if !open {
            self.layout_editor.cancel();
        }
        if settings_changed {
            self.apply_settings();
        } else if layout_changed {
            // the editor already saved
            self.engine
                .set_options(&mut self.doc, EngineOptions::from(&self.settings));
        }
    }

    /// Draws the scaled container with one draggable tile per enabled panel.
    /// Returns whether a drop changed the stored layout.
    fn layout_preview(&mut self, ui: &mut egui::Ui) -> bool {
        let (area, _) = ui.allocate_exact_size(PREVIEW_SIZE, egui::Sense::hover());
        let painter = ui.painter_at(area);
        let visuals = ui.visuals().clone();
        painter.rect_filled(area, 4.0, visuals.extreme_bg_color);
        painter.rect_stroke(
            area,
            4.0,
            visuals.widgets.noninteractive.bg_stroke,
            egui::StrokeKind::Inside,
        );

        let fold_tile = egui::Rect::from_min_size(area.min + egui::vec2(10.0, 10.0), egui::vec2(34.0, 34.0));
        painter.rect_filled(fold_tile, 3.0, visuals.widgets.noninteractive.weak_bg_fill);
        painter.text(
            fold_tile.center(),
            egui::Align2::CENTER_CENTER,
            "fold",
            egui::FontId::proportional(10.0),
            visuals.weak_text_color(),
        );

        let container = Rect::from_rect(area);
        let tile_size = Size::new(PANEL_WIDTH, PANEL_HEIGHT);
        let mut dropped = false;

        for kind in PanelKind::ALL {
            let config = self.layout_editor.positions().get(kind);
            if !config.enabled {
                continue;
            }
            let position = match (self.layout_editor.dragged(), self.layout_editor.preview_position()) {
                (Some(item), Some(preview)) if item.panel == kind => preview.clone(),
                _ => config.position.clone(),
            };
            let at = position.resolve(container.size(), tile_size);
            let tile = egui::Rect::from_min_size(area.min + egui::vec2(at.x, at.y), tile_size.to_vec2());

            let response = ui.interact(tile, ui.id().with(("layout-tile", kind.name())), egui::Sense::drag());
            let pointer = response.interact_pointer_pos().map(Point::from_pos2);
            if let Some(pointer) = pointer {
                if response.drag_started() {
                    self.layout_editor.drag_start(kind, pointer, Rect::from_rect(tile));
                }
                if response.dragged() {
                    self.layout_editor.drag_move(pointer, container);
                }
                if response.drag_stopped() {
                    dropped |= self
                        .layout_editor
                        .drop(pointer, container, &mut self.settings, &mut self.settings_file)
                        .is_some();
                }
            } else if response.drag_stopped() {
                self.layout_editor.cancel();
            }

            let fill = if response.dragged() || response.hovered() {
                visuals.selection.bg_fill
            } else {
                visuals.widgets.inactive.weak_bg_fill
            };
            painter.rect_filled(tile, 4.0, fill);
            painter.text(
                tile.center(),
                egui::Align2::CENTER_CENTER,
                kind.name(),
                egui::FontId::proportional(12.0),
                visuals.text_color(),
            );
        }
        dropped
    }
}

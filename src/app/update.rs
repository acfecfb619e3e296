use eframe::egui;
use log::{debug, trace};

use diagram_zoom_drag::geometry::Point;
use diagram_zoom_drag::render::sync_measurements;
use diagram_zoom_drag::viewport::{DocumentMode, InputEvent, InputOutcome, PointerButton};

use super::ViewerApp;
use super::command_palette::{CommandContext, CommandPalette};
use super::render::{FrameOutput, draw_document};

/// Pixels per wheel line, the usual browser value.
const LINE_HEIGHT: f32 = 40.0;

struct PointerFrame {
    pos: Option<egui::Pos2>,
    pressed: bool,
    released: bool,
    moved: bool,
    wheel: Vec<(f32, bool)>,
}

impl ViewerApp {
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let mut open_palette = false;
        let mut open_file = false;
        let mut reload = false;
        ctx.input_mut(|i| {
            if !self.command_palette.open
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                open_palette = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                open_file = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::R) {
                reload = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Comma) {
                self.show_settings = true;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
        });
        if open_palette {
            self.command_palette.open("");
        }
        if open_file {
            self.open_document_dialog();
        }
        if reload {
            self.reload_document();
        }
    }

    /// Collapses everything when the window loses focus, if enabled.
    fn track_focus(&mut self, ctx: &egui::Context) {
        let focused = ctx.input(|i| i.focused);
        if self.window_focused
            && !focused
            && self.settings.automatic_collapsing_on_focus_change
        {
            debug!("Window lost focus, collapsing diagrams");
            self.collapse_all();
        }
        self.window_focused = focused;
    }

    fn read_pointer(&self, ctx: &egui::Context) -> PointerFrame {
        let page = self
            .hovered
            .and_then(|c| self.hits.container_rect(c))
            .map_or(ctx.content_rect().height(), |r| r.height());
        ctx.input(|i| {
            let wheel = i
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::MouseWheel {
                        unit,
                        delta,
                        modifiers,
                        ..
                    } => {
                        let pixels = match unit {
                            egui::MouseWheelUnit::Point => delta.y,
                            egui::MouseWheelUnit::Line => delta.y * LINE_HEIGHT,
                            egui::MouseWheelUnit::Page => delta.y * page,
                        };
                        // egui reports content motion, the engine wants scroll direction
                        Some((-pixels, modifiers.command || modifiers.ctrl))
                    }
                    _ => None,
                })
                .collect();
            PointerFrame {
                pos: i.pointer.hover_pos(),
                pressed: i.pointer.primary_pressed(),
                released: i.pointer.primary_released(),
                moved: i.pointer.delta() != egui::Vec2::ZERO,
                wheel,
            }
        })
    }

    /// Routes raw pointer input to the container under the pointer, using
    /// the hit areas of the previous frame.
    fn route_pointer(&mut self, ctx: &egui::Context) {
        let frame = self.read_pointer(ctx);
        let covered = frame.pos.is_some_and(|p| {
            ctx.layer_id_at(p)
                .is_some_and(|layer| layer.order != egui::Order::Background)
        });
        let over = frame
            .pos
            .filter(|_| !covered)
            .and_then(|p| self.hits.container_at(p).map(|hit| (p, hit)));

        let over_id = over.map(|(_, (container, _))| container);
        if over_id != self.hovered {
            if let Some(previous) = self.hovered {
                self.engine
                    .handle_input(&mut self.doc, previous, InputEvent::PointerLeave);
            }
            self.hovered = over_id;
        }

        let Some((pos, (container, rect))) = over else {
            return;
        };
        let local = Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let mut events = Vec::new();
        if frame.pressed && !self.hits.over_button(pos) {
            events.push(InputEvent::PointerDown {
                position: local,
                button: PointerButton::Primary,
            });
        }
        if frame.moved {
            events.push(InputEvent::PointerMove { position: local });
        }
        if frame.released {
            events.push(InputEvent::PointerUp {
                button: PointerButton::Primary,
            });
        }
        events.extend(frame.wheel.iter().map(|&(delta_y, zoom_modifier)| InputEvent::Wheel {
            position: local,
            delta_y,
            zoom_modifier,
        }));

        let mut consumed = false;
        for event in events {
            trace!(container = container.to_string(), event:? = event; "Pointer input");
            let outcome = self.engine.handle_input(&mut self.doc, container, event);
            if matches!(event, InputEvent::Wheel { .. }) && outcome == InputOutcome::Consumed {
                consumed = true;
            }
        }
        if consumed {
            // keep the document from scrolling under a zooming diagram
            ctx.input_mut(|i| {
                i.smooth_scroll_delta = egui::Vec2::ZERO;
                i.raw_scroll_delta = egui::Vec2::ZERO;
            });
        }
        let cursor = self
            .engine
            .instance(container)
            .and_then(|instance| self.doc.style(instance.element(), "cursor"));
        match cursor {
            Some("grabbing") => ctx.set_cursor_icon(egui::CursorIcon::Grabbing),
            Some("grab") if !self.hits.over_button(pos) => ctx.set_cursor_icon(egui::CursorIcon::Grab),
            _ => {}
        }
    }

    fn draw_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open... (⌘O)").clicked() {
                        self.open_document_dialog();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(self.document_path.is_some(), egui::Button::new("Reload (⌘R)"))
                        .clicked()
                    {
                        self.reload_document();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Settings... (⌘,)").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    let mut live = self.engine.mode() == DocumentMode::LivePreview;
                    if ui.checkbox(&mut live, "Live preview").changed() {
                        self.toggle_mode();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_diagrams = self.engine.instance_count() > 0;
                    if ui
                        .add_enabled(has_diagrams, egui::Button::new("Reset all diagrams"))
                        .clicked()
                    {
                        self.reset_all();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(has_diagrams, egui::Button::new("Collapse all diagrams"))
                        .clicked()
                    {
                        self.collapse_all();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Command palette (⌘⇧P)").clicked() {
                        self.command_palette.open("");
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Shortcuts (F1)").clicked() {
                        self.show_help = true;
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn draw_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let mode = match self.engine.mode() {
                        DocumentMode::Rendered => "Rendered",
                        DocumentMode::LivePreview => "Live preview",
                    };
                    ui.label(mode);
                    ui.separator();
                    ui.label(format!("Diagrams: {}", self.engine.instance_count()));
                    if let Some(container) = self.hovered {
                        if let Some(instance) = self.engine.instance(container) {
                            ui.separator();
                            ui.label(format!("Zoom: {:.0}%", instance.transform().scale * 100.0));
                        }
                    }
                });
            });
        });
    }

    fn draw_document_panel(&mut self, ctx: &egui::Context) {
        let mut out = FrameOutput::default();
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(view) = self.view else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a markdown file with ⌘O");
                });
                return;
            };
            let viewport_height = ui.available_height();
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    out.hits.viewport = ui.clip_rect();
                    draw_document(
                        ui,
                        &mut self.doc,
                        &self.engine,
                        view,
                        &self.card,
                        viewport_height,
                        &mut out,
                    );
                });
        });

        self.hits = out.hits;
        for button in out.clicks {
            if let Some(action) = self.engine.click(&mut self.doc, button) {
                debug!(action = action.name(); "Panel button clicked");
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);
        self.track_focus(ctx);

        self.engine.process_mutations(&mut self.doc);
        sync_measurements(&self.engine, &mut self.doc, &mut self.card);
        self.engine.tick(&mut self.doc);

        self.route_pointer(ctx);

        self.draw_menu_bar(ctx);
        self.draw_status_bar(ctx);
        self.draw_document_panel(ctx);

        if self.show_settings {
            self.draw_settings_window(ctx);
        }

        let cx = CommandContext {
            has_document: self.document_path.is_some(),
            has_diagrams: self.engine.instance_count() > 0,
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }

        super::help::draw_help_window(ctx, &mut self.show_help);

        if self.engine.has_pending_fits() {
            ctx.request_repaint();
        }
    }
}

use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Commands")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(420.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();
                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "⌘O", "Open markdown file");
                help_row(ui, "⌘R", "Reload current file");
                help_row(ui, "⌘,", "Settings");
                help_row(ui, "F1", "This window");

                ui.add_space(10.0);
                ui.heading("Diagrams");
                ui.separator();
                help_row(ui, "Drag", "Pan the diagram");
                help_row(ui, "⌘/Ctrl + wheel", "Zoom around the pointer");
                help_row(ui, "Wheel", "Scroll the document");
                help_row(ui, "Arrow buttons", "Move by 50px");
                help_row(ui, "+ / −", "Zoom around the center");
                help_row(ui, "⟳", "Fit the diagram to its container");
                help_row(ui, "👁", "Hide or show the control buttons");
                help_row(ui, "⏶ / ⏷", "Fold or expand the diagram");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Drag the move and zoom tiles in the settings window to place the panels.");
                ui.label("Tiles dropped within 30px of an edge snap to that edge.");
                ui.add_space(5.0);
                ui.code(
                    r##"[panels_config.zoom]
enabled = true
position = { right = "120px", bottom = "10px" }"##,
                );
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [120.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}

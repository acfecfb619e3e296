use std::path::{Path, PathBuf};

use eframe::egui;
use log::{info, warn};

use diagram_zoom_drag::document::{DocumentTree, NodeId};
use diagram_zoom_drag::markdown;
use diagram_zoom_drag::render::SourceCard;
use diagram_zoom_drag::settings::layout::PanelLayoutEditor;
use diagram_zoom_drag::settings::{self as config, Settings, SettingsFile, SettingsSink};
use diagram_zoom_drag::viewport::{DocumentMode, Engine, EngineOptions};

mod command_palette;
mod help;
mod render;
mod settings;
mod update;

/// What the binary was asked to open.
pub struct Launch {
    pub input: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub mode: DocumentMode,
}

/// Screen-space hit areas from the previous frame, used to route raw
/// pointer input before the widgets of the current frame exist.
struct HitAreas {
    /// Visible part of the document scroll area.
    viewport: egui::Rect,
    containers: Vec<(NodeId, egui::Rect)>,
    buttons: Vec<egui::Rect>,
}

impl Default for HitAreas {
    fn default() -> Self {
        Self {
            viewport: egui::Rect::NOTHING,
            containers: Vec::new(),
            buttons: Vec::new(),
        }
    }
}

impl HitAreas {
    fn container_at(&self, pos: egui::Pos2) -> Option<(NodeId, egui::Rect)> {
        if !self.viewport.contains(pos) {
            return None;
        }
        self.containers.iter().copied().find(|(_, r)| r.contains(pos))
    }

    fn container_rect(&self, container: NodeId) -> Option<egui::Rect> {
        self.containers
            .iter()
            .find(|(c, _)| *c == container)
            .map(|(_, r)| *r)
    }

    fn over_button(&self, pos: egui::Pos2) -> bool {
        self.buttons.iter().any(|r| r.contains(pos))
    }
}

pub struct ViewerApp {
    doc: DocumentTree,
    engine: Engine,
    view: Option<NodeId>,
    document_path: Option<PathBuf>,
    settings: Settings,
    settings_file: SettingsFile,
    layout_editor: PanelLayoutEditor,
    card: SourceCard,
    hits: HitAreas,
    hovered: Option<NodeId>,
    window_focused: bool,
    status: Option<String>,
    show_settings: bool,
    show_help: bool,
    command_palette: command_palette::CommandPalette,
}

impl ViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: Launch) -> Self {
        let mut status = None;
        let (settings, settings_path) = match config::locate_settings(launch.settings.as_deref()) {
            Ok(found) => found,
            Err(e) => {
                warn!(err:% = e; "Falling back to default settings");
                status = Some(format!("Settings load failed: {e}"));
                let path = launch
                    .settings
                    .clone()
                    .or_else(config::default_settings_path)
                    .unwrap_or_else(|| PathBuf::from(config::SETTINGS_FILE_NAME));
                (Settings::default(), path)
            }
        };

        let engine = Engine::new(launch.mode, EngineOptions::from(&settings));
        let mut app = Self {
            doc: DocumentTree::new(),
            engine,
            view: None,
            document_path: None,
            layout_editor: PanelLayoutEditor::new(&settings),
            settings,
            settings_file: SettingsFile::new(settings_path),
            card: SourceCard::default(),
            hits: HitAreas::default(),
            hovered: None,
            window_focused: true,
            status,
            show_settings: false,
            show_help: false,
            command_palette: command_palette::CommandPalette::default(),
        };
        if let Some(path) = launch.input {
            app.open_document(&path);
        }
        app
    }

    fn open_document(&mut self, path: &Path) {
        if let Some(view) = self.view.take() {
            self.doc.disconnect(view);
            self.doc.remove(view);
            self.engine.forget_detached(&self.doc);
        }
        match markdown::load_markdown(path, &mut self.doc, self.engine.mode()) {
            Ok(view) => {
                self.engine.observe(&mut self.doc, view);
                self.view = Some(view);
                self.document_path = Some(path.to_path_buf());
                self.status = Some(format!(
                    "Loaded {} ({} diagrams)",
                    path.display(),
                    self.engine.instance_count()
                ));
            }
            Err(e) => self.status = Some(format!("Open failed: {e}")),
        }
    }

    /// Re-parses the current file into the existing view. The engine picks
    /// the new blocks up through its mutation records.
    fn reload_document(&mut self) {
        let (Some(path), Some(view)) = (self.document_path.clone(), self.view) else {
            self.status = Some("No document to reload".to_string());
            return;
        };
        match markdown::reload_markdown(&path, &mut self.doc, view, self.engine.mode()) {
            Ok(diagrams) => {
                self.status = Some(format!("Reloaded {} ({diagrams} diagrams)", path.display()))
            }
            Err(e) => self.status = Some(format!("Reload failed: {e}")),
        }
    }

    fn open_document_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Markdown", &["md", "markdown"])
            .pick_file()
        {
            self.open_document(&path);
        }
    }

    fn set_mode(&mut self, mode: DocumentMode) {
        if self.engine.mode() == mode {
            return;
        }
        self.engine.set_mode(mode);
        info!(mode:? = mode; "Switched document mode");
        // diagrams have to be rebuilt from source for the other adapter
        if let Some(path) = self.document_path.clone() {
            self.open_document(&path);
        }
    }

    fn toggle_mode(&mut self) {
        let next = match self.engine.mode() {
            DocumentMode::Rendered => DocumentMode::LivePreview,
            DocumentMode::LivePreview => DocumentMode::Rendered,
        };
        self.set_mode(next);
    }

    /// Pushes the current settings into the engine and saves them.
    fn apply_settings(&mut self) {
        self.engine
            .set_options(&mut self.doc, EngineOptions::from(&self.settings));
        self.layout_editor.reload(&self.settings);
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.settings_file.save(&self.settings) {
            warn!(err:% = e; "Failed to save settings");
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }

    fn reset_all(&mut self) {
        self.engine.reset_all(&mut self.doc);
        self.status = Some("Reset all diagrams".to_string());
    }

    fn collapse_all(&mut self) {
        let folded = self.engine.collapse_all(&mut self.doc);
        self.status = Some(format!("Collapsed {folded} diagrams"));
    }
}

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug, info};

use diagram_zoom_drag::viewport::DocumentMode;

mod app;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Markdown document to open
    #[arg(help = "Path to a markdown file")]
    input: Option<PathBuf>,

    /// Path to the settings file (TOML or JSON)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Treat diagrams as editable source blocks instead of rendered output
    #[arg(long)]
    live_preview: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'info' instead.", args.log_level);
        LevelFilter::Info
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting diagram viewer");
    debug!(args:?; "Parsed arguments");

    let launch = app::Launch {
        input: args.input,
        settings: args.settings,
        mode: if args.live_preview {
            DocumentMode::LivePreview
        } else {
            DocumentMode::Rendered
        },
    };
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Diagram Zoom Drag",
        native_options,
        Box::new(|cc| Ok(Box::new(app::ViewerApp::new(cc, launch)))),
    )
}

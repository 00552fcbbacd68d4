mod config;
mod error;
mod events;
mod export;
mod history;
mod layout;
mod loader;
mod processing;
mod removal;
mod state;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use config::AppConfig;
use events::{LogSink, UsageEvent, UsageSink};
use export::ExportFormat;
use history::History;
use layout::{GridLayout, PREVIEW_SCALE, PageSpec};
use state::EditState;

#[derive(Parser, Debug)]
#[command(
    name = "photosheet",
    about = "Turns one portrait photo into a print-ready A4 sheet of passport photos",
    version
)]
struct Cli {
    /// Portrait photo to lay out (JPG/PNG/WebP/BMP/TIFF, up to 10 MiB)
    #[arg(required_unless_present = "set_api_key")]
    input: Option<PathBuf>,

    /// Number of photo rows on the sheet (1-6)
    #[arg(short, long, default_value_t = 6)]
    rows: u32,

    /// Rotation in degrees (-180 to 180)
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<f32>,

    /// Zoom factor (0.5 to 3.0)
    #[arg(long)]
    zoom: Option<f32>,

    /// Horizontal pan in cell pixels (-100 to 100)
    #[arg(long, allow_negative_numbers = true)]
    offset_x: Option<f32>,

    /// Vertical pan in cell pixels (-100 to 100)
    #[arg(long, allow_negative_numbers = true)]
    offset_y: Option<f32>,

    /// Cell background color, #RRGGBB
    #[arg(long)]
    background: Option<String>,

    /// Border width in pixels (0 disables the border)
    #[arg(long)]
    border_width: Option<u32>,

    /// Border color, #RRGGBB
    #[arg(long)]
    border_color: Option<String>,

    /// Brightness percentage (50 to 150, 100 = unchanged)
    #[arg(long)]
    brightness: Option<f32>,

    /// Contrast percentage (50 to 150, 100 = unchanged)
    #[arg(long)]
    contrast: Option<f32>,

    /// Saturation percentage (0 to 200, 100 = unchanged)
    #[arg(long)]
    saturation: Option<f32>,

    /// Sharpness percentage (50 to 150, 100 = unchanged)
    #[arg(long)]
    sharpness: Option<f32>,

    /// Remove the photo background before composing
    #[arg(long)]
    remove_background: bool,

    /// Skip the load-time auto-centering nudge
    #[arg(long)]
    no_auto_center: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormat::Jpg)]
    format: ExportFormat,

    /// Output file (defaults to a timestamped name in the working directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a quarter-scale preview next to the output
    #[arg(long)]
    preview: bool,

    /// Apply edit parameters saved earlier (JSON) before the flags above
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Save the final edit parameters as JSON
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Store the background-removal service credential in the user config
    /// and exit
    #[arg(long, value_name = "KEY")]
    set_api_key: Option<String>,
}

/// Flags override whatever came from defaults or a loaded parameter file.
fn apply_cli_overrides(state: &mut EditState, cli: &Cli) -> anyhow::Result<()> {
    if let Some(v) = cli.rotation {
        state.rotation_degrees = v;
    }
    if let Some(v) = cli.zoom {
        state.zoom = v;
    }
    if let Some(v) = cli.offset_x {
        state.offset_x = v;
    }
    if let Some(v) = cli.offset_y {
        state.offset_y = v;
    }
    if let Some(ref v) = cli.background {
        state.background_color = state::parse_hex_color(v).context("--background")?;
    }
    if let Some(v) = cli.border_width {
        state.border_width = v;
    }
    if let Some(ref v) = cli.border_color {
        state.border_color = state::parse_hex_color(v).context("--border-color")?;
    }
    if let Some(v) = cli.brightness {
        state.brightness = v;
    }
    if let Some(v) = cli.contrast {
        state.contrast = v;
    }
    if let Some(v) = cli.saturation {
        state.saturation = v;
    }
    if let Some(v) = cli.sharpness {
        state.sharpness = v;
    }
    state.clamp_domains();
    Ok(())
}

/// `page.jpg` → `preview_page.jpg`, in the same directory.
fn preview_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    output.with_file_name(format!("preview_{name}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if let Some(ref key) = cli.set_api_key {
        config.remove_bg_api_key = Some(key.clone());
        config.save();
        println!("Background-removal credential stored");
        return Ok(());
    }

    let sink = LogSink;
    let mut history = History::new();

    let input = cli.input.as_deref().context("no input photo given")?;
    let img = loader::open_image(input)
        .with_context(|| format!("loading {}", input.display()))?;
    info!(
        width = img.width(),
        height = img.height(),
        "decoded {}",
        input.display()
    );

    let mut state = EditState {
        auto_center: !cli.no_auto_center,
        ..EditState::default()
    };
    state.set_source(img);
    if let Some(ref path) = cli.load_state {
        match EditState::load(path) {
            Some(loaded) => state.adopt_parameters(&loaded),
            None => warn!("could not read edit parameters from {}", path.display()),
        }
    }
    apply_cli_overrides(&mut state, &cli)?;
    sink.record(UsageEvent::PhotoUploaded);
    history.commit(state.clone());

    if cli.remove_background {
        let source = state
            .source_image
            .clone()
            .context("no source image loaded")?;
        let (processed, method) = removal::remove_background(
            &source,
            config.api_key().as_deref(),
            &config.segmentation_params(),
        )?;
        state.set_processed(processed);
        sink.record(UsageEvent::BackgroundRemoved);
        history.commit(state.clone());
        println!("Background removed with {}", method.label());
    }

    let layout = GridLayout::compute(&PageSpec::default())?;
    let rows = layout.clamp_rows(cli.rows);
    if rows != cli.rows {
        warn!("requested {} rows, sheet fits {rows}", cli.rows);
    }

    let snapshot = history
        .current()
        .cloned()
        .context("no edit snapshot committed")?;
    let cell = processing::compose::compose_cell(&snapshot, layout.cell_width, layout.cell_height);
    let page = layout::render_page(&layout, &cell, rows);

    let output = cli.output.clone().unwrap_or_else(|| {
        PathBuf::from(export::default_filename(rows, layout.columns, cli.format))
    });
    let jpg_quality = config.jpg_quality.unwrap_or(export::DEFAULT_JPG_QUALITY);
    export::save_page(&page, &output, cli.format, jpg_quality)
        .with_context(|| format!("writing {}", output.display()))?;
    sink.record(UsageEvent::PhotoExported);
    println!(
        "Exported {} photos ({rows} rows) as {} → {}",
        rows * layout.columns,
        cli.format.label(),
        output.display()
    );

    if cli.preview {
        let preview = layout::render_preview(&layout, &cell, rows, PREVIEW_SCALE);
        let path = preview_path(&output);
        export::save_page(&preview, &path, cli.format, jpg_quality)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Preview → {}", path.display());
    }

    if let Some(ref path) = cli.save_state {
        state.save(path)?;
        println!("Edit parameters → {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_replace_loaded_parameters() {
        let cli = Cli::parse_from([
            "photosheet",
            "photo.jpg",
            "--zoom",
            "2.0",
            "--border-color",
            "#333333",
            "--offset-y",
            "-10",
        ]);
        let mut state = EditState::default();
        state.rotation_degrees = 45.0;
        apply_cli_overrides(&mut state, &cli).unwrap();

        assert_eq!(state.zoom, 2.0);
        assert_eq!(state.border_color, [0x33, 0x33, 0x33]);
        assert_eq!(state.offset_y, -10.0);
        // Untouched by any flag: kept as loaded.
        assert_eq!(state.rotation_degrees, 45.0);
    }

    #[test]
    fn cli_overrides_are_clamped_into_domain() {
        let cli = Cli::parse_from(["photosheet", "photo.jpg", "--zoom", "9.0"]);
        let mut state = EditState::default();
        apply_cli_overrides(&mut state, &cli).unwrap();
        assert_eq!(state.zoom, 3.0);
    }

    #[test]
    fn bad_hex_color_is_rejected() {
        let cli = Cli::parse_from(["photosheet", "photo.jpg", "--background", "blue"]);
        let mut state = EditState::default();
        assert!(apply_cli_overrides(&mut state, &cli).is_err());
    }

    #[test]
    fn preview_file_sits_next_to_the_output() {
        assert_eq!(
            preview_path(Path::new("/tmp/out/sheet.jpg")),
            PathBuf::from("/tmp/out/preview_sheet.jpg")
        );
        assert_eq!(
            preview_path(Path::new("sheet.png")),
            PathBuf::from("preview_sheet.png")
        );
    }
}

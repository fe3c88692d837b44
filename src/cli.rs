//! Headless front end: replay editor messages against an image file.
//!
//! ```text
//! snapmark render --image shot.png --script events.json --out redacted.png
//! snapmark render -i shot.png -o out.jpg --format jpeg --preview view.png
//! snapmark config
//! ```
//!
//! The script is a JSON array of editor messages, e.g.
//!
//! ```text
//! [{"set_tool": "blur"}, {"pointer_down": {"x": 10, "y": 10}},
//!  {"pointer_move": {"x": 200, "y": 80}}, {"pointer_up": {"x": 200, "y": 80}}]
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::capture::image::LoadedImage;
use crate::config::{EditorConfig, SurfaceKind};
use crate::export::{self, ExportFormat, write_png};
use crate::render::raster::rgba_from_pixmap;
use crate::render::text::load_font;
use crate::session::Editor;
use crate::session::messages::{Command, EditorMsg};

/// Screenshot annotation editor, headless mode.
#[derive(Parser, Debug)]
#[command(name = "snapmark", version, about = "Annotate and redact screenshots from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Apply a script of editor messages to an image and export the result
    Render(RenderArgs),
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Png,
    Jpeg,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Base image (PNG, JPEG, ...)
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,

    /// JSON array of editor messages; omitted = export the image unchanged
    #[arg(short, long, value_name = "EVENTS.json")]
    pub script: Option<PathBuf>,

    /// Where to write the composited export
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,

    #[arg(short, long, value_enum, default_value_t = FormatArg::Png)]
    pub format: FormatArg,

    /// Client width of the simulated surface; pointer coordinates in the
    /// script are relative to a surface fitted into it
    #[arg(short, long, default_value_t = 820.0)]
    pub width: f32,

    /// Simulate the pop-out editor instead of the docked panel
    #[arg(long)]
    pub popout: bool,

    /// Also write the display-resolution preview as PNG
    #[arg(long, value_name = "FILE")]
    pub preview: Option<PathBuf>,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        CliCommand::Render(args) => render(args),
        CliCommand::Config => {
            let config = EditorConfig::load();
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Apply `msg`, acknowledging writes immediately since there is no store
fn apply(editor: &mut Editor, msg: EditorMsg) {
    for command in editor.update(msg) {
        match command {
            Command::Persist(snapshot) => {
                log::trace!("Discarding snapshot v{}", snapshot.version);
                editor.update(EditorMsg::SaveFinished);
            }
            Command::PromptText { anchor, .. } => {
                log::debug!("Text placed at ({}, {}), awaiting text_entered", anchor.x, anchor.y);
            }
        }
    }
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    let config = EditorConfig::load();
    let font = load_font(config.font_path.as_deref());
    let format = match args.format {
        FormatArg::Png => ExportFormat::Png,
        FormatArg::Jpeg => ExportFormat::Jpeg {
            quality: config.jpeg_quality,
        },
    };
    let kind = if args.popout {
        SurfaceKind::Popout
    } else {
        SurfaceKind::Panel
    };
    let mut editor = Editor::new(config, kind, args.width).with_font(font);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let image = LoadedImage::decode(bytes)
        .with_context(|| format!("failed to decode {}", args.image.display()))?;
    apply(&mut editor, EditorMsg::ImageLoaded(image));

    if let Some(path) = &args.script {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let messages: Vec<EditorMsg> = serde_json::from_str(&text)
            .with_context(|| format!("invalid script {}", path.display()))?;
        log::info!("Replaying {} messages", messages.len());
        for msg in messages {
            apply(&mut editor, msg);
        }
    }

    let flattened = editor.composite()?;
    let payload = export::encode(&flattened, format)?;
    std::fs::write(&args.out, &payload.bytes)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    if let Some(path) = &args.preview {
        match editor.surface() {
            Some(surface) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                write_png(BufWriter::new(file), &rgba_from_pixmap(surface))?;
            }
            None => log::warn!("No preview surface to write"),
        }
    }

    println!(
        "{}: {}x{} {}, {} shapes",
        args.out.display(),
        payload.width,
        payload.height,
        payload.mime(),
        editor.shapes().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_parses() {
        let cli = Cli::try_parse_from([
            "snapmark", "render", "-i", "in.png", "-o", "out.jpg", "--format", "jpeg", "--popout",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Render(args) => {
                assert!(args.popout);
                assert!(matches!(args.format, FormatArg::Jpeg));
                assert_eq!(args.width, 820.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_render_applies_script() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let script = dir.path().join("events.json");
        let out = dir.path().join("out.png");
        let preview = dir.path().join("preview.png");

        let base = RgbaImage::from_pixel(200, 80, Rgba([255, 255, 255, 255]));
        write_png(File::create(&input).unwrap(), &base).unwrap();
        std::fs::write(
            &script,
            r##"[
                {"set_tool": "line"},
                {"set_color": "#000000"},
                {"set_size": 6},
                {"pointer_down": {"x": 0, "y": 40}},
                {"pointer_move": {"x": 200, "y": 40}},
                {"pointer_up": {"x": 200, "y": 40}}
            ]"##,
        )
        .unwrap();

        render(RenderArgs {
            image: input,
            script: Some(script),
            out: out.clone(),
            format: FormatArg::Png,
            // Container of 200 puts the surface at scale 1
            width: 220.0,
            popout: false,
            preview: Some(preview.clone()),
        })
        .unwrap();

        let result = image::open(&out).unwrap().to_rgba8();
        assert_eq!(result.dimensions(), (200, 80));
        assert!(result.get_pixel(100, 40)[0] < 128);
        assert_eq!(result.get_pixel(50, 10).0, [255, 255, 255, 255]);
        assert!(preview.exists());
    }
}

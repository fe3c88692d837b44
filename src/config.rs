//! Configuration persistence for snapmark settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stroke/fill color of a shape
///
/// Stored as normalized RGB; serialized as a `#rrggbb` display string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        // #66ccff
        Self::from_rgb8(0x66, 0xcc, 0xff)
    }
}

impl ShapeColor {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }

    /// Parse `#rgb` or `#rrggbb`
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        match hex.len() {
            3 => Some(Self::from_rgb8(
                digit(0)? * 17,
                digit(1)? * 17,
                digit(2)? * 17,
            )),
            6 => {
                let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
                Some(Self::from_rgb8(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for ShapeColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid color {value:?}"))
    }
}

impl From<ShapeColor> for String {
    fn from(c: ShapeColor) -> Self {
        c.to_hex()
    }
}

/// Drawing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Rect,
    Ellipse,
    Blur,
    Pixel,
    Line,
    Arrow,
    Pen,
    Text,
}

impl Tool {
    /// Single-letter keyboard shortcut
    pub fn from_key(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'r' => Some(Tool::Rect),
            'a' => Some(Tool::Arrow),
            'e' => Some(Tool::Ellipse),
            'l' => Some(Tool::Line),
            'p' => Some(Tool::Pen),
            't' => Some(Tool::Text),
            'b' => Some(Tool::Blur),
            'x' => Some(Tool::Pixel),
            _ => None,
        }
    }
}

/// Which UI surface an editor instance backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Docked side panel
    #[default]
    Panel,
    /// Full-tab pop-out editor
    Popout,
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tool selected on startup
    pub tool: Tool,
    /// Shape color on startup
    pub color: ShapeColor,
    /// Stroke size in natural-image pixels
    pub size: f32,
    /// Gaussian blur radius used by the final compositor
    pub blur_radius: u32,
    /// Pixelation cell size
    pub pixel_size: u32,
    pub grid: bool,
    pub snap: bool,
    /// Initial zoom of the docked panel
    pub panel_zoom: f32,
    /// Initial zoom of the pop-out editor
    pub popout_zoom: f32,
    /// Wait between scroll and capture for each full-page tile
    pub settle_delay_ms: u64,
    /// JPEG export quality (1-100)
    pub jpeg_quality: u8,
    /// Where downloads are written (None = user download directory)
    pub export_dir: Option<PathBuf>,
    /// Font used for text shapes (None = probe common system fonts)
    pub font_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tool: Tool::Rect,
            color: ShapeColor::default(),
            size: 4.0,
            blur_radius: 14,
            pixel_size: 8,
            grid: false,
            snap: false,
            panel_zoom: 1.0,
            popout_zoom: 2.0,
            settle_delay_ms: 120,
            jpeg_quality: 92,
            export_dir: None,
            font_path: None,
        }
    }
}

impl EditorConfig {
    /// Application directory name under the platform config dir
    pub const ID: &'static str = "snapmark";

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                log::warn!("Could not read config {}: {}", path.display(), err);
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            log::error!("No config directory available for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Starting zoom for a surface of the given kind
    pub fn initial_zoom(&self, kind: SurfaceKind) -> f32 {
        match kind {
            SurfaceKind::Panel => self.panel_zoom,
            SurfaceKind::Popout => self.popout_zoom,
        }
    }

    /// Wait between scrolling and capturing each full-page tile
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Download directory, falling back to Pictures then home
    pub fn export_dir(&self) -> Option<PathBuf> {
        self.export_dir.clone().or_else(|| {
            dirs::download_dir()
                .or_else(dirs::picture_dir)
                .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        })
    }
}

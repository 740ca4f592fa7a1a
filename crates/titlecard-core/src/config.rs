//! Option resolution: raw, possibly absent values in, an immutable
//! [`RenderConfig`] out.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TitleCardError, TitleCardResult};
use crate::math::Size;
use crate::Color;

pub const DEFAULT_SUBTITLE: &str = "Robert Kirkman, Cory Walker, & Ryan Ottley";
pub const DEFAULT_SMALL_SUBTITLE: &str = "BASED ON THE COMIC BOOK BY";
pub const DEFAULT_TITLE_FONT_SIZE: u32 = 300;
pub const DEFAULT_SUBTITLE_FONT_SIZE: u32 = 30;
pub const DEFAULT_TEXT_COLOR: &str = "#ebed00";
pub const DEFAULT_OUTLINE_COLOR: &str = "#000000";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#00008b";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
/// Canvas size used when neither a background nor `--size` is given.
pub const DEFAULT_CANVAS: Size = Size {
    width: 1920,
    height: 1080,
};
/// Tilt is the fraction of the title width removed from each side of the top edge.
pub const MAX_TILT: f64 = 0.5;

/// Optional font files picked up from the assets directory when present.
const PREFERRED_TITLE_FONT: &str = "woodblock.otf";
const PREFERRED_SUBTITLE_FONT: &str = "futura-medium.ttf";

/// Post-processing filter applied to the composited card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    None,
    Glitch,
    Distort,
    Shadow,
}

impl Effect {
    pub const ALL: [Effect; 4] = [Effect::None, Effect::Glitch, Effect::Distort, Effect::Shadow];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Glitch => "glitch",
            Effect::Distort => "distort",
            Effect::Shadow => "shadow",
        }
    }
}

impl FromStr for Effect {
    type Err = TitleCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Effect::ALL
            .into_iter()
            .find(|e| e.name() == wanted)
            .ok_or_else(|| TitleCardError::UnsupportedEffect(s.to_string()))
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-supplied options. Every field may be absent; [`RawOptions::resolve`]
/// fills in defaults and validates.
///
/// The same shape is accepted from a TOML options file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawOptions {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub small_subtitle: Option<String>,
    pub title_font_size: Option<i64>,
    pub subtitle_font_size: Option<i64>,
    pub color: Option<String>,
    pub outline_color: Option<String>,
    pub outline: Option<i64>,
    pub background: Option<String>,
    pub background_color: Option<String>,
    pub size: Option<String>,
    pub title_font: Option<String>,
    pub subtitle_font: Option<String>,
    pub assets_dir: Option<PathBuf>,
    pub tilt: Option<f64>,
    pub effect: Option<String>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub show_credits: Option<bool>,
}

impl RawOptions {
    /// Options with only the title set.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Read options from a TOML file.
    pub fn load_from_file(path: &Path) -> TitleCardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TitleCardError::invalid(format!(
                "failed to read options file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&contents).map_err(|e| {
            TitleCardError::invalid(format!(
                "failed to parse options file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Field-wise merge: values set on `self` win over `fallback`.
    pub fn or(self, fallback: RawOptions) -> RawOptions {
        RawOptions {
            title: self.title.or(fallback.title),
            subtitle: self.subtitle.or(fallback.subtitle),
            small_subtitle: self.small_subtitle.or(fallback.small_subtitle),
            title_font_size: self.title_font_size.or(fallback.title_font_size),
            subtitle_font_size: self.subtitle_font_size.or(fallback.subtitle_font_size),
            color: self.color.or(fallback.color),
            outline_color: self.outline_color.or(fallback.outline_color),
            outline: self.outline.or(fallback.outline),
            background: self.background.or(fallback.background),
            background_color: self.background_color.or(fallback.background_color),
            size: self.size.or(fallback.size),
            title_font: self.title_font.or(fallback.title_font),
            subtitle_font: self.subtitle_font.or(fallback.subtitle_font),
            assets_dir: self.assets_dir.or(fallback.assets_dir),
            tilt: self.tilt.or(fallback.tilt),
            effect: self.effect.or(fallback.effect),
            seed: self.seed.or(fallback.seed),
            output: self.output.or(fallback.output),
            show_credits: self.show_credits.or(fallback.show_credits),
        }
    }

    /// Validate and fill defaults.
    ///
    /// Input errors are reported as `InvalidConfig` before any file system
    /// check; a referenced background or font that is missing on disk is an
    /// `AssetLoad` error.
    pub fn resolve(&self) -> TitleCardResult<RenderConfig> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TitleCardError::invalid("title must not be empty"))?
            .to_string();

        let title_font_size =
            positive("title font size", self.title_font_size, DEFAULT_TITLE_FONT_SIZE)?;
        let subtitle_font_size = positive(
            "subtitle font size",
            self.subtitle_font_size,
            DEFAULT_SUBTITLE_FONT_SIZE,
        )?;

        let text_color = color("color", self.color.as_deref(), DEFAULT_TEXT_COLOR)?;
        let outline_color = color(
            "outline color",
            self.outline_color.as_deref(),
            DEFAULT_OUTLINE_COLOR,
        )?;
        let background_color = color(
            "background color",
            self.background_color.as_deref(),
            DEFAULT_BACKGROUND_COLOR,
        )?;

        let outline_width = match self.outline.unwrap_or(0) {
            w if w < 0 => {
                return Err(TitleCardError::invalid(format!(
                    "outline width must be >= 0, got {}",
                    w
                )))
            }
            w => u32::try_from(w)
                .map_err(|_| TitleCardError::invalid(format!("outline width {} is too large", w)))?,
        };

        let perspective_tilt = self.tilt.unwrap_or(0.0);
        if !(0.0..MAX_TILT).contains(&perspective_tilt) {
            return Err(TitleCardError::invalid(format!(
                "tilt must be in [0, {}), got {}",
                MAX_TILT, perspective_tilt
            )));
        }

        let effect = match self.effect.as_deref() {
            None => Effect::None,
            Some(name) => name.parse().map_err(|_| {
                TitleCardError::invalid(format!(
                    "unknown effect '{}' (expected one of none, glitch, distort, shadow)",
                    name
                ))
            })?,
        };

        let canvas_size = match self.size.as_deref() {
            None => None,
            Some(s) => Some(Size::parse(s).ok_or_else(|| {
                TitleCardError::invalid(format!("size must look like 1920x1080, got '{}'", s))
            })?),
        };

        let assets_dir = self
            .assets_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR));

        let background = match self.background.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) if name.eq_ignore_ascii_case("none") => None,
            Some(name) => Some(existing_asset(&assets_dir, "background", name)?),
        };
        let title_font = font(&assets_dir, self.title_font.as_deref(), PREFERRED_TITLE_FONT)?;
        let subtitle_font = font(
            &assets_dir,
            self.subtitle_font.as_deref(),
            PREFERRED_SUBTITLE_FONT,
        )?;

        let output_path = self
            .output
            .clone()
            .unwrap_or_else(|| derive_output_path(&title));

        let config = RenderConfig {
            title,
            subtitle: self
                .subtitle
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string()),
            small_subtitle: self
                .small_subtitle
                .clone()
                .unwrap_or_else(|| DEFAULT_SMALL_SUBTITLE.to_string()),
            title_font_size,
            subtitle_font_size,
            text_color,
            outline_color,
            outline_width,
            background,
            background_color,
            canvas_size,
            title_font,
            subtitle_font,
            perspective_tilt,
            effect,
            seed: self.seed,
            output_path,
            show_credits: self.show_credits.unwrap_or(false),
        };
        tracing::debug!(?config, "resolved render config");
        Ok(config)
    }
}

/// Fully-populated, validated render settings. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderConfig {
    pub title: String,
    pub subtitle: String,
    pub small_subtitle: String,
    /// Initial and maximum title size; layout only ever shrinks from here.
    pub title_font_size: u32,
    pub subtitle_font_size: u32,
    pub text_color: Color,
    pub outline_color: Color,
    /// 0 disables the outline pass.
    pub outline_width: u32,
    pub background: Option<PathBuf>,
    pub background_color: Color,
    pub canvas_size: Option<Size>,
    pub title_font: Option<PathBuf>,
    pub subtitle_font: Option<PathBuf>,
    pub perspective_tilt: f64,
    pub effect: Effect,
    pub seed: Option<u64>,
    pub output_path: PathBuf,
    pub show_credits: bool,
}

/// Output file name derived from a title: lowercase, runs of anything that is
/// not alphanumeric collapsed to `-`.
pub fn derive_output_path(title: &str) -> PathBuf {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        PathBuf::from("title-card.png")
    } else {
        PathBuf::from(format!("{}.png", slug))
    }
}

fn positive(what: &str, value: Option<i64>, default: u32) -> TitleCardResult<u32> {
    match value {
        None => Ok(default),
        Some(v) if v <= 0 => Err(TitleCardError::invalid(format!(
            "{} must be > 0, got {}",
            what, v
        ))),
        Some(v) => u32::try_from(v)
            .map_err(|_| TitleCardError::invalid(format!("{} {} is too large", what, v))),
    }
}

fn color(what: &str, value: Option<&str>, default: &str) -> TitleCardResult<Color> {
    let raw = value.unwrap_or(default);
    Color::from_hex(raw).map_err(|_| {
        TitleCardError::invalid(format!(
            "{} '{}' is not a hex color like #ebed00",
            what, raw
        ))
    })
}

fn existing_asset(assets_dir: &Path, kind: &str, name: &str) -> TitleCardResult<PathBuf> {
    let path = Path::new(name);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        assets_dir.join(kind).join(path)
    };
    if !path.is_file() {
        return Err(TitleCardError::asset(format!("{} file not found", kind), path));
    }
    Ok(path)
}

fn font(assets_dir: &Path, name: Option<&str>, preferred: &str) -> TitleCardResult<Option<PathBuf>> {
    match name {
        Some(name) => existing_asset(assets_dir, "fonts", name).map(Some),
        None => {
            let candidate = assets_dir.join("fonts").join(preferred);
            Ok(candidate.is_file().then_some(candidate))
        }
    }
}

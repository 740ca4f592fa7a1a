//! Text rendering module.
//! Uses fontdue for CPU-based font rasterization.
//!
//! Text is rasterized once into a coverage mask; the compositor stamps that
//! mask in as many colors and offsets as it needs (outline passes, fill).

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use fontdue::{Font, FontSettings, Metrics};
use titlecard_core::{Color, FrameBuffer, RenderConfig, TitleCardError, TitleCardResult};

/// Face name used for the main title.
pub const TITLE_FACE: &str = "title";
/// Face name used for both subtitle lines.
pub const SUBTITLE_FACE: &str = "subtitle";

/// Bundled faces so rendering works without any asset directory.
static DEFAULT_TITLE_FONT: OnceLock<Font> = OnceLock::new();
static DEFAULT_SUBTITLE_FONT: OnceLock<Font> = OnceLock::new();

fn default_title_font() -> &'static Font {
    DEFAULT_TITLE_FONT.get_or_init(|| {
        Font::from_bytes(
            include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf") as &[u8],
            FontSettings::default(),
        )
        .expect("embedded DejaVuSans-Bold.ttf font must be valid")
    })
}

fn default_subtitle_font() -> &'static Font {
    DEFAULT_SUBTITLE_FONT.get_or_init(|| {
        Font::from_bytes(
            include_bytes!("../assets/fonts/DejaVuSans.ttf") as &[u8],
            FontSettings::default(),
        )
        .expect("embedded DejaVuSans.ttf font must be valid")
    })
}

/// Tight extents of a single line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    /// Ink-inclusive width in pixels.
    pub width: u32,
    /// Pixels above the baseline.
    pub ascent: i32,
    /// Pixels below the baseline.
    pub descent: i32,
}

impl TextMetrics {
    pub fn height(&self) -> u32 {
        (self.ascent + self.descent).max(0) as u32
    }
}

/// Rasterized coverage of a line of text, baseline at `ascent`.
#[derive(Debug, Clone)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub ascent: i32,
    coverage: Vec<u8>,
}

impl GlyphMask {
    /// Blend the mask into `fb` with its top-left corner at (x, y).
    pub fn stamp(&self, fb: &mut FrameBuffer, x: i32, y: i32, color: &Color) {
        let [r, g, b, a] = color.to_rgba8();
        if a == 0 {
            return;
        }
        let width = self.width as usize;
        for my in 0..self.height {
            let row = my as usize * width;
            for mx in 0..self.width {
                let cov = self.coverage[row + mx as usize];
                if cov == 0 {
                    continue;
                }
                let alpha = ((cov as u32 * a as u32 + 127) / 255) as u8;
                fb.blend_pixel(x + mx as i32, y + my as i32, [r, g, b, alpha]);
            }
        }
    }

    /// Coverage at a mask pixel, 0 outside.
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }
}

struct PlacedGlyph {
    ch: char,
    x: i32,
    metrics: Metrics,
}

/// Text renderer — measures and rasterizes single lines of text.
pub struct TextRenderer {
    font_cache: HashMap<String, Font>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            font_cache: HashMap::new(),
        }
    }

    /// Renderer with the fonts a config asks for; unset faces use the bundled fonts.
    pub fn for_config(config: &RenderConfig) -> TitleCardResult<Self> {
        let mut renderer = Self::new();
        if let Some(path) = &config.title_font {
            renderer.load_font(TITLE_FACE, path)?;
        }
        if let Some(path) = &config.subtitle_font {
            renderer.load_font(SUBTITLE_FACE, path)?;
        }
        if config.title_font.is_none() || config.subtitle_font.is_none() {
            tracing::debug!("using bundled DejaVu faces for unset fonts");
        }
        Ok(renderer)
    }

    /// Load a font from a file path.
    pub fn load_font(&mut self, name: &str, path: &Path) -> TitleCardResult<()> {
        let data = std::fs::read(path).map_err(|e| {
            TitleCardError::asset(format!("failed to read font file: {}", e), path)
        })?;
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|e| {
            TitleCardError::asset(format!("failed to parse font '{}': {}", name, e), path)
        })?;
        tracing::debug!(face = name, path = %path.display(), "loaded font");
        self.font_cache.insert(name.to_string(), font);
        Ok(())
    }

    /// Get a font by face name, falling back to the bundled faces.
    fn get_font(&self, face: &str) -> &Font {
        self.font_cache.get(face).unwrap_or_else(|| {
            if face == SUBTITLE_FACE {
                default_subtitle_font()
            } else {
                default_title_font()
            }
        })
    }

    /// Measure a line of text without rasterizing it.
    pub fn measure(&self, text: &str, face: &str, font_size: f32) -> TextMetrics {
        let (_, metrics, _) = self.place(self.get_font(face), text, font_size);
        metrics
    }

    /// Rasterize a line of text into a coverage mask sized to its metrics.
    /// Fails with `TextTooLarge` when the mask cannot be addressed.
    pub fn render_mask(
        &self,
        text: &str,
        face: &str,
        font_size: f32,
    ) -> TitleCardResult<GlyphMask> {
        let font = self.get_font(face);
        let (glyphs, metrics, origin_x) = self.place(font, text, font_size);

        let width = metrics.width.max(1);
        let height = metrics.height().max(1);
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| TitleCardError::TextTooLarge {
                text: text.to_string(),
                min_size: font_size as u32,
            })?;
        let mut coverage = vec![0u8; len];

        for glyph in &glyphs {
            if glyph.metrics.width == 0 || glyph.metrics.height == 0 {
                continue;
            }
            let (gm, bitmap) = font.rasterize(glyph.ch, font_size);
            let gx0 = origin_x + glyph.x + gm.xmin;
            let gy0 = metrics.ascent - (gm.height as i32 + gm.ymin);

            for gy in 0..gm.height {
                for gx in 0..gm.width {
                    let cov = bitmap[gy * gm.width + gx];
                    if cov == 0 {
                        continue;
                    }
                    let px = gx0 + gx as i32;
                    let py = gy0 + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let idx = py as usize * width as usize + px as usize;
                    // Overlapping glyphs keep the stronger coverage.
                    coverage[idx] = coverage[idx].max(cov);
                }
            }
        }

        Ok(GlyphMask {
            width,
            height,
            ascent: metrics.ascent,
            coverage,
        })
    }

    /// Lay glyphs out along the baseline. Returns the glyphs, the tight
    /// metrics, and the x shift that moves the leftmost ink to column 0.
    fn place(&self, font: &Font, text: &str, font_size: f32) -> (Vec<PlacedGlyph>, TextMetrics, i32) {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor: f32 = 0.0;
        let mut prev: Option<char> = None;
        let mut ink_left: i32 = 0;
        let mut ink_right: i32 = 0;
        let mut ascent: i32 = 0;
        let mut descent: i32 = 0;

        for ch in text.chars() {
            if let Some(p) = prev {
                cursor += font.horizontal_kern(p, ch, font_size).unwrap_or(0.0);
            }
            let metrics = font.metrics(ch, font_size);
            let x = cursor.round() as i32;

            if metrics.width > 0 && metrics.height > 0 {
                ink_left = ink_left.min(x + metrics.xmin);
                ink_right = ink_right.max(x + metrics.xmin + metrics.width as i32);
                ascent = ascent.max(metrics.height as i32 + metrics.ymin);
                descent = descent.max(-metrics.ymin);
            }

            glyphs.push(PlacedGlyph { ch, x, metrics });
            cursor += metrics.advance_width;
            prev = Some(ch);
        }

        let right = ink_right.max(cursor.ceil() as i32);
        let metrics = TextMetrics {
            width: (right - ink_left).max(0) as u32,
            ascent,
            descent,
        };
        (glyphs, metrics, -ink_left)
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

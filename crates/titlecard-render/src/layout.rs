//! Title layout: font-size fitting and subtitle placement.
//!
//! Everything here is a pure function of its inputs. The configured title
//! size is never modified; fitting works on a local copy and reports the
//! resolved size in the returned [`GlyphLayout`].

use serde::Serialize;
use titlecard_core::{Quad, Rect, RenderConfig, Size, TitleCardError, TitleCardResult};

use crate::text::{TextMetrics, TextRenderer, SUBTITLE_FACE, TITLE_FACE};

/// How much room the title may take on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutPolicy {
    /// Horizontal margin on each side, as a fraction of canvas width.
    pub margin_fraction: f64,
    /// Largest title height, as a fraction of canvas height.
    pub max_height_fraction: f64,
    /// Font size decrement per fitting step.
    pub step: u32,
    /// Smallest size tried before giving up.
    pub min_font_size: u32,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            margin_fraction: 0.05,
            max_height_fraction: 0.45,
            step: 2,
            min_font_size: 12,
        }
    }
}

impl LayoutPolicy {
    /// Margin in pixels for a canvas.
    pub fn margin(&self, canvas: Size) -> u32 {
        (canvas.width as f64 * self.margin_fraction).round() as u32
    }

    /// Largest title box (width, height) that fits a canvas.
    pub fn max_box(&self, canvas: Size) -> (u32, u32) {
        let width = canvas.width.saturating_sub(2 * self.margin(canvas));
        let height = (canvas.height as f64 * self.max_height_fraction).floor() as u32;
        (width, height)
    }
}

/// Placement of one line of subtitle text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePlacement {
    pub text: String,
    pub font_size: u32,
    /// Ink box; `y` is the top of the line.
    pub bounds: Rect,
}

/// Computed geometry for one title card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphLayout {
    pub canvas: Size,
    /// Resolved title size, at most the configured size.
    pub font_size: u32,
    /// Title ink box, excluding the outline.
    pub title: Rect,
    /// Baseline y of the title.
    pub baseline: i32,
    /// Outline padding added around the title on every side.
    pub outline: u32,
    /// Top-edge width relative to the bottom edge; 1.0 without perspective.
    pub perspective_scale: f64,
    /// Destination corners of the padded title layer when warped.
    pub perspective_quad: Option<Quad>,
    pub small_subtitle: Option<LinePlacement>,
    pub subtitle: Option<LinePlacement>,
}

impl GlyphLayout {
    /// Title box grown by the outline on every side.
    pub fn padded_title(&self) -> Rect {
        let pad = i32::try_from(self.outline).unwrap_or(i32::MAX);
        let grow = self.outline.saturating_mul(2);
        Rect::new(
            self.title.x.saturating_sub(pad),
            self.title.y.saturating_sub(pad),
            self.title.width.saturating_add(grow),
            self.title.height.saturating_add(grow),
        )
    }
}

/// Find the largest size on the grid `start, start - step, ...` (never below
/// the policy floor) whose measured box fits `max_box`.
///
/// `measure` returns the (width, height) of the title at a given size,
/// already including any padding that must fit as well. It must not shrink
/// as the size grows; the grid is searched by galloping down from `start`
/// and bisecting, so huge start sizes cost a handful of measurements.
pub fn fit_font_size<F>(
    text: &str,
    start: u32,
    max_box: (u32, u32),
    policy: &LayoutPolicy,
    measure: F,
) -> TitleCardResult<u32>
where
    F: Fn(u32) -> (u32, u32),
{
    let step = policy.step.max(1);
    let floor = policy.min_font_size.max(1);
    let start = start.max(1);

    let fits = |size: u32| {
        let (w, h) = measure(size);
        tracing::trace!(size, w, h, "measured title");
        w <= max_box.0 && h <= max_box.1
    };
    // Grid index -> size; the last index is clamped to the floor.
    let size_at = |k: u32| start.saturating_sub(k.saturating_mul(step)).max(floor);
    let too_large = || TitleCardError::TextTooLarge {
        text: text.to_string(),
        min_size: floor,
    };

    if fits(start) {
        return Ok(start);
    }
    if start <= floor {
        return Err(too_large());
    }

    let last = (start - floor).div_ceil(step);
    // `miss` never fits, `hit` is the first index found that does.
    let mut miss = 0u32;
    let mut jump = 1u32;
    let mut hit = loop {
        let k = jump.min(last);
        if fits(size_at(k)) {
            break k;
        }
        if k == last {
            return Err(too_large());
        }
        miss = k;
        jump = jump.saturating_mul(2);
    };

    while hit - miss > 1 {
        let mid = miss + (hit - miss) / 2;
        if fits(size_at(mid)) {
            hit = mid;
        } else {
            miss = mid;
        }
    }
    Ok(size_at(hit))
}

/// Text box grown by `pad` on every side, saturating instead of wrapping.
fn padded_box(m: &TextMetrics, pad: u32) -> (u32, u32) {
    let grow = pad.saturating_mul(2);
    (m.width.saturating_add(grow), m.height().saturating_add(grow))
}

/// Computes [`GlyphLayout`]s from a config and a canvas size.
pub struct LayoutEngine<'a> {
    renderer: &'a TextRenderer,
    policy: LayoutPolicy,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(renderer: &'a TextRenderer) -> Self {
        Self::with_policy(renderer, LayoutPolicy::default())
    }

    pub fn with_policy(renderer: &'a TextRenderer, policy: LayoutPolicy) -> Self {
        Self { renderer, policy }
    }

    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    /// Resolve the title size for `text` on `canvas`.
    pub fn fit_title(
        &self,
        text: &str,
        start: u32,
        outline: u32,
        canvas: Size,
    ) -> TitleCardResult<u32> {
        let max_box = self.policy.max_box(canvas);
        fit_font_size(text, start, max_box, &self.policy, |size| {
            padded_box(&self.renderer.measure(text, TITLE_FACE, size as f32), outline)
        })
    }

    /// Lay out the title and, when credits are shown, the subtitle lines.
    pub fn layout(&self, config: &RenderConfig, canvas: Size) -> TitleCardResult<GlyphLayout> {
        let outline = config.outline_width;
        let font_size = self.fit_title(&config.title, config.title_font_size, outline, canvas)?;
        let m = self
            .renderer
            .measure(&config.title, TITLE_FACE, font_size as f32);

        let x = (canvas.width as i32 - m.width as i32) / 2;
        let y = (canvas.height as i32 - m.height() as i32) / 2;
        let title = Rect::new(x, y, m.width, m.height());

        if font_size < config.title_font_size {
            tracing::info!(
                from = config.title_font_size,
                to = font_size,
                "shrunk title to fit canvas"
            );
        }

        let mut layout = GlyphLayout {
            canvas,
            font_size,
            title,
            baseline: y + m.ascent,
            outline,
            perspective_scale: 1.0,
            perspective_quad: None,
            small_subtitle: None,
            subtitle: None,
        };

        if config.perspective_tilt > 0.0 {
            let padded = layout.padded_title();
            let (quad, scale) = tilt_quad(padded, config.perspective_tilt);
            layout.perspective_quad = Some(quad);
            layout.perspective_scale = scale;
        }

        if config.show_credits {
            self.place_credits(config, &mut layout)?;
        }

        Ok(layout)
    }

    /// Small subtitle directly under the title, subtitle 1.5 small-line
    /// heights below that, both centered. Both lines share one size, shrunk
    /// from the configured size until the wider line fits between the margins.
    fn place_credits(
        &self,
        config: &RenderConfig,
        layout: &mut GlyphLayout,
    ) -> TitleCardResult<()> {
        let lines: Vec<&str> = [config.small_subtitle.as_str(), config.subtitle.as_str()]
            .into_iter()
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Ok(());
        }

        let canvas = layout.canvas;
        let max_box = (self.policy.max_box(canvas).0, canvas.height);
        let mut size = config.subtitle_font_size;
        for line in &lines {
            size = fit_font_size(line, size, max_box, &self.policy, |s| {
                let m = self.measure_subtitle(line, s);
                (m.width, m.height())
            })?;
        }
        if size < config.subtitle_font_size {
            tracing::info!(
                from = config.subtitle_font_size,
                to = size,
                "shrunk credits to fit canvas"
            );
        }

        let gap = (size / 2) as i32;
        let mut y = layout.title.bottom() + layout.outline as i32 + gap;

        if !config.small_subtitle.trim().is_empty() {
            let m = self.measure_subtitle(&config.small_subtitle, size);
            layout.small_subtitle = Some(centered_line(&config.small_subtitle, size, m, canvas, y));
            y += (m.height() as f64 * 1.5).round() as i32;
        }
        if !config.subtitle.trim().is_empty() {
            let m = self.measure_subtitle(&config.subtitle, size);
            layout.subtitle = Some(centered_line(&config.subtitle, size, m, canvas, y));
        }
        Ok(())
    }

    fn measure_subtitle(&self, text: &str, size: u32) -> TextMetrics {
        self.renderer.measure(text, SUBTITLE_FACE, size as f32)
    }
}

fn centered_line(text: &str, font_size: u32, m: TextMetrics, canvas: Size, y: i32) -> LinePlacement {
    LinePlacement {
        text: text.to_string(),
        font_size,
        bounds: Rect::new(
            (canvas.width as i32 - m.width as i32) / 2,
            y,
            m.width,
            m.height(),
        ),
    }
}

/// Quad for a title leaning back: the top edge is pulled in by
/// `tilt * width` on both sides, the bottom edge stays put.
pub fn tilt_quad(rect: Rect, tilt: f64) -> (Quad, f64) {
    let x = rect.x as f64;
    let y = rect.y as f64;
    let w = rect.width as f64;
    let h = rect.height as f64;
    let inset = w * tilt;
    (
        [[x + inset, y], [x + w - inset, y], [x + w, y + h], [x, y + h]],
        1.0 - 2.0 * tilt,
    )
}

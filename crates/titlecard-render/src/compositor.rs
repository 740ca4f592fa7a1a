//! Draws the background, the title and the credits into a [`Canvas`].

use titlecard_core::config::DEFAULT_CANVAS;
use titlecard_core::{
    Color, FrameBuffer, RenderConfig, Size, TitleCardError, TitleCardResult,
};

use crate::canvas::Canvas;
use crate::image_loader::{image_size, load_image_sized};
use crate::layout::{GlyphLayout, LinePlacement};
use crate::text::{TextRenderer, SUBTITLE_FACE, TITLE_FACE};

/// Credits are always drawn in white.
const CREDITS_COLOR: Color = Color::WHITE;

pub struct Compositor<'a> {
    renderer: &'a TextRenderer,
}

impl<'a> Compositor<'a> {
    pub fn new(renderer: &'a TextRenderer) -> Self {
        Self { renderer }
    }

    /// Canvas size without decoding the background: the explicit size, the
    /// background's own size, or the default.
    pub fn canvas_size(config: &RenderConfig) -> TitleCardResult<Size> {
        match (config.canvas_size, &config.background) {
            (Some(size), _) => Ok(size),
            (None, Some(path)) => image_size(path),
            (None, None) => Ok(DEFAULT_CANVAS),
        }
    }

    /// Decode the background at canvas size, or fill the solid background color.
    pub fn background(&self, config: &RenderConfig) -> TitleCardResult<FrameBuffer> {
        match &config.background {
            Some(path) => load_image_sized(path, config.canvas_size),
            None => {
                let size = config.canvas_size.unwrap_or(DEFAULT_CANVAS);
                Ok(FrameBuffer::solid(
                    size.width,
                    size.height,
                    &config.background_color,
                ))
            }
        }
    }

    /// Render title and credits over `background`.
    pub fn compose(
        &self,
        config: &RenderConfig,
        layout: &GlyphLayout,
        background: FrameBuffer,
    ) -> TitleCardResult<Canvas> {
        let mut canvas = Canvas::new(background);

        let layer = self.title_layer(config, layout)?;
        let padded = layout.padded_title();
        match layout.perspective_quad {
            Some(quad) => {
                if !canvas.text.composite_over_projected(&layer, quad) {
                    tracing::warn!("degenerate perspective quad, drawing title flat");
                    canvas.text.composite_over(&layer, padded.x, padded.y);
                }
            }
            None => canvas.text.composite_over(&layer, padded.x, padded.y),
        }

        for line in [&layout.small_subtitle, &layout.subtitle].into_iter().flatten() {
            self.draw_line(&mut canvas.text, line)?;
        }

        Ok(canvas)
    }

    /// The title on its own transparent layer, outline passes first, fill on top.
    /// The layer is the title box grown by the outline width on each side.
    pub fn title_layer(
        &self,
        config: &RenderConfig,
        layout: &GlyphLayout,
    ) -> TitleCardResult<FrameBuffer> {
        let mask = self
            .renderer
            .render_mask(&config.title, TITLE_FACE, layout.font_size as f32)?;
        let pad = layout.outline;
        let grow = |side: u32| {
            pad.checked_mul(2)
                .and_then(|p| side.checked_add(p))
                .ok_or_else(|| TitleCardError::TextTooLarge {
                    text: config.title.clone(),
                    min_size: layout.font_size,
                })
        };
        let mut layer = FrameBuffer::new(grow(mask.width)?, grow(mask.height)?);
        let origin = pad as i32;

        if pad > 0 {
            for (dx, dy) in outline_offsets(pad) {
                mask.stamp(&mut layer, origin + dx, origin + dy, &config.outline_color);
            }
        }
        mask.stamp(&mut layer, origin, origin, &config.text_color);
        Ok(layer)
    }

    fn draw_line(&self, fb: &mut FrameBuffer, line: &LinePlacement) -> TitleCardResult<()> {
        let mask = self
            .renderer
            .render_mask(&line.text, SUBTITLE_FACE, line.font_size as f32)?;
        mask.stamp(fb, line.bounds.x, line.bounds.y, &CREDITS_COLOR);
        Ok(())
    }
}

/// Offsets at which the outline color is stamped: a grid over
/// `-width..=width` in both axes with stride `max(1, width / 3)`, minus the center.
pub fn outline_offsets(width: u32) -> Vec<(i32, i32)> {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let stride = (width / 3).max(1) as usize;
    let mut offsets = Vec::new();
    for dx in (-w..=w).step_by(stride) {
        for dy in (-w..=w).step_by(stride) {
            if dx == 0 && dy == 0 {
                continue;
            }
            offsets.push((dx, dy));
        }
    }
    offsets
}

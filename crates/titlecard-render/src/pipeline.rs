//! The full render: layout, composite, effect, flatten.

use std::time::Instant;

use titlecard_core::hash::{self, ContentHash};
use titlecard_core::{Effect, FrameBuffer, RenderConfig, TitleCardResult};

use crate::compositor::Compositor;
use crate::effects::EffectProcessor;
use crate::layout::{GlyphLayout, LayoutEngine, LayoutPolicy};
use crate::text::TextRenderer;

/// Result of a complete render.
pub struct RenderOutput {
    /// The flattened, opaque title card.
    pub image: FrameBuffer,
    pub layout: GlyphLayout,
    pub hash: ContentHash,
    /// Seed the glitch effect ran with, if it ran.
    pub seed: Option<u64>,
}

/// Renders a [`RenderConfig`] into a single image.
pub struct TitleCardPipeline {
    renderer: TextRenderer,
    policy: LayoutPolicy,
}

impl TitleCardPipeline {
    /// Pipeline with the fonts named by `config` loaded.
    pub fn new(config: &RenderConfig) -> TitleCardResult<Self> {
        Ok(Self {
            renderer: TextRenderer::for_config(config)?,
            policy: LayoutPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: LayoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compute geometry only. Reads the background header for its size but
    /// decodes nothing.
    pub fn plan(&self, config: &RenderConfig) -> TitleCardResult<GlyphLayout> {
        let canvas = Compositor::canvas_size(config)?;
        LayoutEngine::with_policy(&self.renderer, self.policy).layout(config, canvas)
    }

    pub fn render(&self, config: &RenderConfig) -> TitleCardResult<RenderOutput> {
        let start = Instant::now();
        let compositor = Compositor::new(&self.renderer);

        // Layout needs only the canvas size, so a title that cannot fit fails
        // before the background is decoded.
        let canvas_size = Compositor::canvas_size(config)?;
        let layout =
            LayoutEngine::with_policy(&self.renderer, self.policy).layout(config, canvas_size)?;
        let background = compositor.background(config)?;
        let canvas = compositor.compose(config, &layout, background)?;

        let seed = match config.effect {
            Effect::Glitch => {
                let seed = config.seed.unwrap_or_else(rand::random);
                if config.seed.is_none() {
                    tracing::info!(seed, "glitch seed (pass --seed to reproduce)");
                }
                Some(seed)
            }
            _ => None,
        };
        let canvas = EffectProcessor::new(seed.unwrap_or(0)).apply(canvas, config.effect);

        let image = canvas.flatten();
        let hash = hash::hash_frame(&image);
        tracing::info!(
            size = %canvas_size,
            font_size = layout.font_size,
            effect = %config.effect,
            hash = %hash.short(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "rendered title card"
        );

        Ok(RenderOutput {
            image,
            layout,
            hash,
            seed,
        })
    }
}

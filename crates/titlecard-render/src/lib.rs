//! # titlecard-render
//!
//! Turns a resolved [`titlecard_core::RenderConfig`] into pixels. Fits the
//! title to the canvas, composites background, outline, fill and credits,
//! then applies the optional effect. Everything runs on the CPU.

pub mod canvas;
pub mod compositor;
pub mod effects;
pub mod image_loader;
pub mod layout;
pub mod pipeline;
pub mod text;

pub use canvas::Canvas;
pub use compositor::Compositor;
pub use effects::EffectProcessor;
pub use layout::{GlyphLayout, LayoutEngine, LayoutPolicy};
pub use pipeline::{RenderOutput, TitleCardPipeline};
pub use text::TextRenderer;

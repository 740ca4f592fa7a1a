//! # titlecard-core
//!
//! Core types and primitives for the title card renderer.
//! This crate contains foundational types shared across all titlecard crates:
//! colors, frame buffers, geometry, option resolution, and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod math;

pub use config::{Effect, RawOptions, RenderConfig};

pub use color::Color;
pub use error::{TitleCardError, TitleCardResult};
pub use frame::FrameBuffer;
pub use math::{Point2D, Quad, Rect, Size};

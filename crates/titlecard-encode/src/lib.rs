//! # titlecard-encode
//!
//! Encodes a finished [`titlecard_core::FrameBuffer`] to a lossless PNG and
//! writes it to disk. A file at the output path is only ever replaced by a
//! complete image.

pub mod encoder;

pub use encoder::{Compression, PngEncoder};

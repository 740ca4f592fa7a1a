//! Post-processing filters applied to a composited [`Canvas`].
//!
//! Glitch and distort operate on the flattened card. The drop shadow needs
//! the text silhouette, so it works on the layers and leaves them separate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use titlecard_core::{Effect, FrameBuffer, TitleCardResult};

use crate::canvas::Canvas;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchParams {
    pub min_bands: u32,
    pub max_bands: u32,
    /// Largest band shift as a fraction of the width.
    pub max_shift_fraction: f64,
    /// Tallest band as a fraction of the height.
    pub max_band_height_fraction: f64,
    /// Red channel offset applied to the whole image, as a fraction of the width.
    pub red_offset_fraction: f64,
}

impl Default for GlitchParams {
    fn default() -> Self {
        Self {
            min_bands: 6,
            max_bands: 14,
            max_shift_fraction: 1.0 / 20.0,
            max_band_height_fraction: 1.0 / 10.0,
            red_offset_fraction: 1.0 / 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortParams {
    pub wavelength: f64,
    pub amplitude: f64,
}

impl Default for DistortParams {
    fn default() -> Self {
        Self {
            wavelength: 30.0,
            amplitude: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    pub offset_x: i32,
    pub offset_y: i32,
    pub opacity: f32,
    pub blur_radius: u32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            offset_x: 12,
            offset_y: 12,
            opacity: 0.6,
            blur_radius: 8,
        }
    }
}

/// Applies one [`Effect`] to a canvas.
#[derive(Debug, Clone)]
pub struct EffectProcessor {
    seed: u64,
    pub glitch: GlitchParams,
    pub distort: DistortParams,
    pub shadow: ShadowParams,
}

impl EffectProcessor {
    /// `seed` drives the glitch effect; the other effects are deterministic.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            glitch: GlitchParams::default(),
            distort: DistortParams::default(),
            shadow: ShadowParams::default(),
        }
    }

    pub fn apply(&self, canvas: Canvas, effect: Effect) -> Canvas {
        tracing::debug!(%effect, "applying effect");
        match effect {
            Effect::None => canvas,
            Effect::Glitch => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                Canvas::new(glitch(&canvas.flatten(), &self.glitch, &mut rng))
            }
            Effect::Distort => Canvas::new(distort(&canvas.flatten(), &self.distort)),
            Effect::Shadow => drop_shadow(canvas, &self.shadow),
        }
    }

    /// Apply an effect given by name.
    pub fn apply_named(&self, canvas: Canvas, name: &str) -> TitleCardResult<Canvas> {
        let effect: Effect = name.parse()?;
        Ok(self.apply(canvas, effect))
    }
}

/// Shift random horizontal bands of random RGB channel subsets, then offset
/// the red channel of the whole image. Alpha is left alone.
pub fn glitch(frame: &FrameBuffer, params: &GlitchParams, rng: &mut StdRng) -> FrameBuffer {
    let (w, h) = (frame.width, frame.height);
    if w == 0 || h == 0 {
        return frame.clone();
    }

    let max_shift = ((w as f64 * params.max_shift_fraction) as i32).max(1);
    let max_band = ((h as f64 * params.max_band_height_fraction) as u32).max(1);
    let bands = rng.random_range(params.min_bands..=params.max_bands.max(params.min_bands));

    let mut out = frame.clone();
    for _ in 0..bands {
        let y0 = rng.random_range(0..h);
        let band_h = rng.random_range(1..=max_band);
        let shift = rng.random_range(-max_shift..=max_shift);
        // Bit 0 red, bit 1 green, bit 2 blue; never empty.
        let channels: u8 = rng.random_range(1..8);

        for y in y0..(y0 + band_h).min(h) {
            shift_row(frame, &mut out, y, shift, |c| channels & (1 << c) != 0);
        }
    }

    let red_offset = (w as f64 * params.red_offset_fraction) as i32;
    if red_offset > 0 {
        let banded = out.clone();
        for y in 0..h {
            shift_row(&banded, &mut out, y, red_offset, |c| c == 0);
        }
    }
    out
}

/// Copy the selected channels of row `y` from `src` into `dst`, moved right by
/// `shift` pixels with the edge pixel repeated.
fn shift_row<F>(src: &FrameBuffer, dst: &mut FrameBuffer, y: u32, shift: i32, take: F)
where
    F: Fn(usize) -> bool,
{
    let w = src.width as i32;
    let row = (y * src.width) as usize * 4;
    for x in 0..w {
        let sx = (x - shift).clamp(0, w - 1);
        let s = row + sx as usize * 4;
        let d = row + x as usize * 4;
        for c in 0..3 {
            if take(c) {
                dst.data[d + c] = src.data[s + c];
            }
        }
    }
}

/// Horizontal sine wave: row `y` samples from `x + sin(y / wavelength) * amplitude`,
/// the offset truncated toward zero.
pub fn distort(frame: &FrameBuffer, params: &DistortParams) -> FrameBuffer {
    let w = frame.width as i32;
    let mut out = frame.clone();
    if w == 0 || params.wavelength == 0.0 {
        return out;
    }
    for y in 0..frame.height {
        let dx = ((y as f64 / params.wavelength).sin() * params.amplitude).trunc() as i32;
        if dx == 0 {
            continue;
        }
        let row = (y * frame.width) as usize * 4;
        for x in 0..w {
            let sx = (x + dx).clamp(0, w - 1);
            let s = row + sx as usize * 4;
            let d = row + x as usize * 4;
            out.data[d..d + 4].copy_from_slice(&frame.data[s..s + 4]);
        }
    }
    out
}

/// Blurred black copy of the text silhouette, composited into the background
/// so it sits beneath the text.
pub fn drop_shadow(canvas: Canvas, params: &ShadowParams) -> Canvas {
    let Canvas {
        mut background,
        text,
    } = canvas;

    let mut silhouette = FrameBuffer::new(text.width, text.height);
    let opacity = params.opacity.clamp(0.0, 1.0);
    for (src, dst) in text
        .data
        .chunks_exact(4)
        .zip(silhouette.data.chunks_exact_mut(4))
    {
        dst[3] = (src[3] as f32 * opacity).round() as u8;
    }

    // Black RGB makes straight and premultiplied alpha the same here.
    let blurred = gaussian_blur(&silhouette, params.blur_radius);
    background.composite_over(&blurred, params.offset_x, params.offset_y);

    Canvas { background, text }
}

/// Separable Gaussian blur with a 16.16 fixed-point kernel and clamped edges.
/// Input colors must be premultiplied.
pub fn gaussian_blur(frame: &FrameBuffer, radius: u32) -> FrameBuffer {
    if radius == 0 || frame.width == 0 || frame.height == 0 {
        return frame.clone();
    }
    let kernel = gaussian_kernel_q16(radius, radius as f64 / 2.0);
    let mut tmp = vec![0u8; frame.data.len()];
    let mut out = vec![0u8; frame.data.len()];
    blur_pass(&frame.data, &mut tmp, frame.width, frame.height, &kernel, true);
    blur_pass(&tmp, &mut out, frame.width, frame.height, &kernel, false);
    FrameBuffer {
        data: out,
        width: frame.width,
        height: frame.height,
    }
}

fn gaussian_kernel_q16(radius: u32, sigma: f64) -> Vec<u32> {
    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-r..=r)
        .map(|i| (-(i * i) as f64 / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Rounding drift goes to the center tap so the kernel sums to exactly 1.0.
    let total: i64 = q.iter().map(|&v| v as i64).sum();
    let mid = q.len() / 2;
    q[mid] = (q[mid] as i64 + 65536 - total).clamp(0, 65536) as u32;
    q
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], horizontal: bool) {
    let radius = (k.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = if horizontal {
                    ((x + d).clamp(0, w - 1), y)
                } else {
                    (x, (y + d).clamp(0, h - 1))
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += kw as u64 * src[idx + c] as u64;
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = ((acc[c] + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titlecard_core::{Color, TitleCardError};

    /// Opaque horizontal gradient; red encodes x, green encodes y.
    fn gradient(width: u32, height: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                fb.set_pixel(x, y, [x as u8, y as u8, 128, 255]);
            }
        }
        fb
    }

    fn text_canvas() -> Canvas {
        let mut canvas = Canvas::new(FrameBuffer::solid(100, 100, &Color::WHITE));
        for y in 20..30 {
            for x in 20..30 {
                canvas.text.set_pixel(x, y, [255, 0, 0, 255]);
            }
        }
        canvas
    }

    #[test]
    fn test_none_is_identity() {
        let canvas = text_canvas();
        let out = EffectProcessor::new(1).apply(canvas.clone(), Effect::None);
        assert_eq!(out, canvas);
    }

    #[test]
    fn test_unknown_effect_name() {
        let result = EffectProcessor::new(1).apply_named(text_canvas(), "sparkle");
        assert!(matches!(result, Err(TitleCardError::UnsupportedEffect(_))));
        assert!(EffectProcessor::new(1).apply_named(text_canvas(), "none").is_ok());
    }

    #[test]
    fn test_glitch_is_reproducible() {
        let canvas = Canvas::new(gradient(200, 100));
        let a = EffectProcessor::new(42).apply(canvas.clone(), Effect::Glitch);
        let b = EffectProcessor::new(42).apply(canvas.clone(), Effect::Glitch);
        assert_eq!(a, b);
        assert_ne!(a.flatten(), canvas.flatten());
    }

    #[test]
    fn test_glitch_seed_changes_output() {
        let canvas = Canvas::new(gradient(200, 100));
        let a = EffectProcessor::new(1).apply(canvas.clone(), Effect::Glitch);
        let b = EffectProcessor::new(2).apply(canvas, Effect::Glitch);
        assert_ne!(a, b);
    }

    #[test]
    fn test_glitch_keeps_alpha_and_size() {
        let src = gradient(200, 100);
        let mut rng = StdRng::seed_from_u64(7);
        let out = glitch(&src, &GlitchParams::default(), &mut rng);
        assert_eq!((out.width, out.height), (200, 100));
        assert!(out.data.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_glitch_red_offset() {
        let src = gradient(400, 4);
        let params = GlitchParams {
            min_bands: 0,
            max_bands: 0,
            ..GlitchParams::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let out = glitch(&src, &params, &mut rng);
        // 400 / 200 = 2 pixel red offset, other channels untouched.
        assert_eq!(out.get_pixel(10, 1), Some([8, 1, 128, 255]));
        assert_eq!(out.get_pixel(0, 1), Some([0, 1, 128, 255]));
    }

    #[test]
    fn test_distort_follows_sine() {
        let src = gradient(200, 100);
        let out = distort(&src, &DistortParams::default());
        // sin(0) = 0: first row untouched.
        assert_eq!(out.get_pixel(50, 0), src.get_pixel(50, 0));
        // sin(47 / 30) * 10 is just under 10 and truncates to 9.
        assert_eq!(out.get_pixel(50, 47), Some([59, 47, 128, 255]));
        // Negative offsets truncate toward zero as well: -9.999 -> -9.
        assert_eq!(out.get_pixel(50, 141), Some([41, 141, 128, 255]));
        // Clamped at the right edge.
        assert_eq!(out.get_pixel(199, 47), Some([199, 47, 128, 255]));
    }

    #[test]
    fn test_shadow_sits_beneath_text() {
        let canvas = text_canvas();
        let out = EffectProcessor::new(0).apply(canvas.clone(), Effect::Shadow);

        assert_eq!(out.text, canvas.text);
        // Shadow center lands at (37, 37).
        let [r, g, b, _] = out.background.get_pixel(37, 37).unwrap();
        assert!(r < 200 && g == r && b == r, "got {:?}", (r, g, b));
        assert_eq!(out.background.get_pixel(90, 5), Some([255, 255, 255, 255]));
        // Text stays on top of its own shadow.
        assert_eq!(out.flatten().get_pixel(25, 25), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_blur_radius_zero_is_identity() {
        let src = gradient(8, 8);
        assert_eq!(gaussian_blur(&src, 0), src);
    }

    #[test]
    fn test_blur_constant_image_is_identity() {
        let src = FrameBuffer::solid(16, 12, &Color::rgba(0.2, 0.4, 0.6, 1.0));
        assert_eq!(gaussian_blur(&src, 5), src);
    }

    #[test]
    fn test_kernel_sums_to_one() {
        let k = gaussian_kernel_q16(8, 4.0);
        assert_eq!(k.len(), 17);
        assert_eq!(k.iter().sum::<u32>(), 65536);
        assert!(k[8] > k[0]);
    }
}

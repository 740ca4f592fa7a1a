use crate::math::{homography_from_points, invert_3x3, project, Quad};
use crate::Color;

/// An 8-bit RGBA pixel buffer (4 bytes per pixel, straight alpha).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Raw pixel data, row-major.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with zeros (transparent black).
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize) * 4;
        Self {
            data: vec![0u8; size],
            width,
            height,
        }
    }

    /// Create a frame buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, color: &Color) -> Self {
        let pixel = color.to_rgba8();
        Self {
            data: pixel.repeat(width as usize * height as usize),
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes. Returns `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Get the RGBA value at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let o = self.offset(x, y);
        Some([
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ])
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let o = self.offset(x, y);
        self.data[o..o + 4].copy_from_slice(&rgba);
    }

    /// Blend a single source pixel over the pixel at (x, y). Out-of-bounds
    /// coordinates are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let o = self.offset(x as u32, y as u32);
        blend_over(&rgba, &mut self.data[o..o + 4]);
    }

    /// Whether every pixel is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|p| p[3] == 0)
    }

    /// Alpha-composite `src` on top of `self` at position (dx, dy).
    /// Uses integer math laid out so the inner loop auto-vectorizes.
    pub fn composite_over(&mut self, src: &FrameBuffer, dx: i32, dy: i32) {
        let dst_width = self.width as i32;
        let dst_height = self.height as i32;

        let mut start_y = 0;
        let mut end_y = src.height as i32;
        let mut start_x = 0;
        let mut end_x = src.width as i32;

        if dy < 0 {
            start_y = -dy;
        }
        if dy + end_y > dst_height {
            end_y = dst_height - dy;
        }
        if dx < 0 {
            start_x = -dx;
        }
        if dx + end_x > dst_width {
            end_x = dst_width - dx;
        }

        if start_x >= end_x || start_y >= end_y {
            return;
        }

        let src_stride = (src.width * 4) as usize;
        let dst_stride = (self.width * 4) as usize;

        for sy in start_y..end_y {
            let dst_y = dy + sy;
            let src_row_start = (sy as usize * src_stride) + (start_x as usize * 4);
            let dst_row_start = (dst_y as usize * dst_stride) + ((dx + start_x) as usize * 4);
            let len = (end_x - start_x) as usize * 4;

            let src_slice = &src.data[src_row_start..src_row_start + len];
            let dst_slice = &mut self.data[dst_row_start..dst_row_start + len];

            for (s, d) in src_slice.chunks_exact(4).zip(dst_slice.chunks_exact_mut(4)) {
                blend_over(s, d);
            }
        }
    }

    /// Composite `src` into `self` through a projective warp that maps the
    /// source rectangle onto `dst_corners` (TL, TR, BR, BL).
    ///
    /// Destination pixels are inverse-mapped into source space and sampled
    /// bilinearly. Returns `false` if the quad is degenerate.
    pub fn composite_over_projected(&mut self, src: &FrameBuffer, dst_corners: Quad) -> bool {
        let w = src.width as f64;
        let h = src.height as f64;
        let src_pts = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
        let Some(inv) = homography_from_points(src_pts, dst_corners).and_then(invert_3x3) else {
            return false;
        };

        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for [x, y] in dst_corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let x0 = (min_x.floor() as i64).clamp(0, self.width as i64) as u32;
        let y0 = (min_y.floor() as i64).clamp(0, self.height as i64) as u32;
        let x1 = (max_x.ceil() as i64).clamp(0, self.width as i64) as u32;
        let y1 = (max_y.ceil() as i64).clamp(0, self.height as i64) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let Some(p) = project(&inv, x as f64 + 0.5, y as f64 + 0.5) else {
                    continue;
                };
                if p.x < -1.0 || p.y < -1.0 || p.x > w + 1.0 || p.y > h + 1.0 {
                    continue;
                }
                let px = src.sample_bilinear(p.x - 0.5, p.y - 0.5);
                if px[3] == 0 {
                    continue;
                }
                let o = self.offset(x, y);
                blend_over(&px, &mut self.data[o..o + 4]);
            }
        }
        true
    }

    /// Bilinear sample at fractional pixel coordinates. Samples outside the
    /// buffer are transparent. Interpolates in premultiplied space.
    pub fn sample_bilinear(&self, fx: f64, fy: f64) -> [u8; 4] {
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let mut acc = [0.0f64; 4];
        for (dx, dy, weight) in [
            (0, 0, (1.0 - tx) * (1.0 - ty)),
            (1, 0, tx * (1.0 - ty)),
            (0, 1, (1.0 - tx) * ty),
            (1, 1, tx * ty),
        ] {
            let sx = x0 + dx;
            let sy = y0 + dy;
            if weight == 0.0
                || sx < 0
                || sy < 0
                || sx >= self.width as i64
                || sy >= self.height as i64
            {
                continue;
            }
            let o = self.offset(sx as u32, sy as u32);
            let a = self.data[o + 3] as f64 * weight;
            acc[0] += self.data[o] as f64 * a;
            acc[1] += self.data[o + 1] as f64 * a;
            acc[2] += self.data[o + 2] as f64 * a;
            acc[3] += a;
        }

        if acc[3] <= 0.0 {
            return [0, 0, 0, 0];
        }
        [
            (acc[0] / acc[3]).round().clamp(0.0, 255.0) as u8,
            (acc[1] / acc[3]).round().clamp(0.0, 255.0) as u8,
            (acc[2] / acc[3]).round().clamp(0.0, 255.0) as u8,
            acc[3].round().clamp(0.0, 255.0) as u8,
        ]
    }
}

/// Porter-Duff "over" for one straight-alpha RGBA pixel.
fn blend_over(s: &[u8], d: &mut [u8]) {
    let sa = s[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        d.copy_from_slice(&s[..4]);
        return;
    }

    let da = d[3] as u32;
    let inv_sa = 255 - sa;
    let out_a = sa + ((da * inv_sa) / 255);

    if out_a == 0 {
        return;
    }

    for c in 0..3 {
        let sc = s[c] as u32;
        let dc = d[c] as u32;
        d[c] = ((sc * sa * 255 + dc * da * inv_sa) / (out_a * 255)) as u8;
    }
    d[3] = out_a as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_new() {
        let fb = FrameBuffer::new(1920, 1080);
        assert_eq!(fb.width, 1920);
        assert_eq!(fb.height, 1080);
        assert_eq!(fb.data.len(), 1920 * 1080 * 4);
        assert_eq!(fb.pixel_count(), 1920 * 1080);
        assert!(fb.is_transparent());
    }

    #[test]
    fn test_frame_buffer_solid() {
        let fb = FrameBuffer::solid(2, 2, &Color::RED);
        assert_eq!(fb.get_pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(fb.get_pixel(1, 1), Some([255, 0, 0, 255]));
        assert!(!fb.is_transparent());
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(FrameBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(FrameBuffer::from_raw(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_frame_buffer_get_set_pixel() {
        let mut fb = FrameBuffer::new(10, 10);
        fb.set_pixel(5, 5, [128, 64, 32, 255]);
        assert_eq!(fb.get_pixel(5, 5), Some([128, 64, 32, 255]));
        assert_eq!(fb.get_pixel(10, 0), None);
        assert_eq!(fb.get_pixel(0, 10), None);
    }

    #[test]
    fn test_blend_pixel_out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::solid(2, 2, &Color::WHITE);
        fb.blend_pixel(-1, 0, [0, 0, 0, 255]);
        fb.blend_pixel(0, 2, [0, 0, 0, 255]);
        assert!(fb.data.iter().all(|&b| b == 255));
    }

    #[test]
    fn test_composite_over_opaque() {
        let mut dst = FrameBuffer::solid(4, 4, &Color::BLUE);
        let src = FrameBuffer::solid(2, 2, &Color::RED);
        dst.composite_over(&src, 1, 1);
        assert_eq!(dst.get_pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(dst.get_pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(dst.get_pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_composite_over_clips_negative_offset() {
        let mut dst = FrameBuffer::solid(4, 4, &Color::BLUE);
        let src = FrameBuffer::solid(3, 3, &Color::RED);
        dst.composite_over(&src, -2, -2);
        assert_eq!(dst.get_pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.get_pixel(1, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_composite_over_transparent() {
        let mut dst = FrameBuffer::solid(4, 4, &Color::WHITE);
        let before = dst.clone();
        dst.composite_over(&FrameBuffer::new(2, 2), 0, 0);
        assert_eq!(dst, before);
    }

    #[test]
    fn test_composite_over_semi_transparent() {
        let mut dst = FrameBuffer::solid(2, 2, &Color::WHITE);
        let mut src = FrameBuffer::new(1, 1);
        src.set_pixel(0, 0, [255, 0, 0, 128]);

        dst.composite_over(&src, 0, 0);

        let pixel = dst.get_pixel(0, 0).unwrap();
        assert!(pixel[0] > 200);
        assert!(pixel[1] > 50 && pixel[1] < 200);
        assert!(pixel[2] > 50 && pixel[2] < 200);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_projected_identity_matches_plain_composite() {
        let mut src = FrameBuffer::new(6, 4);
        for x in 1..5 {
            src.set_pixel(x, 2, [200, 10, 10, 255]);
        }
        let mut plain = FrameBuffer::solid(10, 10, &Color::BLACK);
        let mut warped = plain.clone();
        plain.composite_over(&src, 2, 3);
        let ok = warped.composite_over_projected(
            &src,
            [[2.0, 3.0], [8.0, 3.0], [8.0, 7.0], [2.0, 7.0]],
        );
        assert!(ok);
        assert_eq!(plain, warped);
    }

    #[test]
    fn test_projected_trapezoid_narrows_top() {
        let src = FrameBuffer::solid(40, 20, &Color::WHITE);
        let mut dst = FrameBuffer::solid(40, 20, &Color::BLACK);
        dst.composite_over_projected(&src, [[10.0, 0.0], [30.0, 0.0], [40.0, 20.0], [0.0, 20.0]]);
        // Top corners stay black, the body and lower corners are covered.
        assert_eq!(dst.get_pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(dst.get_pixel(38, 0), Some([0, 0, 0, 255]));
        assert_eq!(dst.get_pixel(20, 10), Some([255, 255, 255, 255]));
        assert_eq!(dst.get_pixel(3, 18).map(|p| p[0] > 200), Some(true));
    }

    #[test]
    fn test_projected_degenerate_quad_is_rejected() {
        let src = FrameBuffer::solid(4, 4, &Color::WHITE);
        let mut dst = FrameBuffer::solid(4, 4, &Color::BLACK);
        let before = dst.clone();
        assert!(!dst.composite_over_projected(&src, [[1.0, 1.0]; 4]));
        assert_eq!(dst, before);
    }

    #[test]
    fn test_sample_bilinear_midpoint() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.set_pixel(0, 0, [0, 0, 0, 255]);
        fb.set_pixel(1, 0, [200, 200, 200, 255]);
        assert_eq!(fb.sample_bilinear(0.5, 0.0), [100, 100, 100, 255]);
        assert_eq!(fb.sample_bilinear(-5.0, 0.0), [0, 0, 0, 0]);
    }
}

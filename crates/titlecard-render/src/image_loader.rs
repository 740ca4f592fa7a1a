//! Image loading module.
//! Decodes PNG, JPEG, and the other formats the `image` crate knows into FrameBuffers.

use std::path::Path;

use image::imageops::FilterType;
use titlecard_core::{FrameBuffer, Size, TitleCardError, TitleCardResult};

/// Load an image file and convert it to a FrameBuffer.
pub fn load_image(path: &Path) -> TitleCardResult<FrameBuffer> {
    load_image_sized(path, None)
}

/// Load an image, scaling it to cover `size` and center-cropping the overflow.
pub fn load_image_sized(path: &Path, size: Option<Size>) -> TitleCardResult<FrameBuffer> {
    let img = image::open(path).map_err(|e| {
        TitleCardError::asset(
            format!("failed to load image '{}': {}", path.display(), e),
            path,
        )
    })?;

    let img = match size {
        Some(s) if (img.width(), img.height()) != (s.width, s.height) => {
            tracing::debug!(
                from = %Size::new(img.width(), img.height()),
                to = %s,
                "scaling background to cover canvas"
            );
            img.resize_to_fill(s.width, s.height, FilterType::Lanczos3)
        }
        _ => img,
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    FrameBuffer::from_raw(width, height, rgba.into_raw())
        .ok_or_else(|| TitleCardError::asset("decoded image has an unexpected layout", path))
}

/// Read only the header of an image to learn its size.
pub fn image_size(path: &Path) -> TitleCardResult<Size> {
    let (width, height) = image::image_dimensions(path).map_err(|e| {
        TitleCardError::asset(
            format!("failed to read image header '{}': {}", path.display(), e),
            path,
        )
    })?;
    Ok(Size::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(TitleCardError::AssetLoad { .. })));
    }

    #[test]
    fn test_load_image_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not really a png").unwrap();
        assert!(matches!(load_image(&path), Err(TitleCardError::AssetLoad { .. })));
    }

    #[test]
    fn test_load_image_keeps_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        write_png(&path, 64, 32);
        let fb = load_image(&path).unwrap();
        assert_eq!((fb.width, fb.height), (64, 32));
        assert_eq!(fb.get_pixel(3, 3), Some([10, 20, 30, 255]));
        assert_eq!(image_size(&path).unwrap(), Size::new(64, 32));
    }

    #[test]
    fn test_load_image_cover_crops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        write_png(&path, 200, 100);
        let fb = load_image_sized(&path, Some(Size::new(50, 50))).unwrap();
        assert_eq!((fb.width, fb.height), (50, 50));
        let [r, g, b, a] = fb.get_pixel(25, 25).unwrap();
        assert!(r.abs_diff(10) <= 1 && g.abs_diff(20) <= 1 && b.abs_diff(30) <= 1);
        assert_eq!(a, 255);
    }
}

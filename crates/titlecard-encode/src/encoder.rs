use std::fs;
use std::path::{Path, PathBuf};

use titlecard_core::{FrameBuffer, TitleCardError, TitleCardResult};

pub use png::Compression;

/// Lossless RGBA8 PNG encoder.
#[derive(Debug, Clone, Copy)]
pub struct PngEncoder {
    compression: Compression,
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PngEncoder {
    pub fn new() -> Self {
        Self::with_compression(Compression::Default)
    }

    pub fn with_compression(compression: Compression) -> Self {
        Self { compression }
    }

    /// Encode a frame to PNG bytes in memory.
    pub fn encode_to_vec(&self, frame: &FrameBuffer) -> Result<Vec<u8>, png::EncodingError> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, frame.width, frame.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(self.compression);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&frame.data)?;
            writer.finish()?;
        }
        Ok(buf)
    }

    /// Encode `frame` and write it to `path`.
    ///
    /// The image is encoded fully in memory, written to a temporary file next
    /// to `path` and renamed over it. On any failure `path` is left as it was.
    pub fn write(&self, frame: &FrameBuffer, path: &Path) -> TitleCardResult<()> {
        let bytes = self
            .encode_to_vec(frame)
            .map_err(|e| TitleCardError::output(format!("failed to encode PNG: {}", e), path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                TitleCardError::output(format!("failed to create output directory: {}", e), path)
            })?;
        }

        let tmp_path = temp_path_for(path);
        if let Err(e) = fs::write(&tmp_path, &bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(TitleCardError::output(
                format!("failed to write {}: {}", tmp_path.display(), e),
                path,
            ));
        }
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(TitleCardError::output(
                format!("failed to finalize output: {}", e),
                path,
            ));
        }

        tracing::info!(
            path = %path.display(),
            width = frame.width,
            height = frame.height,
            bytes = bytes.len(),
            "wrote PNG"
        );
        Ok(())
    }
}

/// Hidden sibling of `path`, unique per process.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.png".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

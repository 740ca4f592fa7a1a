use titlecard_core::{FrameBuffer, Size};

/// A title card under construction: an opaque background plus one
/// transparent, canvas-sized layer holding all text.
///
/// Keeping the text separate until [`Canvas::flatten`] lets effects work on
/// the text alone (the drop shadow needs its silhouette).
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub background: FrameBuffer,
    pub text: FrameBuffer,
}

impl Canvas {
    /// Canvas with an empty text layer matching the background.
    pub fn new(background: FrameBuffer) -> Self {
        let text = FrameBuffer::new(background.width, background.height);
        Self { background, text }
    }

    pub fn size(&self) -> Size {
        Size::new(self.background.width, self.background.height)
    }

    /// Composite the text layer over the background.
    pub fn flatten(&self) -> FrameBuffer {
        let mut out = self.background.clone();
        out.composite_over(&self.text, 0, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titlecard_core::Color;

    #[test]
    fn test_new_canvas_flattens_to_background() {
        let bg = FrameBuffer::solid(8, 4, &Color::BLUE);
        let canvas = Canvas::new(bg.clone());
        assert_eq!(canvas.size(), Size::new(8, 4));
        assert_eq!(canvas.flatten(), bg);
    }

    #[test]
    fn test_flatten_puts_text_on_top() {
        let mut canvas = Canvas::new(FrameBuffer::solid(4, 4, &Color::BLUE));
        canvas.text.set_pixel(1, 1, [255, 0, 0, 255]);
        let flat = canvas.flatten();
        assert_eq!(flat.get_pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(flat.get_pixel(0, 0), Some([0, 0, 255, 255]));
    }
}

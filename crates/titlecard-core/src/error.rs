/// Core error types for title card rendering.
use std::path::PathBuf;

/// A specialized Result type for title card operations.
pub type TitleCardResult<T> = Result<T, TitleCardError>;

/// Every way a render can fail, from option validation to the final write.
#[derive(Debug, thiserror::Error)]
pub enum TitleCardError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("asset error: {message} ({path:?})")]
    AssetLoad { message: String, path: PathBuf },

    #[error("text too large: {text:?} does not fit even at {min_size}px")]
    TextTooLarge { text: String, min_size: u32 },

    #[error("unsupported effect: {0}")]
    UnsupportedEffect(String),

    #[error("failed to write output: {message} ({path:?})")]
    OutputWrite { message: String, path: PathBuf },
}

impl TitleCardError {
    /// Create an invalid-config error.
    pub fn invalid(message: impl Into<String>) -> Self {
        TitleCardError::InvalidConfig(message.into())
    }

    /// Create an asset error.
    pub fn asset(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TitleCardError::AssetLoad {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create an output write error.
    pub fn output(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TitleCardError::OutputWrite {
            message: message.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = TitleCardError::invalid("outline width must be >= 0, got -1");
        assert_eq!(
            err.to_string(),
            "invalid config: outline width must be >= 0, got -1"
        );
    }

    #[test]
    fn test_asset_error_display() {
        let err = TitleCardError::asset("file not found", "assets/background/blue.jpg");
        assert!(err.to_string().contains("file not found"));
        assert!(err.to_string().contains("blue.jpg"));
    }

    #[test]
    fn test_text_too_large_display() {
        let err = TitleCardError::TextTooLarge {
            text: "WIDE".into(),
            min_size: 12,
        };
        assert_eq!(
            err.to_string(),
            "text too large: \"WIDE\" does not fit even at 12px"
        );
    }
}

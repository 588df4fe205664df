//! Error types for cellseg

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Could not create workspace directory: {0}")]
    WorkspaceCreation(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Problem running the segmentation engine: {0}")]
    Process(String),

    #[error("Could not find results file for timepoint: {index}")]
    MissingMask { index: usize },

    #[error("Result masks disagree on shape: {0}")]
    MaskShape(String),

    #[error("Mask conversion failed: {0}")]
    Conversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_error_display() {
        let err = DetectorError::MissingMask { index: 3 };
        assert!(err.to_string().contains("results file"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_detector_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DetectorError = io_err.into();
        match err {
            DetectorError::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }
}

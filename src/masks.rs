//! Result-mask collection
//!
//! Reads back the engine's per-timepoint label masks and reassembles them
//! into a single time-ordered, calibrated stack. A missing artifact fails
//! the whole collection immediately; no partial stack is ever returned.

use crate::error::DetectorError;
use std::path::Path;
use tracing::debug;

/// Name of the result mask for local timepoint `index`.
pub fn mask_name(index: usize) -> String {
    format!("{}_cp_masks.png", index)
}

/// A time-ordered stack of label images. Pixel values are object
/// identifiers, 0 is background.
#[derive(Debug, Clone)]
pub struct LabelStack {
    width: u32,
    height: u32,
    frames: Vec<Vec<u16>>,
    calibration: [f64; 2],
    frame_interval: f64,
}

impl LabelStack {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Pixels of one frame in a single slice, row by row.
    pub fn slice_len(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Pixel sizes along X and Y, copied from the source image.
    pub fn calibration(&self) -> [f64; 2] {
        self.calibration
    }

    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    pub fn label_at(&self, frame: usize, x: u32, y: u32) -> u16 {
        self.frames[frame][(y * self.width + x) as usize]
    }

    pub fn frame(&self, frame: usize) -> &[u16] {
        &self.frames[frame]
    }

    #[cfg(test)]
    pub(crate) fn from_frames(
        width: u32,
        height: u32,
        frames: Vec<Vec<u16>>,
        calibration: [f64; 2],
        frame_interval: f64,
    ) -> Self {
        Self {
            width,
            height,
            frames,
            calibration,
            frame_interval,
        }
    }
}

/// Collect `count` result masks from `dir`, in local-index order.
///
/// Fails with [`DetectorError::MissingMask`] naming the first local index
/// whose artifact is absent or unreadable.
pub fn collect_masks(
    dir: &Path,
    count: usize,
    calibration: [f64; 2],
    frame_interval: f64,
) -> Result<LabelStack, DetectorError> {
    let mut frames = Vec::with_capacity(count);
    let mut shape: Option<(u32, u32)> = None;
    for index in 0..count {
        let path = dir.join(mask_name(index));
        let mask = image::open(&path)
            .map_err(|_| DetectorError::MissingMask { index })?
            .to_luma16();
        let (width, height) = mask.dimensions();
        match shape {
            None => shape = Some((width, height)),
            Some(expected) if expected != (width, height) => {
                return Err(DetectorError::MaskShape(format!(
                    "Timepoint {} is {}x{}, expected {}x{}",
                    index, width, height, expected.0, expected.1
                )));
            }
            Some(_) => {}
        }
        debug!("Read mask for timepoint {} from {}", index, path.display());
        frames.push(mask.into_raw());
    }
    let (width, height) = shape.unwrap_or((0, 0));
    Ok(LabelStack {
        width,
        height,
        frames,
        calibration,
        frame_interval,
    })
}

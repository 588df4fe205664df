//! Per-timepoint artifact writer
//!
//! Slices the region of interest out of the source image and writes one
//! TIFF per timepoint into the workspace, named by a zero-based local
//! index. The index restarts at 0 regardless of the region's real first
//! frame; the caller keeps the true start frame for reprojection.

use crate::error::DetectorError;
use crate::image::{AxisKind, HyperImage, Interval};
use image::{ImageBuffer, Luma, Rgb};
use std::path::Path;
use tracing::debug;

/// Most channels an artifact can carry (written as 16-bit RGB).
const MAX_CHANNELS: u64 = 3;

/// Name of the input artifact for local timepoint `index`.
pub fn frame_name(index: usize) -> String {
    format!("{}.tif", index)
}

/// Write one cropped frame per timepoint in `interval` into `dir`.
///
/// Returns the number of artifacts written: the region's time extent, or 1
/// when the image has no time axis. The source image is not modified.
pub fn write_frames(
    img: &HyperImage,
    interval: &Interval,
    dir: &Path,
) -> Result<usize, DetectorError> {
    let channels = match img.dimension_index(AxisKind::Channel) {
        Some(c) => img.extent(c),
        None => 1,
    };
    if channels > MAX_CHANNELS {
        return Err(DetectorError::UnsupportedInput(format!(
            "Got {} channels, at most {} are supported",
            channels, MAX_CHANNELS
        )));
    }

    let time_index = img.dimension_index(AxisKind::Time);
    let count = match time_index {
        // In the interval, time is always the last dimension.
        Some(_) => interval.extent(interval.num_dimensions() - 1) as usize,
        None => 1,
    };
    let min_t = match time_index {
        Some(_) => interval.min(interval.num_dimensions() - 1),
        None => 0,
    };

    let width = interval.extent(0) as u32;
    let height = interval.extent(1) as u32;

    for local_t in 0..count {
        let global_t = min_t + local_t as i64;
        let path = dir.join(frame_name(local_t));
        let sample = |x: u32, y: u32, c: u64| {
            sample_pixel(img, interval, x, y, c, global_t)
        };
        if channels == 1 {
            let frame = ImageBuffer::<Luma<u16>, Vec<u16>>::from_fn(width, height, |x, y| {
                Luma([sample(x, y, 0)])
            });
            frame.save(&path)?;
        } else {
            // Missing third channel is zero-filled.
            let frame = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_fn(width, height, |x, y| {
                let mut px = [0u16; 3];
                for (c, v) in px.iter_mut().enumerate().take(channels as usize) {
                    *v = sample(x, y, c as u64);
                }
                Rgb(px)
            });
            frame.save(&path)?;
        }
        debug!("Saved timepoint {} to {}", global_t, path.display());
    }
    Ok(count)
}

/// Read one sample from the source image, mapping crop coordinates back to
/// the image's own axis order.
fn sample_pixel(
    img: &HyperImage,
    interval: &Interval,
    x: u32,
    y: u32,
    channel: u64,
    global_t: i64,
) -> u16 {
    let mut coords = vec![0u64; img.num_dimensions()];
    for (d, axis) in img.axes().iter().enumerate() {
        coords[d] = match axis.kind {
            AxisKind::X => (interval.min(0) + x as i64) as u64,
            AxisKind::Y => (interval.min(1) + y as i64) as u64,
            AxisKind::Channel => channel,
            AxisKind::Time => global_t as u64,
            // Z is rejected before the extractor runs.
            AxisKind::Z => 0,
        };
    }
    img.pixel(&coords)
}

//! Label-stack to spot conversion seam
//!
//! The pipeline treats object extraction as an injected capability so
//! alternative strategies can be substituted without touching the
//! orchestration core. Converters work in local coordinates: positions are
//! relative to the cropped region and frame 0 is the region's first
//! timepoint.

use crate::masks::LabelStack;
use crate::spots::Spot;
use std::collections::HashMap;
use tracing::debug;

/// Converts a calibrated label stack into spots, in local coordinates.
pub trait MaskConverter: Send + Sync {
    /// `simplify_contours` is forwarded from the run configuration;
    /// converters without contours may ignore it.
    fn convert(&self, stack: &LabelStack, simplify_contours: bool) -> Result<Vec<Spot>, String>;
}

/// Default converter: each distinct nonzero label per frame becomes one
/// spot at the label's calibrated centroid, with the equivalent disk
/// radius and the pixel area as quality.
pub struct CentroidConverter;

impl MaskConverter for CentroidConverter {
    fn convert(&self, stack: &LabelStack, _simplify_contours: bool) -> Result<Vec<Spot>, String> {
        let [cal_x, cal_y] = stack.calibration();
        let width = stack.width();
        let mut spots = Vec::new();
        for frame in 0..stack.n_frames() {
            let mut stats: HashMap<u16, (u64, u64, u64)> = HashMap::new();
            for (i, &label) in stack.frame(frame).iter().enumerate() {
                if label == 0 {
                    continue;
                }
                let x = i as u64 % width as u64;
                let y = i as u64 / width as u64;
                let entry = stats.entry(label).or_insert((0, 0, 0));
                entry.0 += 1;
                entry.1 += x;
                entry.2 += y;
            }
            debug!("Frame {}: {} labels", frame, stats.len());
            for (_, (area, sum_x, sum_y)) in stats {
                let n = area as f64;
                spots.push(Spot {
                    position: [sum_x as f64 / n * cal_x, sum_y as f64 / n * cal_y],
                    frame: frame as i64,
                    time: frame as f64 * stack.frame_interval(),
                    // Equivalent disk radius from the calibrated area.
                    radius: (n * cal_x * cal_y / std::f64::consts::PI).sqrt(),
                    quality: n,
                });
            }
        }
        Ok(spots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masks::LabelStack;

    fn stack_with_square(label: u16) -> LabelStack {
        // One 2x2 square of `label` with its top-left corner at (1, 2).
        let mut frame = vec![0u16; 6 * 6];
        for y in 2..4 {
            for x in 1..3 {
                frame[y * 6 + x] = label;
            }
        }
        LabelStack::from_frames(6, 6, vec![frame], [0.5, 0.5], 2.0)
    }

    #[test]
    fn test_centroid_and_quality() {
        let stack = stack_with_square(7);
        let spots = CentroidConverter.convert(&stack, false).unwrap();
        assert_eq!(spots.len(), 1);
        let spot = &spots[0];
        // Centroid of x in {1, 2} and y in {2, 3}, scaled by 0.5.
        assert!((spot.position[0] - 0.75).abs() < 1e-9);
        assert!((spot.position[1] - 1.25).abs() < 1e-9);
        assert_eq!(spot.frame, 0);
        assert_eq!(spot.quality, 4.0);
        assert!((spot.radius - (4.0 * 0.25 / std::f64::consts::PI).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_radius_uses_calibrated_area_for_anisotropic_pixels() {
        // 2x2 square of 0.5 x 0.25 pixels covers a calibrated area of 0.25.
        let mut frame = vec![0u16; 4 * 4];
        for y in 0..2 {
            for x in 0..2 {
                frame[y * 4 + x] = 1;
            }
        }
        let stack = LabelStack::from_frames(4, 4, vec![frame], [0.5, 0.25], 1.0);
        let spots = CentroidConverter.convert(&stack, false).unwrap();
        assert_eq!(spots.len(), 1);
        let expected = (4.0 * 0.5 * 0.25 / std::f64::consts::PI).sqrt();
        assert!((spots[0].radius - expected).abs() < 1e-9);
    }

    #[test]
    fn test_background_only_frame_yields_no_spots() {
        let stack = LabelStack::from_frames(4, 4, vec![vec![0u16; 16]], [1.0, 1.0], 1.0);
        let spots = CentroidConverter.convert(&stack, true).unwrap();
        assert!(spots.is_empty());
    }

    #[test]
    fn test_distinct_labels_become_distinct_spots() {
        let mut frame = vec![0u16; 4 * 4];
        frame[0] = 1;
        frame[15] = 2;
        let stack = LabelStack::from_frames(4, 4, vec![frame], [1.0, 1.0], 1.0);
        let mut spots = CentroidConverter.convert(&stack, false).unwrap();
        spots.sort_by(|a, b| a.position[0].partial_cmp(&b.position[0]).unwrap());
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].position, [0.0, 0.0]);
        assert_eq!(spots[1].position, [3.0, 3.0]);
    }

    #[test]
    fn test_local_frame_and_time() {
        let frame_a = vec![1u16; 4];
        let frame_b = vec![2u16; 4];
        let stack = LabelStack::from_frames(2, 2, vec![frame_a, frame_b], [1.0, 1.0], 3.0);
        let spots = CentroidConverter.convert(&stack, false).unwrap();
        let times: Vec<f64> = {
            let mut sorted: Vec<&Spot> = spots.iter().collect();
            sorted.sort_by_key(|s| s.frame);
            sorted.iter().map(|s| s.time).collect()
        };
        assert_eq!(times, vec![0.0, 3.0]);
    }
}

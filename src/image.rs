//! In-memory image model: axis-named numeric arrays and interval boxes
//!
//! The pipeline never owns pixel data; it reads a caller-supplied
//! [`HyperImage`] through this narrow interface. Data is stored flat with
//! the first axis varying fastest, which matches how the per-timepoint
//! crops are written out.

/// Semantic meaning of one image axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    X,
    Y,
    Channel,
    Z,
    Time,
}

/// One axis of a [`HyperImage`].
///
/// `scale` is physical units per pixel for spatial axes and the average
/// sampling interval for the time axis.
#[derive(Debug, Clone, Copy)]
pub struct Axis {
    pub kind: AxisKind,
    pub extent: u64,
    pub scale: f64,
}

impl Axis {
    pub fn new(kind: AxisKind, extent: u64, scale: f64) -> Self {
        Self { kind, extent, scale }
    }
}

/// A multi-dimensional, calibrated image. Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct HyperImage {
    name: String,
    axes: Vec<Axis>,
    data: Vec<u16>,
}

impl HyperImage {
    /// Create an image from flat data, first axis fastest.
    pub fn new(name: impl Into<String>, axes: Vec<Axis>, data: Vec<u16>) -> Result<Self, String> {
        if axes.is_empty() {
            return Err("Image must have at least one axis".to_string());
        }
        let expected: u64 = axes.iter().map(|a| a.extent.max(1)).product();
        if expected as usize != data.len() {
            return Err(format!(
                "Data length {} does not match axis extents (expected {})",
                data.len(),
                expected
            ));
        }
        Ok(Self {
            name: name.into(),
            axes,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn num_dimensions(&self) -> usize {
        self.axes.len()
    }

    /// Index of the axis with the given meaning, if present.
    pub fn dimension_index(&self, kind: AxisKind) -> Option<usize> {
        self.axes.iter().position(|a| a.kind == kind)
    }

    pub fn extent(&self, axis: usize) -> u64 {
        self.axes[axis].extent
    }

    pub fn average_scale(&self, axis: usize) -> f64 {
        self.axes[axis].scale
    }

    /// Pixel sizes along X and Y.
    pub fn spatial_calibration(&self) -> [f64; 2] {
        let x = self
            .dimension_index(AxisKind::X)
            .map(|d| self.axes[d].scale)
            .unwrap_or(1.0);
        let y = self
            .dimension_index(AxisKind::Y)
            .map(|d| self.axes[d].scale)
            .unwrap_or(1.0);
        [x, y]
    }

    /// Value at the given per-axis coordinates (image axis order).
    pub fn pixel(&self, coords: &[u64]) -> u16 {
        debug_assert_eq!(coords.len(), self.axes.len());
        let mut index = 0u64;
        let mut stride = 1u64;
        for (c, axis) in coords.iter().zip(self.axes.iter()) {
            debug_assert!(*c < axis.extent);
            index += c * stride;
            stride *= axis.extent;
        }
        self.data[index as usize]
    }
}

/// A per-axis inclusive [min, max] box over an image.
///
/// Dimensions are X, Y and, when the image is time-resolved, Time as the
/// last dimension. The channel axis is never part of an interval; all
/// channels are always carried along.
#[derive(Debug, Clone)]
pub struct Interval {
    min: Vec<i64>,
    max: Vec<i64>,
}

impl Interval {
    pub fn new(min: Vec<i64>, max: Vec<i64>) -> Result<Self, String> {
        if min.len() != max.len() {
            return Err("Interval min/max must have the same dimensionality".to_string());
        }
        if min.is_empty() {
            return Err("Interval must have at least one dimension".to_string());
        }
        for d in 0..min.len() {
            if min[d] > max[d] {
                return Err(format!("Interval dimension {} has min > max", d));
            }
        }
        Ok(Self { min, max })
    }

    /// Convenience constructor: `[min0, min1, .., max0, max1, ..]`.
    pub fn from_min_max(bounds: &[i64]) -> Result<Self, String> {
        if bounds.len() % 2 != 0 {
            return Err("Bounds must hold an even number of values".to_string());
        }
        let n = bounds.len() / 2;
        Self::new(bounds[..n].to_vec(), bounds[n..].to_vec())
    }

    pub fn num_dimensions(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self, d: usize) -> i64 {
        self.min[d]
    }

    pub fn max(&self, d: usize) -> i64 {
        self.max[d]
    }

    /// Number of integer steps along dimension `d`.
    pub fn extent(&self, d: usize) -> u64 {
        (self.max[d] - self.min[d] + 1) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(len: usize) -> Vec<u16> {
        (0..len).map(|i| i as u16).collect()
    }

    #[test]
    fn test_image_rejects_bad_data_length() {
        let axes = vec![
            Axis::new(AxisKind::X, 4, 1.0),
            Axis::new(AxisKind::Y, 3, 1.0),
        ];
        assert!(HyperImage::new("bad", axes, vec![0u16; 11]).is_err());
    }

    #[test]
    fn test_pixel_indexing_first_axis_fastest() {
        let axes = vec![
            Axis::new(AxisKind::X, 4, 1.0),
            Axis::new(AxisKind::Y, 3, 1.0),
        ];
        let img = HyperImage::new("grad", axes, gradient(12)).unwrap();
        assert_eq!(img.pixel(&[0, 0]), 0);
        assert_eq!(img.pixel(&[3, 0]), 3);
        assert_eq!(img.pixel(&[0, 1]), 4);
        assert_eq!(img.pixel(&[3, 2]), 11);
    }

    #[test]
    fn test_dimension_index_and_calibration() {
        let axes = vec![
            Axis::new(AxisKind::X, 2, 0.5),
            Axis::new(AxisKind::Y, 2, 0.25),
            Axis::new(AxisKind::Time, 2, 2.0),
        ];
        let img = HyperImage::new("t", axes, gradient(8)).unwrap();
        assert_eq!(img.dimension_index(AxisKind::Time), Some(2));
        assert_eq!(img.dimension_index(AxisKind::Z), None);
        assert_eq!(img.spatial_calibration(), [0.5, 0.25]);
        assert_eq!(img.average_scale(2), 2.0);
    }

    #[test]
    fn test_interval_extent() {
        let iv = Interval::from_min_max(&[2, 3, 5, 5, 7, 7]).unwrap();
        assert_eq!(iv.num_dimensions(), 3);
        assert_eq!(iv.extent(0), 4);
        assert_eq!(iv.extent(2), 3);
    }

    #[test]
    fn test_interval_rejects_inverted_bounds() {
        assert!(Interval::new(vec![5], vec![2]).is_err());
    }
}

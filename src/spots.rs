//! Detections and their frame-grouped collection

use std::collections::BTreeMap;

/// A single detected object.
///
/// Positions are in calibrated units. A spot starts life in local
/// coordinates (origin at the processed region, frame 0 at the region's
/// first timepoint) and is shifted into the source image's global
/// coordinate system before being handed to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    /// Calibrated X/Y position.
    pub position: [f64; 2],
    /// Frame index.
    pub frame: i64,
    /// Calibrated time, `frame * frame_interval`.
    pub time: f64,
    /// Equivalent disk radius, calibrated.
    pub radius: f64,
    /// Detector-specific quality value.
    pub quality: f64,
}

/// An immutable set of spots grouped by frame.
#[derive(Debug, Clone, Default)]
pub struct SpotCollection {
    by_frame: BTreeMap<i64, Vec<Spot>>,
}

impl SpotCollection {
    /// Build a collection from a flat list.
    pub fn from_spots(spots: Vec<Spot>) -> Self {
        let mut by_frame: BTreeMap<i64, Vec<Spot>> = BTreeMap::new();
        for spot in spots {
            by_frame.entry(spot.frame).or_default().push(spot);
        }
        Self { by_frame }
    }

    pub fn n_spots(&self) -> usize {
        self.by_frame.values().map(Vec::len).sum()
    }

    /// Frames holding at least one spot, ascending.
    pub fn frames(&self) -> Vec<i64> {
        self.by_frame.keys().copied().collect()
    }

    pub fn spots_at(&self, frame: i64) -> &[Spot] {
        self.by_frame.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spot> {
        self.by_frame.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(frame: i64, x: f64) -> Spot {
        Spot {
            position: [x, 0.0],
            frame,
            time: frame as f64,
            radius: 1.0,
            quality: 1.0,
        }
    }

    #[test]
    fn test_collection_groups_by_frame() {
        let spots = vec![spot(2, 1.0), spot(0, 2.0), spot(2, 3.0)];
        let collection = SpotCollection::from_spots(spots);
        assert_eq!(collection.n_spots(), 3);
        assert_eq!(collection.frames(), vec![0, 2]);
        assert_eq!(collection.spots_at(2).len(), 2);
        assert!(collection.spots_at(1).is_empty());
    }

    #[test]
    fn test_empty_collection() {
        let collection = SpotCollection::from_spots(Vec::new());
        assert_eq!(collection.n_spots(), 0);
        assert!(collection.frames().is_empty());
    }
}

//! cellseg: Cellpose-driven spot detection for time-resolved images
//!
//! Coordinates an external Cellpose process to segment objects inside a
//! region of a multi-dimensional image and reprojects the detections back
//! into the caller's coordinate space: the region is decomposed into
//! per-timepoint files in a temporary workspace, the engine is run while
//! its log file is tailed for progress, the per-timepoint result masks
//! are reassembled into a calibrated label stack, converted to spots and
//! shifted from region-local into global coordinates.
//!
//! Volumetric (multi-Z) input is not supported.

pub mod config;
pub mod convert;
pub mod detector;
pub mod engine;
pub mod error;
pub mod frames;
pub mod image;
pub mod masks;
pub mod progress;
pub mod spots;
pub mod workspace;

pub use crate::config::{CellposeConfig, PretrainedModel};
pub use crate::convert::{CentroidConverter, MaskConverter};
pub use crate::detector::CellposeDetector;
pub use crate::error::DetectorError;
pub use crate::image::{Axis, AxisKind, HyperImage, Interval};
pub use crate::masks::LabelStack;
pub use crate::progress::{NullSink, ProgressSink, TracingSink};
pub use crate::spots::{Spot, SpotCollection};
pub use crate::workspace::Workspace;

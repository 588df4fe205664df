//! The detection pipeline façade
//!
//! Runs workspace acquisition, frame extraction, the external engine,
//! mask collection, spot conversion and coordinate reprojection as one
//! sequential pipeline. Every failure is terminal for the run and is
//! surfaced as a single human-readable error message; nothing is retried.

use crate::config::CellposeConfig;
use crate::convert::MaskConverter;
use crate::engine::run_engine;
use crate::error::DetectorError;
use crate::frames::write_frames;
use crate::image::{AxisKind, HyperImage, Interval};
use crate::masks::collect_masks;
use crate::progress::ProgressSink;
use crate::spots::{Spot, SpotCollection};
use crate::workspace::Workspace;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

const BASE_ERROR_MESSAGE: &str = "CellposeDetector: ";

/// Shift spots from region-local into global coordinates, in place.
///
/// Pure additive transform: each spatial coordinate gains the region
/// offset scaled by pixel calibration, the frame index gains the region's
/// start frame, and the calibrated time follows the new frame.
pub fn reproject_spots(
    spots: &mut [Spot],
    interval: &Interval,
    calibration: &[f64; 2],
    start_frame: i64,
    frame_interval: f64,
) {
    for spot in spots {
        for d in 0..2 {
            spot.position[d] += interval.min(d) as f64 * calibration[d];
        }
        spot.frame += start_frame;
        spot.time = spot.frame as f64 * frame_interval;
    }
}

/// One-shot spot detector driving the external Cellpose engine.
///
/// Usage follows check-then-process: `check_input` validates the image
/// shape, `process` runs the pipeline once, then exactly one of `result`
/// and `error_message` is set.
pub struct CellposeDetector {
    img: Arc<HyperImage>,
    interval: Interval,
    config: CellposeConfig,
    converter: Arc<dyn MaskConverter>,
    sink: Arc<dyn ProgressSink>,
    spots: Option<SpotCollection>,
    error_message: Option<String>,
    processing_time: Duration,
}

impl CellposeDetector {
    pub fn new(
        img: Arc<HyperImage>,
        interval: Interval,
        config: CellposeConfig,
        converter: Arc<dyn MaskConverter>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            img,
            interval,
            config,
            converter,
            sink,
            spots: None,
            error_message: None,
            processing_time: Duration::ZERO,
        }
    }

    /// Pre-flight validation. Performs no side effects; on failure the
    /// error message is set and `false` is returned.
    pub fn check_input(&mut self) -> bool {
        if self.img.dimension_index(AxisKind::Z).is_some() {
            self.fail("Image must be 2D over time, got an image with multiple Z.");
            return false;
        }
        let expected_dims = if self.img.dimension_index(AxisKind::Time).is_some() {
            3
        } else {
            2
        };
        if self.interval.num_dimensions() != expected_dims {
            self.fail(&format!(
                "Interval has {} dimensions, expected {}.",
                self.interval.num_dimensions(),
                expected_dims
            ));
            return false;
        }
        let spatial = [AxisKind::X, AxisKind::Y];
        for (d, kind) in spatial.iter().enumerate() {
            let Some(axis) = self.img.dimension_index(*kind) else {
                self.fail("Image must have X and Y axes.");
                return false;
            };
            if self.interval.min(d) < 0 || self.interval.max(d) >= self.img.extent(axis) as i64 {
                self.fail(&format!("Interval dimension {} exceeds image bounds.", d));
                return false;
            }
        }
        if let Some(t) = self.img.dimension_index(AxisKind::Time) {
            let d = self.interval.num_dimensions() - 1;
            if self.interval.min(d) < 0 || self.interval.max(d) >= self.img.extent(t) as i64 {
                self.fail("Interval time range exceeds image bounds.");
                return false;
            }
        }
        if let Err(msg) = self.config.validate() {
            self.fail(&msg);
            return false;
        }
        true
    }

    /// Run the pipeline once. Returns `true` on success, in which case
    /// `result` is set; otherwise `error_message` is set.
    pub async fn process(&mut self) -> bool {
        let start = Instant::now();
        let outcome = self.run_pipeline().await;
        self.processing_time = start.elapsed();
        match outcome {
            Ok(spots) => {
                info!("Detection finished with {} spots", spots.n_spots());
                self.spots = Some(spots);
                true
            }
            Err(e) => {
                self.fail(&e.to_string());
                false
            }
        }
    }

    async fn run_pipeline(&self) -> Result<SpotCollection, DetectorError> {
        let workspace = Workspace::acquire()?;

        // Time geometry, needed to reposition spots at the end.
        let time_index = self.img.dimension_index(AxisKind::Time);
        let start_frame = match time_index {
            Some(_) => self.interval.min(self.interval.num_dimensions() - 1),
            None => 0,
        };
        let frame_interval = time_index
            .map(|d| self.img.average_scale(d))
            .unwrap_or(1.0);

        self.sink.log("Saving single time-points.");
        let count = write_frames(&self.img, &self.interval, workspace.path())?;

        let cmd = self.config.to_command_line(workspace.path());
        self.sink.set_status("Running Cellpose");
        self.sink.log("Running Cellpose with args:");
        let rendered: Vec<_> = cmd.iter().map(|arg| arg.to_string_lossy()).collect();
        self.sink.log(&rendered.join(" "));
        let run = run_engine(&cmd, &self.config.log_file, self.sink.clone()).await;
        self.sink.set_status("");
        run?;

        self.sink.log("Reading Cellpose masks.");
        let calibration = self.img.spatial_calibration();
        let stack = collect_masks(workspace.path(), count, calibration, frame_interval)?;

        self.sink.log("Converting masks to spots.");
        let mut spots = self
            .converter
            .convert(&stack, self.config.simplify_contours)
            .map_err(DetectorError::Conversion)?;

        reproject_spots(
            &mut spots,
            &self.interval,
            &calibration,
            start_frame,
            frame_interval,
        );
        Ok(SpotCollection::from_spots(spots))
    }

    pub fn result(&self) -> Option<&SpotCollection> {
        self.spots.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }

    fn fail(&mut self, message: &str) {
        self.error_message = Some(format!("{}{}", BASE_ERROR_MESSAGE, message));
    }
}

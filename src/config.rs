//! Configuration for the external Cellpose run

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Segmentation model the engine should load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PretrainedModel {
    Cyto,
    Cyto2,
    Nuclei,
    /// Path to a custom model file.
    Custom(PathBuf),
}

impl PretrainedModel {
    /// Value passed to `--pretrained_model`.
    pub fn argument(&self) -> OsString {
        match self {
            PretrainedModel::Cyto => OsString::from("cyto"),
            PretrainedModel::Cyto2 => OsString::from("cyto2"),
            PretrainedModel::Nuclei => OsString::from("nuclei"),
            PretrainedModel::Custom(path) => path.clone().into_os_string(),
        }
    }
}

/// All parameters needed to build the engine command line, plus the
/// post-processing flag for contour simplification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellposeConfig {
    /// Cellpose launcher (binary or wrapper script).
    pub executable: PathBuf,
    pub model: PretrainedModel,
    /// Channel to segment (0 = grayscale).
    pub channel: u8,
    /// Optional nuclear channel (0 = none).
    pub optional_channel: u8,
    /// Expected cell diameter in calibrated units; 0 lets the engine estimate.
    pub diameter: f64,
    pub use_gpu: bool,
    pub flow_threshold: f64,
    pub cellprob_threshold: f64,
    /// Whether extracted object contours should be simplified.
    pub simplify_contours: bool,
    /// The engine's own append-only log file, shared across runs on a host.
    pub log_file: PathBuf,
}

impl Default for CellposeConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("cellpose"),
            model: PretrainedModel::Cyto,
            channel: 0,
            optional_channel: 0,
            diameter: 30.0,
            use_gpu: false,
            flow_threshold: 0.4,
            cellprob_threshold: 0.0,
            simplify_contours: true,
            log_file: default_log_file(),
        }
    }
}

/// The conventional engine log location, `~/.cellpose/run.log`.
pub fn default_log_file() -> PathBuf {
    dirs::home_dir()
        .map(|mut p| {
            p.push(".cellpose");
            p.push("run.log");
            p
        })
        .unwrap_or_else(|| PathBuf::from("run.log"))
}

impl CellposeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.executable.as_os_str().is_empty() {
            return Err("Executable path cannot be empty".to_string());
        }
        if !(self.diameter.is_finite() && self.diameter >= 0.0) {
            return Err("Diameter must be a non-negative number".to_string());
        }
        if !self.flow_threshold.is_finite() || !self.cellprob_threshold.is_finite() {
            return Err("Thresholds must be finite".to_string());
        }
        if let PretrainedModel::Custom(path) = &self.model {
            if path.as_os_str().is_empty() {
                return Err("Custom model path cannot be empty".to_string());
            }
        }
        Ok(())
    }

    /// Build the full engine invocation, executable first, with `workspace`
    /// as the data directory. Arguments stay `OsString` so non-UTF-8 paths
    /// reach the engine unmangled. The orchestrator does not interpret
    /// these arguments.
    pub fn to_command_line(&self, workspace: &Path) -> Vec<OsString> {
        let mut cmd: Vec<OsString> = vec![self.executable.clone().into_os_string()];
        cmd.push("--verbose".into());
        if self.use_gpu {
            cmd.push("--use_gpu".into());
        }
        cmd.push("--dir".into());
        cmd.push(workspace.as_os_str().to_os_string());
        cmd.push("--pretrained_model".into());
        cmd.push(self.model.argument());
        cmd.push("--chan".into());
        cmd.push(self.channel.to_string().into());
        cmd.push("--chan2".into());
        cmd.push(self.optional_channel.to_string().into());
        cmd.push("--diameter".into());
        cmd.push(self.diameter.to_string().into());
        cmd.push("--flow_threshold".into());
        cmd.push(self.flow_threshold.to_string().into());
        cmd.push("--cellprob_threshold".into());
        cmd.push(self.cellprob_threshold.to_string().into());
        cmd.push("--save_png".into());
        cmd.push("--no_npy".into());
        cmd
    }
}

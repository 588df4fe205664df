//! External engine orchestration
//!
//! Spawns the segmentation engine as a child process and concurrently
//! tails its well-known log file, forwarding lines and parsed progress
//! percentages to the progress sink. The controlling task blocks on the
//! child; the tailer runs on a fixed poll interval and is stopped through
//! a watch channel once the child exits.

use crate::error::DetectorError;
use crate::progress::ProgressSink;
use regex::Regex;
use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// How often the engine log file is polled for appended lines.
pub const LOG_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn percentage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)%").unwrap())
}

/// Extract a progress fraction from one log line.
///
/// Matches the first number followed by `%`. A bare `0%` is not progress,
/// values above 100 are noise, and a decimal `100.x%` is excluded so a
/// sub-task logging `100.0%` does not report run completion early.
pub fn parse_percentage(line: &str) -> Option<f64> {
    let captures = percentage_pattern().captures(line)?;
    let text = captures.get(1)?.as_str();
    let value: f64 = text.parse().ok()?;
    if value == 0.0 || value > 100.0 {
        return None;
    }
    if text.contains('.') && value.trunc() == 100.0 {
        return None;
    }
    Some(value / 100.0)
}

/// Run the engine command to completion.
///
/// `cmd` is the full invocation, executable first, as produced by
/// [`crate::config::CellposeConfig::to_command_line`]. Stdout and stderr
/// are inherited; diagnostics are read from `log_file` instead. Any spawn
/// or wait error and any non-success exit status is a
/// [`DetectorError::Process`]; a failed run is never retried.
pub async fn run_engine(
    cmd: &[OsString],
    log_file: &Path,
    sink: Arc<dyn ProgressSink>,
) -> Result<(), DetectorError> {
    let (executable, args) = cmd
        .split_first()
        .ok_or_else(|| DetectorError::Process("Empty command line".to_string()))?;

    // The log is shared host-wide and append-only; only lines appended
    // after this point belong to this run.
    let start_offset = std::fs::metadata(log_file).map(|m| m.len()).unwrap_or(0);

    let mut child = Command::new(executable)
        .args(args)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| {
            DetectorError::Process(format!(
                "Could not launch {}: {}",
                executable.to_string_lossy(),
                e
            ))
        })?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let tailer = tokio::spawn(tail_log(
        log_file.to_path_buf(),
        sink,
        stop_rx,
        start_offset,
    ));

    let wait_result = child.wait().await;

    // Best-effort stop; the tailer drains complete lines once more before
    // exiting, a trailing partial line is dropped.
    let _ = stop_tx.send(true);
    let _ = tailer.await;

    let status =
        wait_result.map_err(|e| DetectorError::Process(format!("Could not wait for engine: {}", e)))?;
    if !status.success() {
        return Err(DetectorError::Process(format!(
            "Engine exited with {}",
            status
        )));
    }
    debug!("Engine run finished");
    Ok(())
}

async fn tail_log(
    path: PathBuf,
    sink: Arc<dyn ProgressSink>,
    mut stop: watch::Receiver<bool>,
    mut offset: u64,
) {
    let mut ticker = tokio::time::interval(LOG_POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut pending = String::new();
    loop {
        tokio::select! {
            _ = stop.changed() => {
                poll_once(&path, &mut offset, &mut pending, sink.as_ref());
                break;
            }
            _ = ticker.tick() => {
                poll_once(&path, &mut offset, &mut pending, sink.as_ref());
            }
        }
    }
}

/// Forward newly appended complete lines. All I/O errors are swallowed;
/// the tailer must never take the orchestrator down.
fn poll_once(path: &Path, offset: &mut u64, pending: &mut String, sink: &dyn ProgressSink) {
    let Ok(metadata) = std::fs::metadata(path) else {
        return;
    };
    let len = metadata.len();
    if len < *offset {
        // The engine truncated or replaced its log.
        *offset = 0;
        pending.clear();
    }
    if len == *offset {
        return;
    }
    let Ok(mut file) = File::open(path) else {
        return;
    };
    if file.seek(SeekFrom::Start(*offset)).is_err() {
        return;
    }
    let mut buf = Vec::new();
    if file.read_to_end(&mut buf).is_err() {
        return;
    }
    *offset += buf.len() as u64;
    pending.push_str(&String::from_utf8_lossy(&buf));
    while let Some(newline) = pending.find('\n') {
        let line = pending[..newline].trim_end_matches('\r').to_string();
        pending.drain(..=newline);
        sink.log(&line);
        if let Some(fraction) = parse_percentage(&line) {
            sink.set_progress(fraction);
        }
    }
}

//! Capability probe for the extraction backend.

use crate::exiftool::EXIFTOOL;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::instrument;

/// Keep the probe bounded; a hung binary should read as "unavailable",
/// not block the caller.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Versions older than this are known to mangle some maker-note tags.
const RECOMMENDED_VERSION: f64 = 12.15;

/// What the probe found out about the extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The binary exists somewhere in `PATH`.
    pub binary_installed: bool,
    /// The binary answered a version query within the probe timeout.
    pub binary_responds: bool,
}

impl Capabilities {
    /// `true` when a scan can be expected to work.
    pub fn available(&self) -> bool {
        self.binary_installed && self.binary_responds
    }
}

/// Check availability of the extraction backend.
///
/// Pure capability check: a missing executable, a failed launch, or a
/// probe timeout all report as `false` and are never raised as errors.
/// The caller decides whether to proceed.
#[instrument]
pub async fn check() -> Capabilities {
    let Ok(binary) = which::which(EXIFTOOL) else {
        return Capabilities { binary_installed: false, binary_responds: false };
    };
    let binary_responds = responds(&binary, PROBE_TIMEOUT).await;
    Capabilities { binary_installed: true, binary_responds }
}

async fn responds(binary: &std::path::Path, timeout: Duration) -> bool {
    let version_query = Command::new(binary)
        .arg("-ver")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        // A hung binary must not outlive the probe when the timeout
        // drops the future.
        .kill_on_drop(true)
        .output();
    match tokio::time::timeout(timeout, version_query).await {
        Ok(Ok(output)) if output.status.success() => {
            if let Ok(version) = String::from_utf8_lossy(&output.stdout).trim().parse::<f64>()
                && version < RECOMMENDED_VERSION
            {
                tracing::warn!(version, "exiftool is older than the recommended {RECOMMENDED_VERSION}");
            }
            true
        },
        Ok(_) => false,
        Err(_) => {
            tracing::warn!(binary = %binary.display(), "version probe timed out");
            false
        },
    }
}

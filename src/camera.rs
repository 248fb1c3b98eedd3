//! Still-image capture from the attached camera device.
//!
//! Capture goes through the `fswebcam` command-line tool rather than a
//! direct V4L2 binding: one subprocess per frame, PNG bytes on stdout.
//! The [`FrameSource`] trait keeps the rest of the pipeline independent
//! of the hardware so it can run against a mock in tests.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Capture tool invoked once per cycle.
const CAPTURE_TOOL: &str = "fswebcam";

/// Overlay font directive passed to the capture tool. Cosmetic only.
const OVERLAY_FONT: &str = "Arial:24";

/// Errors that can occur while grabbing a frame.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("capture failed ({status}): {stderr}")]
    CaptureFailed { status: String, stderr: String },

    #[error("capture produced no image data")]
    EmptyFrame,
}

/// A source of single still images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Capture one still image and return its encoded bytes.
    async fn grab(&self) -> Result<Bytes, CameraError>;
}

/// [`FrameSource`] backed by the `fswebcam` tool.
pub struct FswebcamSource {
    device: String,
    resolution: String,
}

impl FswebcamSource {
    pub fn new(device: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            resolution: resolution.into(),
        }
    }

    /// Argument vector for one capture invocation. `-` sends the PNG to
    /// stdout so no temp file is needed.
    fn build_args(&self) -> Vec<String> {
        vec![
            "-d".to_string(),
            self.device.clone(),
            "-r".to_string(),
            self.resolution.clone(),
            "--font".to_string(),
            OVERLAY_FONT.to_string(),
            "--title".to_string(),
            String::new(),
            "--png".to_string(),
            "9".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl FrameSource for FswebcamSource {
    async fn grab(&self) -> Result<Bytes, CameraError> {
        let output = Command::new(CAPTURE_TOOL)
            .args(self.build_args())
            .output()
            .await
            .map_err(|e| CameraError::Spawn {
                tool: CAPTURE_TOOL,
                source: e,
            })?;

        if !output.status.success() {
            return Err(CameraError::CaptureFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.is_empty() {
            return Err(CameraError::EmptyFrame);
        }

        debug!(
            device = %self.device,
            bytes = output.stdout.len(),
            "captured frame"
        );

        Ok(Bytes::from(output.stdout))
    }
}

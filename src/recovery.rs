//! Permission-recovery page: where the popup sends the user after the
//! browser refused camera access inside the popup.
//!
//! Requests the camera once from a full tab, releases it immediately, and
//! records that permission was granted.

use crate::capture::{CameraError, CaptureDevice, MediaConstraints};
use crate::host::Navigator;
use crate::storage::{keys, save_json, KeyValueStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// How long the success message stays up before the page closes itself.
pub const SUCCESS_CLOSE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStage {
    Request,
    Troubleshoot,
    Success,
}

pub struct PermissionRecovery {
    device: Arc<dyn CaptureDevice>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    constraints: MediaConstraints,
    stage: RecoveryStage,
}

impl PermissionRecovery {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        constraints: MediaConstraints,
    ) -> Self {
        Self {
            device,
            store,
            navigator,
            constraints,
            stage: RecoveryStage::Request,
        }
    }

    pub fn stage(&self) -> RecoveryStage {
        self.stage
    }

    pub async fn request_camera(&mut self) -> RecoveryStage {
        match self.device.acquire(&self.constraints).await {
            Ok(stream) => {
                for track in stream.tracks() {
                    track.stop();
                }
                if let Err(e) = save_json(self.store.as_ref(), keys::CAMERA_PERMISSION_GRANTED, &true).await {
                    log::error!("[RECOVERY] Failed to record granted permission: {}", e);
                }
                log::info!("[RECOVERY] Camera access granted");
                self.stage = RecoveryStage::Success;
            }
            Err(failure) => {
                log::error!(
                    "[RECOVERY] Camera access error: {} ({})",
                    failure,
                    CameraError::from(failure.clone())
                );
                self.stage = RecoveryStage::Troubleshoot;
            }
        }
        self.stage
    }

    pub async fn retry(&mut self) -> RecoveryStage {
        self.request_camera().await
    }

    pub fn close(&self) {
        self.navigator.close_window();
    }

    /// After a success, wait out the confirmation message then close.
    /// Does nothing in any other stage.
    pub async fn auto_close(&self) {
        if self.stage != RecoveryStage::Success {
            return;
        }
        tokio::time::sleep(SUCCESS_CLOSE_DELAY).await;
        self.close();
    }
}

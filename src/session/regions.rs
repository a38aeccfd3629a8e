//! Which UI regions are visible: a pure projection of controller state.

use super::mode::{Mode, ScanResult, View};
use super::{ui, SessionController};
use crate::theme::Theme;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// How long the copy button reads "Copied!".
pub const COPIED_FEEDBACK: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Regions {
    pub mode: Mode,
    pub theme: Theme,
    pub tabs: Vec<Tab>,
    /// Label of the access button when the prompt is shown.
    pub permission_prompt: Option<&'static str>,
    pub video: bool,
    pub error: Option<String>,
    /// Label of the start/stop button when shown.
    pub camera_toggle: Option<&'static str>,
    pub capture_button: bool,
    pub result: Option<ResultRegion>,
    pub gallery: Option<GalleryRegion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub view: View,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRegion {
    pub result: ScanResult,
    pub show_open: bool,
    pub copy_label: &'static str,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRegion {
    pub count: usize,
    pub clear_enabled: bool,
    pub html: String,
}

impl SessionController {
    pub fn regions(&self) -> Regions {
        self.regions_at(Instant::now())
    }

    pub fn regions_at(&self, now: Instant) -> Regions {
        let tabs = match self.layout.views() {
            [_] => Vec::new(),
            views => views
                .iter()
                .map(|&view| Tab {
                    view,
                    active: view == self.view,
                })
                .collect(),
        };

        let mut regions = Regions {
            mode: self.mode.clone(),
            theme: self.theme.current(),
            tabs,
            permission_prompt: None,
            video: false,
            error: None,
            camera_toggle: None,
            capture_button: false,
            result: None,
            gallery: None,
        };

        if self.view == View::Gallery {
            regions.gallery = Some(GalleryRegion {
                count: self.gallery.len(),
                clear_enabled: !self.gallery.is_empty(),
                html: ui::gallery_grid(self.gallery.newest_first()).to_html(),
            });
            return regions;
        }

        match &self.mode {
            Mode::PermissionPending => {
                regions.permission_prompt = Some(if self.permission_granted {
                    "Start Camera"
                } else {
                    "Allow Camera Access"
                });
            }
            Mode::Error(message) => {
                regions.error = Some(message.clone());
                regions.camera_toggle = Some("Start Camera");
            }
            Mode::Idle => regions.camera_toggle = Some("Start Camera"),
            Mode::PreviewActive | Mode::Scanning | Mode::ResultShown => {
                regions.video = true;
                regions.camera_toggle = Some("Stop Camera");
                regions.capture_button = self.layout.captures_in(self.view);
            }
            Mode::Gallery => {}
        }

        if self.layout.scans_in(self.view) && self.mode != Mode::PermissionPending {
            if let Some(result) = &self.last_result {
                let copy_label = match self.copied_at {
                    Some(at) if now.saturating_duration_since(at) < COPIED_FEEDBACK => "Copied!",
                    _ => "Copy",
                };
                regions.result = Some(ResultRegion {
                    result: result.clone(),
                    show_open: result.is_link(),
                    copy_label,
                    html: ui::result_panel(result, copy_label).to_html(),
                });
            }
        }

        regions
    }
}

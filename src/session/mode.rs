//! Modes, views and layouts of the popup.

use crate::scan::{classify_link, LinkKind};
use serde::Serialize;

/// The controller's current UI state. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "message", rename_all = "kebab-case")]
pub enum Mode {
    /// Nothing acquired yet; the access prompt is shown.
    PermissionPending,
    /// Permission granted earlier, camera paused.
    Idle,
    /// Camera live, no recognition loop (capture-only camera).
    PreviewActive,
    /// Camera live, recognition loop running.
    Scanning,
    /// A code was recognized; the loop keeps running.
    ResultShown,
    /// Last acquisition failed; carries the user-facing cause.
    Error(String),
    /// Browsing captures; no camera held.
    Gallery,
}

impl Mode {
    pub fn is_camera_live(&self) -> bool {
        matches!(self, Mode::PreviewActive | Mode::Scanning | Mode::ResultShown)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::PermissionPending => "permission-pending",
            Mode::Idle => "idle",
            Mode::PreviewActive => "preview-active",
            Mode::Scanning => "scanning",
            Mode::ResultShown => "result-shown",
            Mode::Error(_) => "error",
            Mode::Gallery => "gallery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Scanner,
    Camera,
    Gallery,
}

/// How the popup groups its regions. Only decides which views exist, which
/// camera each view uses, and where scanning and capture are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// One camera, scanner only.
    Single,
    /// Scanner tab and capture tab with separate cameras, plus a gallery tab.
    Tabbed,
    /// One camera drives both scanning and capture, plus a gallery tab.
    SharedCamera,
}

impl Layout {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Layout::Single),
            "tabbed" => Some(Layout::Tabbed),
            "shared" | "shared-camera" => Some(Layout::SharedCamera),
            _ => None,
        }
    }

    pub fn views(self) -> &'static [View] {
        match self {
            Layout::Single => &[View::Scanner],
            Layout::Tabbed => &[View::Scanner, View::Camera, View::Gallery],
            Layout::SharedCamera => &[View::Scanner, View::Gallery],
        }
    }

    /// Number of video sinks (and so capture sessions) the layout needs.
    pub fn camera_count(self) -> usize {
        match self {
            Layout::Tabbed => 2,
            Layout::Single | Layout::SharedCamera => 1,
        }
    }

    /// Index of the capture session `view` uses; `None` for camera-less views.
    pub fn camera_slot(self, view: View) -> Option<usize> {
        match (self, view) {
            (_, View::Scanner) => Some(0),
            (Layout::Tabbed, View::Camera) => Some(1),
            _ => None,
        }
    }

    pub fn scans_in(self, view: View) -> bool {
        view == View::Scanner
    }

    pub fn captures_in(self, view: View) -> bool {
        matches!(
            (self, view),
            (Layout::Tabbed, View::Camera) | (Layout::SharedCamera, View::Scanner)
        )
    }
}

/// A decoded payload as the popup presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub text: String,
    pub link: Option<LinkKind>,
}

impl ScanResult {
    pub fn new(text: String) -> Self {
        let link = classify_link(&text);
        Self { text, link }
    }

    /// Whether the "open" affordance applies.
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }
}

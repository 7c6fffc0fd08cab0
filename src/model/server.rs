//! Serializable snapshots of the session, as handed out to clients.

use serde::{Deserialize, Serialize};

use crate::actor::osd::OsdState;
use crate::model::view::ViewId;
use crate::model::workspace::WorkspaceId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub workspaces: Vec<WorkspaceData>,
    pub focused_window: Option<ViewId>,
    pub osd: OsdState,
}

impl SessionData {
    pub fn active_workspace(&self) -> Option<&WorkspaceData> {
        self.workspaces.iter().find(|ws| ws.is_active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceData {
    pub id: WorkspaceId,
    /// 1-based.
    pub index: usize,
    pub name: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_last_active: bool,
    pub window_count: usize,
    pub windows: Vec<WindowData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowData {
    pub id: ViewId,
    pub title: String,
    pub is_focused: bool,
    #[serde(default)]
    pub is_omnipresent: bool,
    #[serde(default)]
    pub is_always_on_top: bool,
}

//! The contract the workspace core needs from the view (window) subsystem,
//! and [`ViewStore`], an in-memory implementation of it.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tracing::{debug, trace};

use super::workspace::WorkspaceId;

new_key_type! {
    pub struct ViewId;
}

pub trait Views {
    /// Views on `ws`, bottom to top.
    fn views_on_workspace(&self, ws: WorkspaceId) -> Vec<ViewId>;

    fn workspace_of(&self, view: ViewId) -> Option<WorkspaceId>;

    fn title(&self, view: ViewId) -> Option<String>;

    /// Whether the view is shown on every workspace.
    fn is_omnipresent(&self, view: ViewId) -> bool;

    fn set_omnipresent(&mut self, view: ViewId, omnipresent: bool);

    fn is_always_on_top(&self, view: ViewId) -> bool;

    fn set_always_on_top(&mut self, view: ViewId, always_on_top: bool);

    /// Reassigns `view` to `ws`, keeping geometry and other state intact.
    fn move_to_workspace(&mut self, view: ViewId, ws: WorkspaceId);

    fn focused(&self) -> Option<ViewId>;

    /// Focuses and raises `view`.
    fn focus(&mut self, view: ViewId);

    /// Focuses the topmost focusable view of `ws`, or clears focus if there is
    /// none.
    fn focus_topmost(&mut self, ws: WorkspaceId);

    /// Re-evaluates whether a fullscreen view on `current` suppresses the
    /// top layer.
    fn update_top_layer_visibility(&mut self, current: WorkspaceId);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub title: String,
    pub workspace: WorkspaceId,
    #[serde(default)]
    pub omnipresent: bool,
    #[serde(default)]
    pub always_on_top: bool,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default = "yes")]
    pub focusable: bool,
}

fn yes() -> bool { true }

impl ViewInfo {
    pub fn new(title: impl Into<String>, workspace: WorkspaceId) -> Self {
        Self {
            title: title.into(),
            workspace,
            omnipresent: false,
            always_on_top: false,
            fullscreen: false,
            focusable: true,
        }
    }
}

#[derive(Debug, Default)]
struct Stack {
    views: SlotMap<ViewId, ViewInfo>,
    /// Bottom to top.
    order: Vec<ViewId>,
    focused: Option<ViewId>,
    top_layer_hidden: bool,
}

impl Stack {
    fn raise(&mut self, view: ViewId) {
        self.order.retain(|&v| v != view);
        self.order.push(view);
    }

    fn topmost_focusable(&self, ws: WorkspaceId) -> Option<ViewId> {
        self.order.iter().rev().copied().find(|&v| {
            let info = &self.views[v];
            info.workspace == ws && info.focusable && !info.always_on_top
        })
    }
}

/// Views kept in memory with a single global stacking order. Clones share
/// the same state.
#[derive(Debug, Clone, Default)]
pub struct ViewStore(Rc<RefCell<Stack>>);

impl ViewStore {
    pub fn new() -> Self { Self::default() }

    /// Maps a new view on top of the stack. It is not focused.
    pub fn spawn(&self, info: ViewInfo) -> ViewId {
        let mut stack = self.0.borrow_mut();
        debug!(title = %info.title, workspace = ?info.workspace, "mapping view");
        let view = stack.views.insert(info);
        stack.order.push(view);
        view
    }

    pub fn close(&self, view: ViewId) {
        let mut stack = self.0.borrow_mut();
        if stack.views.remove(view).is_some() {
            stack.order.retain(|&v| v != view);
            if stack.focused == Some(view) {
                stack.focused = None;
            }
        }
    }

    pub fn set_fullscreen(&self, view: ViewId, fullscreen: bool) {
        if let Some(info) = self.0.borrow_mut().views.get_mut(view) {
            info.fullscreen = fullscreen;
        }
    }

    /// Stacking order, bottom to top.
    pub fn stacking(&self) -> Vec<ViewId> { self.0.borrow().order.clone() }

    pub fn top_layer_hidden(&self) -> bool { self.0.borrow().top_layer_hidden }
}

impl Views for ViewStore {
    fn views_on_workspace(&self, ws: WorkspaceId) -> Vec<ViewId> {
        let stack = self.0.borrow();
        stack.order.iter().copied().filter(|&v| stack.views[v].workspace == ws).collect()
    }

    fn workspace_of(&self, view: ViewId) -> Option<WorkspaceId> {
        self.0.borrow().views.get(view).map(|info| info.workspace)
    }

    fn title(&self, view: ViewId) -> Option<String> {
        self.0.borrow().views.get(view).map(|info| info.title.clone())
    }

    fn is_omnipresent(&self, view: ViewId) -> bool {
        self.0.borrow().views.get(view).is_some_and(|info| info.omnipresent)
    }

    fn set_omnipresent(&mut self, view: ViewId, omnipresent: bool) {
        if let Some(info) = self.0.borrow_mut().views.get_mut(view) {
            info.omnipresent = omnipresent;
        }
    }

    fn is_always_on_top(&self, view: ViewId) -> bool {
        self.0.borrow().views.get(view).is_some_and(|info| info.always_on_top)
    }

    fn set_always_on_top(&mut self, view: ViewId, always_on_top: bool) {
        if let Some(info) = self.0.borrow_mut().views.get_mut(view) {
            info.always_on_top = always_on_top;
        }
    }

    fn move_to_workspace(&mut self, view: ViewId, ws: WorkspaceId) {
        if let Some(info) = self.0.borrow_mut().views.get_mut(view) {
            trace!(?view, from = ?info.workspace, to = ?ws, "moving view");
            info.workspace = ws;
        }
    }

    fn focused(&self) -> Option<ViewId> { self.0.borrow().focused }

    fn focus(&mut self, view: ViewId) {
        let mut stack = self.0.borrow_mut();
        if !stack.views.contains_key(view) {
            return;
        }
        stack.raise(view);
        stack.focused = Some(view);
    }

    fn focus_topmost(&mut self, ws: WorkspaceId) {
        let mut stack = self.0.borrow_mut();
        let top = stack.topmost_focusable(ws);
        if let Some(view) = top {
            stack.raise(view);
        }
        stack.focused = top;
    }

    fn update_top_layer_visibility(&mut self, current: WorkspaceId) {
        let mut stack = self.0.borrow_mut();
        let hidden = stack
            .views
            .values()
            .any(|info| info.fullscreen && (info.workspace == current || info.always_on_top));
        stack.top_layer_hidden = hidden;
    }
}

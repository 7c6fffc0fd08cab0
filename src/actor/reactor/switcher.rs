use tracing::{info, instrument, trace};

use super::Reactor;
use crate::model::workspace::WorkspaceId;

impl Reactor {
    /// Makes `target` the current workspace.
    ///
    /// Omnipresent views are carried over before anything touches focus, so
    /// a focused omnipresent view never loses focus in between. When
    /// `update_focus` is set the topmost view of `target` is focused unless
    /// the focused view is always on top. Pass `false` when the switch is a
    /// side effect of focusing a specific view.
    ///
    /// Panics if `target` is not in the registry.
    #[instrument(skip(self))]
    pub fn switch_to(&mut self, target: WorkspaceId, update_focus: bool) {
        assert!(
            self.workspaces.contains(target),
            "switch to {target:?} which is not part of the registry"
        );
        let from = self.workspaces.current();
        if target == from {
            trace!("already on target workspace");
            return;
        }
        let views = self.desktop.views.as_mut();
        let scene = self.desktop.scene.as_mut();

        scene.set_enabled(self.workspaces.get(from).tree(), false);

        // Always-on-top views count as part of the current workspace wherever
        // they are stored.
        let mut carried = Vec::new();
        for (ws, _) in self.workspaces.all() {
            for view in views.views_on_workspace(ws) {
                if views.is_omnipresent(view) && (ws == from || views.is_always_on_top(view)) {
                    carried.push(view);
                }
            }
        }
        for view in carried {
            views.move_to_workspace(view, target);
        }

        scene.set_enabled(self.workspaces.get(target).tree(), true);

        self.workspaces.set_current(target);

        if update_focus {
            let keep = views.focused().is_some_and(|view| views.is_always_on_top(view));
            if !keep {
                views.focus_topmost(target);
            }
        }

        self.show_osd();

        if let Some(stacking) = self.desktop.stacking.as_mut() {
            stacking.adjust();
        }
        self.desktop.cursor.update_focus();
        self.desktop.views.update_top_layer_visibility(target);

        info!(
            from = %self.workspaces.name(from),
            to = %self.workspaces.name(target),
            "switched workspace"
        );
    }
}

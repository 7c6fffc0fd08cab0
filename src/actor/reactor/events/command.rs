use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::actor::reactor::Reactor;

fn yes() -> bool { true }

/// Workspace actions as bound to keys or sent by clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceCommand {
    GoToDesktop {
        to: String,
        #[serde(default = "yes")]
        wrap: bool,
    },
    /// Moves the focused view to another workspace.
    SendToDesktop {
        to: String,
        #[serde(default = "yes")]
        follow: bool,
        #[serde(default = "yes")]
        wrap: bool,
    },
    ToggleOmnipresent,
    ToggleAlwaysOnTop,
}

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_command(reactor: &mut Reactor, cmd: WorkspaceCommand) {
        info!(?cmd);
        match cmd {
            WorkspaceCommand::GoToDesktop { to, wrap } => Self::go_to_desktop(reactor, &to, wrap),
            WorkspaceCommand::SendToDesktop { to, follow, wrap } => {
                Self::send_to_desktop(reactor, &to, follow, wrap)
            }
            WorkspaceCommand::ToggleOmnipresent => Self::toggle_omnipresent(reactor),
            WorkspaceCommand::ToggleAlwaysOnTop => Self::toggle_always_on_top(reactor),
        }
    }

    fn go_to_desktop(reactor: &mut Reactor, to: &str, wrap: bool) {
        let current = reactor.workspaces.current();
        if let Some(target) = reactor.find(current, Some(to), wrap) {
            reactor.switch_to(target, true);
        }
    }

    fn send_to_desktop(reactor: &mut Reactor, to: &str, follow: bool, wrap: bool) {
        let Some(view) = reactor.desktop.views.focused() else {
            debug!("no focused view to send");
            return;
        };
        let Some(anchor) = reactor.desktop.views.workspace_of(view) else { return };
        let Some(target) = reactor.find(anchor, Some(to), wrap) else { return };
        reactor.desktop.views.move_to_workspace(view, target);
        if follow {
            reactor.switch_to(target, false);
        } else if target != reactor.workspaces.current() {
            let current = reactor.workspaces.current();
            reactor.desktop.views.focus_topmost(current);
        }
    }

    fn toggle_omnipresent(reactor: &mut Reactor) {
        let views = reactor.desktop.views.as_mut();
        let Some(view) = views.focused() else { return };
        let omnipresent = !views.is_omnipresent(view);
        debug!(?view, omnipresent);
        views.set_omnipresent(view, omnipresent);
    }

    fn toggle_always_on_top(reactor: &mut Reactor) {
        let current = reactor.workspaces.current();
        let views = reactor.desktop.views.as_mut();
        let Some(view) = views.focused() else { return };
        let always_on_top = !views.is_always_on_top(view);
        debug!(?view, always_on_top);
        views.set_always_on_top(view, always_on_top);
        if !always_on_top {
            views.move_to_workspace(view, current);
        }
        views.update_top_layer_visibility(current);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor::reactor::Event;
    use crate::actor::reactor::testing::Harness;
    use crate::model::view::{ViewInfo, Views};

    fn go(to: &str) -> Event {
        Event::Command(WorkspaceCommand::GoToDesktop { to: to.into(), wrap: true })
    }

    fn send(to: &str, follow: bool) -> Event {
        Event::Command(WorkspaceCommand::SendToDesktop { to: to.into(), follow, wrap: true })
    }

    #[test]
    fn commands_deserialize_with_defaults() {
        let cmd: WorkspaceCommand = serde_json::from_str(r#"{"go_to_desktop": {"to": "left"}}"#).unwrap();
        assert_eq!(cmd, WorkspaceCommand::GoToDesktop { to: "left".into(), wrap: true });
        let cmd: WorkspaceCommand =
            serde_json::from_str(r#"{"send_to_desktop": {"to": "2", "follow": false}}"#).unwrap();
        assert_eq!(cmd, WorkspaceCommand::SendToDesktop { to: "2".into(), follow: false, wrap: true });
        let cmd: WorkspaceCommand = serde_json::from_str(r#""toggle_always_on_top""#).unwrap();
        assert_eq!(cmd, WorkspaceCommand::ToggleAlwaysOnTop);
    }

    #[test]
    fn go_to_desktop_resolves_against_current() {
        let mut h = Harness::new(&["1", "2", "3"]);
        h.reactor.handle_event(go("right"));
        h.reactor.handle_event(go("right"));
        assert_eq!(h.reactor.workspaces().current(), h.ws(3));
        h.reactor.handle_event(go("right"));
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
        h.reactor.handle_event(go("last"));
        assert_eq!(h.reactor.workspaces().current(), h.ws(3));
    }

    #[test]
    fn go_to_unknown_desktop_does_nothing() {
        let mut h = Harness::new(&["1", "2"]);
        h.reactor.handle_event(go("mail"));
        h.reactor.handle_event(go("0"));
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
        assert_eq!(h.reactor.workspaces().last(), None);
        assert_eq!(h.timers.arm_count(), 0);
    }

    #[test]
    fn go_to_without_wrap_stops_at_the_end() {
        let mut h = Harness::new(&["1", "2"]);
        let cmd = WorkspaceCommand::GoToDesktop { to: "left".into(), wrap: false };
        h.reactor.handle_event(Event::Command(cmd));
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
    }

    #[test]
    fn send_and_follow() {
        let mut h = Harness::new(&["1", "2", "3"]);
        let view = h.views.spawn(ViewInfo::new("term", h.ws(1)));
        h.views.focus(view);

        h.reactor.handle_event(send("3", true));
        assert_eq!(h.views.workspace_of(view), Some(h.ws(3)));
        assert_eq!(h.reactor.workspaces().current(), h.ws(3));
        assert_eq!(h.views.focused(), Some(view));
    }

    #[test]
    fn send_without_follow_refocuses_current() {
        let mut h = Harness::new(&["1", "2"]);
        let stays = h.views.spawn(ViewInfo::new("stays", h.ws(1)));
        let leaves = h.views.spawn(ViewInfo::new("leaves", h.ws(1)));
        h.views.focus(leaves);

        h.reactor.handle_event(send("right", false));
        assert_eq!(h.views.workspace_of(leaves), Some(h.ws(2)));
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
        assert_eq!(h.views.focused(), Some(stays));
    }

    #[test]
    fn send_resolves_relative_to_the_view() {
        let mut h = Harness::new(&["1", "2", "3"]);
        let pinned_above =
            h.views.spawn(ViewInfo { always_on_top: true, ..ViewInfo::new("above", h.ws(2)) });
        h.views.focus(pinned_above);

        h.reactor.handle_event(send("right", false));
        assert_eq!(h.views.workspace_of(pinned_above), Some(h.ws(3)));
    }

    #[test]
    fn send_without_focus_is_ignored() {
        let mut h = Harness::new(&["1", "2"]);
        h.reactor.handle_event(send("2", true));
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
    }

    #[test]
    fn toggles_flip_flags_of_focused_view() {
        let mut h = Harness::new(&["1", "2"]);
        let view = h.views.spawn(ViewInfo::new("term", h.ws(1)));
        h.views.focus(view);

        h.reactor.handle_event(Event::Command(WorkspaceCommand::ToggleOmnipresent));
        assert!(h.views.is_omnipresent(view));
        h.reactor.handle_event(go("2"));
        assert_eq!(h.views.workspace_of(view), Some(h.ws(2)));

        h.reactor.handle_event(Event::Command(WorkspaceCommand::ToggleOmnipresent));
        assert!(!h.views.is_omnipresent(view));
    }

    #[test]
    fn leaving_always_on_top_lands_on_current() {
        let mut h = Harness::new(&["1", "2"]);
        let view = h.views.spawn(ViewInfo::new("term", h.ws(1)));
        h.views.focus(view);
        h.reactor.handle_event(Event::Command(WorkspaceCommand::ToggleAlwaysOnTop));
        assert!(h.views.is_always_on_top(view));

        h.reactor.handle_event(go("2"));
        assert_eq!(h.views.focused(), Some(view));
        h.reactor.handle_event(Event::Command(WorkspaceCommand::ToggleAlwaysOnTop));
        assert!(!h.views.is_always_on_top(view));
        assert_eq!(h.views.workspace_of(view), Some(h.ws(2)));
    }
}

//! The reactor owns the workspace session: the registry, the seat and the
//! collaborators it drives. Every workspace mutation happens here, one event
//! at a time.

pub mod events;
pub mod managers;
mod switcher;

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, trace};

pub use self::events::command::WorkspaceCommand;
use self::events::command::CommandEventHandler;
use self::managers::seat::Seat;
use crate::actor::{self, osd};
use crate::common::config::Config;
use crate::model::server::{SessionData, WindowData, WorkspaceData};
use crate::model::target;
use crate::model::view::{ViewId, Views};
use crate::model::workspace::{WorkspaceId, WorkspaceRegistry};
use crate::sys::cursor::{Cursor, StackingOrder};
use crate::sys::event::{Keyboard, Modifiers};
use crate::sys::scene::Scene;
use crate::sys::screen::Outputs;
use crate::sys::timer::{TimerQueue, TimerTicket};
use crate::ui::workspace_osd::WorkspaceOsd;

#[derive(Debug)]
pub enum Event {
    Command(WorkspaceCommand),
    /// A view asked for (or was given) focus, e.g. by a click or activation
    /// request.
    FocusView(ViewId),
    ModifiersChanged(Modifiers),
    TimerExpired(TimerTicket),
    QuerySession(oneshot::Sender<SessionData>),
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// The subsystems the workspace core drives but does not own the logic of.
pub struct Desktop {
    pub scene: Box<dyn Scene>,
    pub outputs: Box<dyn Outputs>,
    pub views: Box<dyn Views>,
    pub cursor: Box<dyn Cursor>,
    /// Only present when a compatibility protocol needs restacking hints.
    pub stacking: Option<Box<dyn StackingOrder>>,
}

pub struct Reactor {
    desktop: Desktop,
    workspaces: WorkspaceRegistry,
    seat: Seat,
    osd: WorkspaceOsd,
}

impl Reactor {
    pub fn new(
        config: &Config,
        mut desktop: Desktop,
        keyboard: Box<dyn Keyboard>,
        timers: Box<dyn TimerQueue>,
    ) -> Self {
        let root = desktop.scene.root();
        let workspaces =
            WorkspaceRegistry::new(config.workspaces.resolved_names(), desktop.scene.as_mut(), root);
        Reactor {
            desktop,
            workspaces,
            seat: Seat::new(keyboard, timers, config.workspaces.popup_duration()),
            osd: WorkspaceOsd::new(config.theme.osd.clone()),
        }
    }

    pub fn workspaces(&self) -> &WorkspaceRegistry { &self.workspaces }

    pub fn osd_state(&self) -> osd::OsdState { self.seat.osd_state() }

    pub async fn run(mut self, mut rx: Receiver) {
        while let Some((span, event)) = rx.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
        debug!("reactor channel closed");
        self.teardown();
    }

    #[instrument(name = "reactor::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Command(cmd) => CommandEventHandler::handle_command(self, cmd),
            Event::FocusView(view) => self.focus_view(view),
            Event::ModifiersChanged(mods) => {
                if !mods.any_held() {
                    self.drive_osd(osd::OsdEvent::ModifierReleased);
                }
            }
            Event::TimerExpired(ticket) => {
                if self.seat.take_osd_expiry(ticket) {
                    self.drive_osd(osd::OsdEvent::TimerFired);
                } else {
                    trace!(?ticket, "ignoring stale timer expiry");
                }
            }
            Event::QuerySession(reply) => {
                _ = reply.send(self.snapshot());
            }
        }
    }

    /// Resolves a target specifier relative to `anchor`.
    pub fn find(&self, anchor: WorkspaceId, spec: Option<&str>, wrap: bool) -> Option<WorkspaceId> {
        target::find(&self.workspaces, anchor, spec, wrap)
    }

    /// Focuses `view`, first switching to its workspace if needed. The switch
    /// leaves focus alone since the view is about to take it.
    pub fn focus_view(&mut self, view: ViewId) {
        let Some(ws) = self.desktop.views.workspace_of(view) else {
            debug!(?view, "focus requested for unknown view");
            return;
        };
        if !self.desktop.views.is_always_on_top(view) {
            self.switch_to(ws, false);
        }
        self.desktop.views.focus(view);
    }

    pub fn show_osd(&mut self) {
        let modifiers_held = self.seat.modifiers().any_held();
        self.drive_osd(osd::OsdEvent::Show { modifiers_held });
    }

    pub fn hide_osd(&mut self) { self.drive_osd(osd::OsdEvent::Hide); }

    fn drive_osd(&mut self, event: osd::OsdEvent) {
        for action in self.seat.handle_osd(event) {
            match action {
                osd::OsdAction::Render => {
                    self.osd.show(
                        &self.workspaces,
                        self.desktop.scene.as_mut(),
                        self.desktop.outputs.as_ref(),
                    );
                }
                osd::OsdAction::ArmTimer(after) => self.seat.arm_osd_timer(after),
                osd::OsdAction::CancelTimer => self.seat.cancel_osd_timer(),
                osd::OsdAction::Conceal => {
                    self.osd.hide(self.desktop.scene.as_mut());
                    self.desktop.cursor.update_focus();
                }
            }
        }
    }

    pub fn snapshot(&self) -> SessionData {
        let views = self.desktop.views.as_ref();
        let focused = views.focused();
        let workspaces = self
            .workspaces
            .all()
            .map(|(id, ws)| {
                let windows: Vec<WindowData> = views
                    .views_on_workspace(id)
                    .into_iter()
                    .map(|view| WindowData {
                        id: view,
                        title: views.title(view).unwrap_or_default(),
                        is_focused: focused == Some(view),
                        is_omnipresent: views.is_omnipresent(view),
                        is_always_on_top: views.is_always_on_top(view),
                    })
                    .collect();
                WorkspaceData {
                    id,
                    index: id.ordinal(),
                    name: ws.name().to_string(),
                    is_active: self.workspaces.is_active(id),
                    is_last_active: self.workspaces.last() == Some(id),
                    window_count: windows.len(),
                    windows,
                }
            })
            .collect();
        SessionData {
            workspaces,
            focused_window: focused,
            osd: self.seat.osd_state(),
        }
    }

    /// Releases every scene resource the session created.
    pub fn teardown(mut self) {
        self.seat.cancel_osd_timer();
        self.osd.teardown(self.desktop.scene.as_mut());
        self.workspaces.teardown(self.desktop.scene.as_mut());
        info!("workspace session torn down");
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::testing::Harness;
    use super::*;
    use crate::model::view::ViewInfo;
    use crate::sys::event::Modifiers;

    #[test]
    fn starts_on_first_workspace_without_osd() {
        let h = Harness::new(&["1", "2", "3"]);
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
        assert_eq!(h.enabled_trees(), vec![h.ws(1)]);
        assert_eq!(h.reactor.osd_state(), osd::OsdState::Hidden);
    }

    #[test]
    fn focus_view_switches_without_refocusing_others() {
        let mut h = Harness::new(&["1", "2"]);
        let here = h.views.spawn(ViewInfo::new("here", h.ws(1)));
        let there_low = h.views.spawn(ViewInfo::new("low", h.ws(2)));
        let there_high = h.views.spawn(ViewInfo::new("high", h.ws(2)));
        h.views.focus(here);

        h.reactor.handle_event(Event::FocusView(there_low));
        assert_eq!(h.reactor.workspaces().current(), h.ws(2));
        assert_eq!(h.views.focused(), Some(there_low));
        assert_eq!(h.views.stacking().last(), Some(&there_low));
        assert_ne!(h.views.focused(), Some(there_high));
    }

    #[test]
    fn focus_always_on_top_view_stays_put() {
        let mut h = Harness::new(&["1", "2"]);
        let above = h.views.spawn(ViewInfo { always_on_top: true, ..ViewInfo::new("above", h.ws(2)) });
        h.reactor.focus_view(above);
        assert_eq!(h.reactor.workspaces().current(), h.ws(1));
        assert_eq!(h.views.focused(), Some(above));
    }

    #[test]
    fn timer_expiry_hides_osd() {
        let mut h = Harness::new(&["1", "2"]);
        h.reactor.switch_to(h.ws(2), true);
        assert_eq!(h.reactor.osd_state(), osd::OsdState::ShownByTimer);
        assert!(h.osd_node_visible());

        let ticket = h.timers.fire(h.osd_timer()).unwrap();
        h.reactor.handle_event(Event::TimerExpired(ticket));
        assert_eq!(h.reactor.osd_state(), osd::OsdState::Hidden);
        assert!(!h.osd_node_visible());
        assert_eq!(h.scene.buffer_count(), 0);
    }

    #[test]
    fn stale_expiry_after_rearm_is_ignored() {
        let mut h = Harness::new(&["1", "2", "3"]);
        h.reactor.switch_to(h.ws(2), true);
        let stale = h.timers.fire(h.osd_timer()).unwrap();
        h.reactor.switch_to(h.ws(3), true);

        h.reactor.handle_event(Event::TimerExpired(stale));
        assert_eq!(h.reactor.osd_state(), osd::OsdState::ShownByTimer);
        assert_eq!(h.timers.arm_count(), 2);
    }

    #[test]
    fn modifier_release_hides_osd() {
        let mut h = Harness::new(&["1", "2"]);
        h.keyboard.set_modifiers(Modifiers::LOGO);
        h.reactor.switch_to(h.ws(2), true);
        assert_eq!(h.reactor.osd_state(), osd::OsdState::ShownByModifier);
        assert_eq!(h.timers.armed(h.osd_timer()), None);

        h.keyboard.set_modifiers(Modifiers::LOGO | Modifiers::SHIFT);
        h.reactor.handle_event(Event::ModifiersChanged(Modifiers::LOGO | Modifiers::SHIFT));
        assert_eq!(h.reactor.osd_state(), osd::OsdState::ShownByModifier);

        let cursor_before = h.cursor.count();
        h.keyboard.set_modifiers(Modifiers::empty());
        h.reactor.handle_event(Event::ModifiersChanged(Modifiers::empty()));
        assert_eq!(h.reactor.osd_state(), osd::OsdState::Hidden);
        assert!(!h.osd_node_visible());
        assert_eq!(h.cursor.count(), cursor_before + 1);
    }

    #[test]
    fn hide_cancels_pending_timer() {
        let mut h = Harness::new(&["1", "2"]);
        h.reactor.switch_to(h.ws(2), true);
        h.reactor.hide_osd();
        assert_eq!(h.timers.armed(h.osd_timer()), None);
        assert_eq!(h.reactor.osd_state(), osd::OsdState::Hidden);
    }

    #[test]
    fn snapshot_reports_workspaces_and_windows() {
        let mut h = Harness::new(&["mail", "code"]);
        let editor = h.views.spawn(ViewInfo::new("editor", h.ws(2)));
        h.reactor.focus_view(editor);

        let snapshot = h.reactor.snapshot();
        assert_eq!(snapshot.focused_window, Some(editor));
        assert_eq!(snapshot.osd, osd::OsdState::Hidden);
        let summary: Vec<(usize, &str, bool, bool, usize)> = snapshot
            .workspaces
            .iter()
            .map(|w| (w.index, w.name.as_str(), w.is_active, w.is_last_active, w.window_count))
            .collect();
        assert_eq!(summary, vec![(1, "mail", false, true, 0), (2, "code", true, false, 1)]);
        assert!(snapshot.workspaces[1].windows[0].is_focused);
    }

    #[test]
    fn query_session_replies() {
        let mut h = Harness::new(&["1"]);
        let (tx, mut rx) = oneshot::channel();
        h.reactor.handle_event(Event::QuerySession(tx));
        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.workspaces.len(), 1);
    }

    #[test]
    fn teardown_releases_scene() {
        let mut h = Harness::new(&["1", "2"]);
        h.reactor.switch_to(h.ws(2), true);
        let timer = h.osd_timer();
        h.reactor.teardown();
        assert_eq!(h.scene.node_count(), 1);
        assert_eq!(h.scene.buffer_count(), 0);
        assert_eq!(h.timers.armed(timer), None);
    }

    #[tokio::test]
    async fn run_handles_events_until_channel_closes() {
        let h = Harness::new(&["1", "2"]);
        let scene = h.scene.clone();
        let (tx, rx) = actor::channel();
        tx.send(Event::Command(WorkspaceCommand::GoToDesktop { to: "2".into(), wrap: true }));
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(Event::QuerySession(reply_tx));
        drop(tx);

        h.reactor.run(rx).await;
        let snapshot = reply_rx.await.unwrap();
        assert!(snapshot.workspaces[1].is_active);
        assert_eq!(scene.node_count(), 1);
    }
}

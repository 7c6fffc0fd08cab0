//! Visibility state machine for the workspace OSD.
//!
//! The OSD is shown on every switch. It goes away either when the popup
//! timer expires or, if the switch was made with modifiers held (as with a
//! keybinding), when the modifiers are released. This module only decides
//! *what* should happen; the reactor carries out the returned actions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsdState {
    #[default]
    Hidden,
    ShownByTimer,
    ShownByModifier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsdEvent {
    Show { modifiers_held: bool },
    TimerFired,
    ModifierReleased,
    Hide,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsdAction {
    /// Regenerate the OSD content and enable it on every usable output.
    Render,
    ArmTimer(Duration),
    CancelTimer,
    /// Disable the OSD everywhere and refresh cursor focus.
    Conceal,
}

#[derive(Debug)]
pub struct OsdController {
    state: OsdState,
    popup_time: Duration,
}

impl OsdController {
    /// A zero `popup_time` disables the OSD entirely.
    pub fn new(popup_time: Duration) -> Self {
        Self { state: OsdState::Hidden, popup_time }
    }

    pub fn state(&self) -> OsdState { self.state }

    pub fn is_enabled(&self) -> bool { !self.popup_time.is_zero() }

    pub fn handle(&mut self, event: OsdEvent) -> Vec<OsdAction> {
        let (next, actions) = self.transition(event);
        if next != self.state {
            trace!(from = ?self.state, to = ?next, ?event, "osd transition");
        }
        self.state = next;
        actions
    }

    fn transition(&self, event: OsdEvent) -> (OsdState, Vec<OsdAction>) {
        use OsdAction::*;
        use OsdState::*;
        match (self.state, event) {
            (state, OsdEvent::Show { .. }) if !self.is_enabled() => (state, vec![]),
            (ShownByTimer, OsdEvent::Show { modifiers_held: true }) => {
                (ShownByModifier, vec![Render, CancelTimer])
            }
            (_, OsdEvent::Show { modifiers_held: true }) => (ShownByModifier, vec![Render]),
            (_, OsdEvent::Show { modifiers_held: false }) => {
                (ShownByTimer, vec![Render, ArmTimer(self.popup_time)])
            }
            (ShownByTimer, OsdEvent::TimerFired) => (Hidden, vec![Conceal]),
            (ShownByModifier, OsdEvent::ModifierReleased) => (Hidden, vec![Conceal]),
            (ShownByTimer, OsdEvent::Hide) => (Hidden, vec![CancelTimer, Conceal]),
            (_, OsdEvent::Hide) => (Hidden, vec![Conceal]),
            (state, OsdEvent::TimerFired | OsdEvent::ModifierReleased) => (state, vec![]),
        }
    }
}

use std::time::Duration;

use crate::actor::osd::{OsdAction, OsdController, OsdEvent, OsdState};
use crate::sys::event::{Keyboard, Modifiers};
use crate::sys::timer::{TimerId, TimerQueue, TimerTicket};

pub const OSD_TIMER: TimerId = TimerId::new(0);

/// Per-seat input state: the keyboard, the seat's timers and the OSD
/// visibility that depends on both.
pub struct Seat {
    keyboard: Box<dyn Keyboard>,
    timers: Box<dyn TimerQueue>,
    osd: OsdController,
}

impl Seat {
    pub fn new(keyboard: Box<dyn Keyboard>, timers: Box<dyn TimerQueue>, popup_time: Duration) -> Self {
        Seat {
            keyboard,
            timers,
            osd: OsdController::new(popup_time),
        }
    }

    pub fn modifiers(&self) -> Modifiers { self.keyboard.modifiers() }

    pub fn osd_state(&self) -> OsdState { self.osd.state() }

    pub fn osd_timer(&self) -> TimerId { OSD_TIMER }

    pub fn handle_osd(&mut self, event: OsdEvent) -> Vec<OsdAction> { self.osd.handle(event) }

    pub fn arm_osd_timer(&mut self, after: Duration) { self.timers.arm(OSD_TIMER, after); }

    pub fn cancel_osd_timer(&mut self) { self.timers.cancel(OSD_TIMER); }

    /// Whether `ticket` is the live expiry of the OSD timer.
    pub fn take_osd_expiry(&mut self, ticket: TimerTicket) -> bool {
        ticket.id == OSD_TIMER && self.timers.take_expired(ticket)
    }
}

use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CAPS = 1 << 1;
        const CTRL = 1 << 2;
        const ALT = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const LOGO = 1 << 6;
        const MOD5 = 1 << 7;
    }
}

impl Modifiers {
    /// Lock-style modifiers don't count as "held" for the OSD.
    pub fn any_held(self) -> bool { !(self - Modifiers::CAPS - Modifiers::MOD2).is_empty() }
}

/// The seat keyboard, as far as the workspace core needs it.
pub trait Keyboard {
    fn modifiers(&self) -> Modifiers;
}

/// Keyboard state fed by whoever owns the input devices.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState(Rc<Cell<Modifiers>>);

impl KeyboardState {
    pub fn new() -> Self { Self::default() }

    pub fn set_modifiers(&self, modifiers: Modifiers) { self.0.set(modifiers); }
}

impl Keyboard for KeyboardState {
    fn modifiers(&self) -> Modifiers { self.0.get() }
}

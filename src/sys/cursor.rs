use std::cell::Cell;
use std::rc::Rc;

/// Re-resolves which surface is under the pointer.
pub trait Cursor {
    fn update_focus(&mut self);
}

/// Keeps a compatibility protocol's idea of window stacking (X11 restack
/// lists) in line with what is visible.
pub trait StackingOrder {
    fn adjust(&mut self);
}

/// Counts notifications instead of acting on them; used where no real
/// cursor or stacking backend exists.
#[derive(Debug, Clone, Default)]
pub struct NotifyCounter(Rc<Cell<usize>>);

impl NotifyCounter {
    pub fn new() -> Self { Self::default() }

    pub fn count(&self) -> usize { self.0.get() }

    fn bump(&self) { self.0.set(self.0.get() + 1); }
}

impl Cursor for NotifyCounter {
    fn update_focus(&mut self) { self.bump(); }
}

impl StackingOrder for NotifyCounter {
    fn adjust(&mut self) { self.bump(); }
}

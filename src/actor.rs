//! Actor plumbing. Every message carries the span it was sent from so the
//! receiver handles it inside the same trace.

use tokio::sync::mpsc;
use tracing::Span;

pub mod osd;
pub mod reactor;

#[derive(Debug)]
pub struct Sender<Event>(mpsc::UnboundedSender<(Span, Event)>);

pub type Receiver<Event> = mpsc::UnboundedReceiver<(Span, Event)>;

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    /// Sends `event`, dropping it if the receiver is gone.
    pub fn send(&self, event: Event) { _ = self.try_send(event); }

    pub fn try_send(&self, event: Event) -> Result<(), mpsc::error::SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }

    /// A handle that does not keep the receiver's loop alive.
    pub fn downgrade(&self) -> WeakSender<Event> { WeakSender(self.0.downgrade()) }
}

#[derive(Debug)]
pub struct WeakSender<Event>(mpsc::WeakUnboundedSender<(Span, Event)>);

impl<Event> Clone for WeakSender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> WeakSender<Event> {
    pub fn upgrade(&self) -> Option<Sender<Event>> { self.0.upgrade().map(Sender) }
}

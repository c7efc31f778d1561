//! Signals emitted by the slideshow and commands it accepts.
//!
//! Listeners are plain callbacks kept in a [`Signals`] table, connected per
//! signal kind or to every signal. Commands can be dispatched directly on the
//! controller or queued through a [`CommandSender`], which is what a listener
//! uses to react to a signal with a command of its own.

use crossbeam_channel::{Receiver, Sender};
use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use crate::catalog::{SlideId, SlideRef};
use crate::config::OptionsPatch;

new_key_type! {
    /// Handle returned by [`Signals::connect`], used to disconnect.
    pub struct ConnectionId;
}

/// Notifications emitted on the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideEvent {
    /// First session opened; fired once per controller.
    Init,
    StartLoading,
    StopLoading,
    /// A slide finished fading in.
    StartOfSlide(SlideRef),
    /// A slide is about to be replaced or the session is closing.
    EndOfSlide(SlideRef),
    /// A slide's image failed to load.
    Error(SlideRef),
    /// The overlay was resized to the viewport.
    UpdateSize,
}

impl SlideEvent {
    pub fn kind(&self) -> SignalKind {
        match self {
            SlideEvent::Init => SignalKind::Init,
            SlideEvent::StartLoading => SignalKind::StartLoading,
            SlideEvent::StopLoading => SignalKind::StopLoading,
            SlideEvent::StartOfSlide(_) => SignalKind::StartOfSlide,
            SlideEvent::EndOfSlide(_) => SignalKind::EndOfSlide,
            SlideEvent::Error(_) => SignalKind::Error,
            SlideEvent::UpdateSize => SignalKind::UpdateSize,
        }
    }

    /// The slide carried by the signal, if any.
    pub fn slide(&self) -> Option<&SlideRef> {
        match self {
            SlideEvent::StartOfSlide(s) | SlideEvent::EndOfSlide(s) | SlideEvent::Error(s) => Some(s),
            _ => None,
        }
    }
}

/// Signal discriminant used for per-kind subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Init,
    StartLoading,
    StopLoading,
    StartOfSlide,
    EndOfSlide,
    Error,
    UpdateSize,
}

type Listener = Box<dyn FnMut(&SlideEvent)>;

struct Connection {
    filter: Option<SignalKind>,
    listener: Listener,
}

/// Callback table for slideshow signals.
#[derive(Default)]
pub struct Signals {
    connections: SlotMap<ConnectionId, Connection>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` for every signal of `kind`.
    pub fn connect<F>(&mut self, kind: SignalKind, listener: F) -> ConnectionId
    where
        F: FnMut(&SlideEvent) + 'static,
    {
        self.connections.insert(Connection {
            filter: Some(kind),
            listener: Box::new(listener),
        })
    }

    /// Call `listener` for every signal.
    pub fn connect_all<F>(&mut self, listener: F) -> ConnectionId
    where
        F: FnMut(&SlideEvent) + 'static,
    {
        self.connections.insert(Connection {
            filter: None,
            listener: Box::new(listener),
        })
    }

    /// Returns `true` if the connection existed.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn emit(&mut self, event: &SlideEvent) {
        let kind = event.kind();
        trace!(?kind, "emitting slideshow signal");
        for (_, conn) in self.connections.iter_mut() {
            if conn.filter.map_or(true, |f| f == kind) {
                (conn.listener)(event);
            }
        }
    }
}

/// Which slide a `show` command targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideTarget {
    Slide(SlideId),
    Position { gallery: String, index: usize },
}

/// Requests accepted by the slideshow.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open (or switch) the session on a slide.
    Show(SlideTarget),
    /// Open a gallery at `index`, or at the configured start slide.
    Start { gallery: String, index: Option<usize> },
    /// Display a slide of the open session, loading it first if needed.
    ShowSlide(SlideId),
    /// Load a slide without displaying it.
    LoadSlide(SlideId),
    PrevSlide { preload_only: bool },
    NextSlide { preload_only: bool },
    Close,
    SetOptions(OptionsPatch),
    UpdateSize,
    OrientationChange,
}

/// Cloneable handle for queueing commands from listeners or other code.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Queue a command; it runs on the controller's next `pump`.
    pub fn send(&self, command: Command) {
        // The receiver lives as long as the controller; a send after it is
        // dropped has nobody left to act on it.
        let _ = self.tx.send(command);
    }
}

pub(crate) fn command_queue() -> (CommandSender, Receiver<Command>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (CommandSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_filter_by_kind() {
        let mut signals = Signals::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let all = Rc::new(RefCell::new(0));

        let sink = Rc::clone(&seen);
        signals.connect(SignalKind::StartLoading, move |e| sink.borrow_mut().push(e.kind()));
        let counter = Rc::clone(&all);
        signals.connect_all(move |_| *counter.borrow_mut() += 1);

        signals.emit(&SlideEvent::Init);
        signals.emit(&SlideEvent::StartLoading);

        assert_eq!(*seen.borrow(), vec![SignalKind::StartLoading]);
        assert_eq!(*all.borrow(), 2);
    }

    #[test]
    fn disconnected_listener_stops_receiving() {
        let mut signals = Signals::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let id = signals.connect_all(move |_| *counter.borrow_mut() += 1);

        signals.emit(&SlideEvent::UpdateSize);
        assert!(signals.disconnect(id));
        assert!(!signals.disconnect(id));
        signals.emit(&SlideEvent::UpdateSize);

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(signals.connection_count(), 0);
    }

    #[test]
    fn slide_signals_carry_their_slide() {
        let slide = SlideRef {
            id: SlideId { gallery: 0, index: 2 },
            image: "2.jpg".into(),
            title: String::new(),
            gallery: "g".into(),
            index: 2,
            data: Default::default(),
            failed: true,
        };
        let error = SlideEvent::Error(slide.clone());
        assert_eq!(error.slide(), Some(&slide));
        assert_eq!(error.kind(), SignalKind::Error);
        assert_eq!(SlideEvent::UpdateSize.slide(), None);
    }

    #[test]
    fn queued_commands_arrive_in_order() {
        let (sender, rx) = command_queue();
        sender.send(Command::NextSlide { preload_only: false });
        sender.clone().send(Command::Close);

        let got: Vec<Command> = rx.try_iter().collect();
        assert_eq!(got, vec![Command::NextSlide { preload_only: false }, Command::Close]);
    }
}

use std::fmt;
use futures::channel::mpsc::UnboundedSender;
use log::debug;

use crate::device::link::LinkHandle;
use crate::error::LinkError;

/// Identifies one linking attempt. Events of older attempts are stale.
pub type AttemptId = u64;

pub enum LinkEvent {
    Established { attempt: AttemptId, link: Box<dyn LinkHandle> },
    Failed { attempt: AttemptId, error: LinkError },
    Frame { attempt: AttemptId, data: Vec<u8> },
    Disconnected { attempt: AttemptId },
}

impl LinkEvent {
    pub fn attempt(&self) -> AttemptId {
        match self {
            LinkEvent::Established { attempt, .. } => *attempt,
            LinkEvent::Failed { attempt, .. } => *attempt,
            LinkEvent::Frame { attempt, .. } => *attempt,
            LinkEvent::Disconnected { attempt } => *attempt,
        }
    }
}

impl fmt::Debug for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEvent::Established { attempt, .. } => write!(f, "Established({})", attempt),
            LinkEvent::Failed { attempt, error } => write!(f, "Failed({}, {})", attempt, error),
            LinkEvent::Frame { attempt, data } => write!(f, "Frame({}, {} bytes)", attempt, data.len()),
            LinkEvent::Disconnected { attempt } => write!(f, "Disconnected({})", attempt),
        }
    }
}

/// Sink for everything a link reports asynchronously: inbound frames and the loss of the link.
/// Cheap to clone; every clone reports for the same attempt.
#[derive(Clone)]
pub struct LinkObserver {
    attempt: AttemptId,
    sender: UnboundedSender<LinkEvent>,
}

impl LinkObserver {
    pub fn new(attempt: AttemptId, sender: UnboundedSender<LinkEvent>) -> Self {
        LinkObserver { attempt, sender }
    }

    pub fn frame(&self, data: Vec<u8>) {
        self.emit(LinkEvent::Frame { attempt: self.attempt, data });
    }

    pub fn disconnected(&self) {
        self.emit(LinkEvent::Disconnected { attempt: self.attempt });
    }

    pub fn established(&self, link: Box<dyn LinkHandle>) {
        self.emit(LinkEvent::Established { attempt: self.attempt, link });
    }

    pub fn failed(&self, error: LinkError) {
        self.emit(LinkEvent::Failed { attempt: self.attempt, error });
    }

    fn emit(&self, event: LinkEvent) {
        // the session is gone when the receiver is dropped, nobody is left to tell
        if let Err(err) = self.sender.unbounded_send(event) {
            debug!("Dropping link event, session stopped: {:?}", err.into_inner());
        }
    }
}

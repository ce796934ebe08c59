use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::kernel::index::IndexEvent;

#[derive(Clone)]
pub struct IndexBusSender {
    tx: Sender<IndexEvent>,
}

pub struct IndexBusReceiver {
    rx: Receiver<IndexEvent>,
}

pub fn index_bus() -> (IndexBusSender, IndexBusReceiver) {
    let (tx, rx) = mpsc::channel();
    (IndexBusSender { tx }, IndexBusReceiver { rx })
}

impl IndexBusSender {
    pub fn send(&self, event: IndexEvent) -> Result<(), mpsc::SendError<IndexEvent>> {
        self.tx.send(event)
    }
}

impl IndexBusReceiver {
    pub fn try_recv(&mut self) -> Result<IndexEvent, TryRecvError> {
        self.rx.try_recv()
    }

    /// Everything queued so far, without blocking.
    pub fn drain(&mut self) -> Vec<IndexEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

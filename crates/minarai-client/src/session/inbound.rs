//! Inbound dispatch task.
//!
//! Drains the connection's event queue one event at a time, so a `joined`
//! reconciliation completes before the next event is looked at.

use std::sync::Arc;

use tokio::sync::mpsc;

use minarai_core::protocol::{republish, InboundEvent, SessionEvent};

use crate::session::client::Shared;
use crate::transport::WireEvent;

pub(crate) async fn run(shared: Arc<Shared>, mut rx: mpsc::UnboundedReceiver<WireEvent>) {
    while let Some(wire) = rx.recv().await {
        let Some(ev) = InboundEvent::decode(&wire.name, wire.payload) else {
            shared.log.debug(&format!("unhandled transport event: {}", wire.name));
            continue;
        };
        handle(&shared, ev);
    }
    shared.log.debug("inbound stream ended");
}

fn handle(shared: &Shared, ev: InboundEvent) {
    shared.log.obj(ev.name(), ev.payload());

    let rejoin = matches!(ev, InboundEvent::Connect);
    if let InboundEvent::Joined(payload) = &ev {
        shared.reconcile(payload);
    }

    let local = republish(ev);
    if matches!(local, SessionEvent::Disconnected) {
        shared.log.info("disconnected");
    }
    shared.publish(local);

    // every connect, the first one included
    if rejoin {
        shared.join_as_client();
    }
}

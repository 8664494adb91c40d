//! Publish/subscribe abstraction.
//!
//! Delivery is at-least-once and unordered across publishers. The event store is
//! the source of truth; the bus only fans committed events out to live consumers
//! (the dashboard stream, the activity log).

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Receiving side of a bus subscription. Meant to be drained by one thread.
#[derive(Debug)]
pub struct Subscription<M> {
    rx: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(rx: Receiver<M>) -> Self {
        Self { rx }
    }

    pub fn recv(&self) -> Result<M, RecvError> {
        self.rx.recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.rx.try_recv()
    }
}

pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}

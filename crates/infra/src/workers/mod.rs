//! Background threads: bus subscribers and the order progression sweep.

pub mod order_progression;
pub mod subscriber;

use std::sync::mpsc;
use std::thread;

pub use order_progression::{OrderProgressionWorker, SweepReport, sweep};
pub use subscriber::SubscriberWorker;

/// Handle to stop and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    fn new(shutdown: mpsc::Sender<()>, join: thread::JoinHandle<()>) -> Self {
        Self {
            shutdown,
            join: Some(join),
        }
    }

    /// Requests a graceful stop and waits for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

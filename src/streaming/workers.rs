// src/streaming/workers.rs
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TrySendError};

/// What a loop body wants after one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Idle,
}

/// A named background thread that runs `body` once per `interval` while armed,
/// and parks on its wake channel once the body reports it is idle.
pub struct PeriodicLoop {
    name: &'static str,
    wake_tx: Sender<()>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicLoop {
    pub fn spawn<F>(
        name: &'static str,
        interval: Duration,
        stop_rx: Receiver<()>,
        mut body: F,
    ) -> io::Result<Self>
    where
        F: FnMut() -> LoopControl + Send + 'static,
    {
        // capacity 1: a pending token means "already armed"
        let (wake_tx, wake_rx) = bounded::<()>(1);
        let running = Arc::new(AtomicBool::new(false));
        let running_w = running.clone();

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                'park: loop {
                    select! {
                        recv(wake_rx) -> msg => if msg.is_err() { break 'park; },
                        recv(stop_rx) -> _ => break 'park,
                    }

                    running_w.store(true, Ordering::Release);
                    let ticker = tick(interval);
                    loop {
                        select! {
                            recv(ticker) -> _ => {
                                if body() == LoopControl::Idle {
                                    running_w.store(false, Ordering::Release);
                                    continue 'park;
                                }
                            }
                            recv(stop_rx) -> _ => break 'park,
                        }
                    }
                }
                running_w.store(false, Ordering::Release);
                log::debug!("{name} loop exited");
            })?;

        Ok(Self { name, wake_tx, running, handle: Some(handle) })
    }

    /// Idempotent: a no-op while a wake token is already pending.
    pub fn arm(&self) {
        match self.wake_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::trace!("{} loop is gone; arm ignored", self.name);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Waits for the thread after its stop channel has been closed.
    pub fn join(&mut self) {
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                log::error!("{} loop panicked", self.name);
            }
        }
    }
}

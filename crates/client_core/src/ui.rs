//! Single-threaded delivery context for coordinator emissions.
//!
//! Background tasks never touch display targets directly. They post closures
//! through a [`UiContext`]; the thread that owns the views drains the matching
//! [`UiQueue`] and runs them in the order they were posted.

use std::future::Future;

use tokio::{
    runtime::Handle,
    sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::debug;

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone)]
pub struct UiContext {
    tx: UnboundedSender<UiTask>,
}

pub struct UiQueue {
    rx: UnboundedReceiver<UiTask>,
}

pub fn ui_channel() -> (UiContext, UiQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiContext { tx }, UiQueue { rx })
}

impl UiContext {
    /// Queues `task` for the UI thread. Dropped silently once the queue is gone.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(task)).is_err() {
            debug!("ui queue closed; dropping task");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Where coordinators run background work and where they deliver its results.
#[derive(Clone)]
pub struct Dispatcher {
    runtime: Handle,
    ui: UiContext,
}

impl Dispatcher {
    pub fn new(runtime: Handle, ui: UiContext) -> Self {
        Self { runtime, ui }
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    /// Runs CPU-bound work on the runtime's blocking pool.
    pub fn spawn_blocking<F, R>(&self, work: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.runtime.spawn_blocking(work)
    }

    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        self.ui.post(task);
    }
}

impl UiQueue {
    /// Runs every task that is already queued without waiting. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        loop {
            match self.rx.try_recv() {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Waits for the next task and runs it. Returns `false` when every
    /// [`UiContext`] has been dropped and nothing is left.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

//! Dedicated worker thread for a solve.
//!
//! ```ignore
//! let mut handle = JoinSolver::new(graph, settings).spawn()?;
//! while let Some(event) = handle.next_event().await {
//!     match event {
//!         SolverEvent::Progress(p) => println!("{:?}", p),
//!         SolverEvent::Finished(results) => break,
//!         SolverEvent::Stopped => break,
//!         _ => {}
//!     }
//! }
//! // The worker is cancelled and joined on drop
//! ```

use std::any::Any;
use std::io;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::config::VisualizationSettings;

use super::progress::{CancelToken, Reporter, SolverEvent};
use super::{JoinSolver, SolveOutcome};

/// Consumer side of a running solve.
pub struct SolverHandle {
    events: UnboundedReceiver<SolverEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl JoinSolver {
    /// Start the solve on a new worker thread.
    pub fn spawn(self) -> io::Result<SolverHandle> {
        let visualization = self.settings.visualization.clone();
        spawn_worker(&visualization, move |reporter| self.solve(reporter))
    }
}

/// Run `task` on a worker thread and send its terminal event.
fn spawn_worker<F>(visualization: &VisualizationSettings, task: F) -> io::Result<SolverHandle>
where
    F: FnOnce(&Reporter) -> SolveOutcome + Send + 'static,
{
    let (sender, events) = unbounded_channel();
    let cancel = CancelToken::new();
    let reporter = Reporter::new(sender, cancel.clone(), visualization);

    let thread = thread::Builder::new()
        .name("joinpath-solver".to_string())
        .spawn(move || {
            let event = match task(&reporter) {
                SolveOutcome::Found(results) => SolverEvent::Finished(results),
                SolveOutcome::Stopped => SolverEvent::Stopped,
                SolveOutcome::Failed(message) => {
                    // No terminal event; the handle reports the failure
                    log::error!("solve failed: {}", message);
                    return;
                }
            };
            reporter.send(event);
        })?;

    Ok(SolverHandle {
        events,
        cancel,
        thread: Some(thread),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "solver thread panicked".to_string()
    }
}

impl SolverHandle {
    /// Ask the worker to stop. Fire-and-forget.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the worker is gone.
    pub async fn next_event(&mut self) -> Option<SolverEvent> {
        self.events.recv().await
    }

    /// Blocking variant of [`next_event`](Self::next_event).
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_next_event(&mut self) -> Option<SolverEvent> {
        self.events.blocking_recv()
    }

    /// Drain events until the run ends, then join the worker.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait(self) -> SolveOutcome {
        self.wait_with(|_| {})
    }

    /// Like [`wait`](Self::wait), handing every non-terminal event to `on_event`.
    pub fn wait_with<F>(mut self, mut on_event: F) -> SolveOutcome
    where
        F: FnMut(SolverEvent),
    {
        let received = loop {
            match self.blocking_next_event() {
                Some(SolverEvent::Finished(results)) => break Some(SolveOutcome::Found(results)),
                Some(SolverEvent::Stopped) => break Some(SolveOutcome::Stopped),
                Some(event) => on_event(event),
                None => break None,
            }
        };
        self.settle(received)
    }

    /// Async variant of [`wait`](Self::wait).
    pub async fn finish(mut self) -> SolveOutcome {
        let received = loop {
            match self.next_event().await {
                Some(SolverEvent::Finished(results)) => break Some(SolveOutcome::Found(results)),
                Some(SolverEvent::Stopped) => break Some(SolveOutcome::Stopped),
                Some(_) => {}
                None => break None,
            }
        };
        // The terminal event is the worker's last action
        self.settle(received)
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Join the worker and decide the outcome.
    ///
    /// A closed channel without a terminal event means the worker died.
    fn settle(&mut self, received: Option<SolveOutcome>) -> SolveOutcome {
        let joined = self.join();
        match (received, joined) {
            (Some(outcome), _) => outcome,
            (None, Err(message)) => SolveOutcome::Failed(message),
            (None, Ok(())) => SolveOutcome::Failed("solver exited without a result".to_string()),
        }
    }

    fn join(&mut self) -> Result<(), String> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        thread.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            log::error!("solver thread panicked: {}", message);
            message
        })
    }
}

impl Drop for SolverHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
            let _ = self.join();
        }
    }
}

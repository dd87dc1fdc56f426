//! Progress events and cooperative cancellation.
//!
//! The worker owns a [`Reporter`]; consumers hold the receiving end of the
//! event channel and a clone of the [`CancelToken`]. Nothing else crosses
//! the thread boundary while a solve runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::VisualizationSettings;

use super::combine::ResultSet;

/// Marker returned when a solve observed a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("solve cancelled")]
pub struct Cancelled;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Fire-and-forget.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Which phase touched a set of tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Steiner points picked by a Steiner tree
    Steiner,
    /// Intermediate tables of an expanded super-edge
    Expansion,
    /// Tables of an accepted join solution
    Combination,
}

/// Progress counters, one variant per solver phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A bitmask pass over `candidates` Steiner points started.
    SteinerRound { round: usize, candidates: usize },
    /// Subset `current` of `total` of the current pass was evaluated.
    SteinerCombination {
        round: usize,
        current: u64,
        total: u64,
        found: usize,
    },
    /// Super-edge `edge` of `edges` of tree `tree` of `trees` is being expanded.
    SuperEdgeRound {
        tree: usize,
        trees: usize,
        edge: usize,
        edges: usize,
    },
    /// Number of paths found for one super-edge.
    SubPathCount {
        from: String,
        to: String,
        paths: usize,
    },
    /// Combining paths of tree `tree` of `trees` started.
    CombinationRound { tree: usize, trees: usize },
    /// Combination `current` of `total` of the current tree was checked.
    Combination { current: u64, total: u64 },
    /// Solutions retained so far.
    PathsFound { count: usize },
}

/// Everything the worker sends to its consumer.
#[derive(Debug, Clone)]
pub enum SolverEvent {
    Progress(Progress),
    /// Tables touched by a phase (visualization only).
    Touched { phase: Phase, tables: Vec<String> },
    /// Terminal event of a successful run.
    Finished(ResultSet),
    /// Terminal event of a cancelled run.
    Stopped,
}

/// Worker-side end of the progress channel.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    sender: Option<UnboundedSender<SolverEvent>>,
    cancel: CancelToken,
    /// Step delay when visualization is enabled
    visualization: Option<Duration>,
}

impl Reporter {
    /// A reporter that only carries a cancellation token.
    pub fn silent(cancel: CancelToken) -> Self {
        Self {
            sender: None,
            cancel,
            visualization: None,
        }
    }

    pub fn new(
        sender: UnboundedSender<SolverEvent>,
        cancel: CancelToken,
        visualization: &VisualizationSettings,
    ) -> Self {
        Self {
            sender: Some(sender),
            cancel,
            visualization: visualization.enabled.then(|| visualization.step_delay()),
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        self.cancel.check()
    }

    pub fn progress(&self, progress: Progress) {
        log::trace!("{:?}", progress);
        self.send(SolverEvent::Progress(progress));
    }

    /// Emit a touched-table event and pause, when visualization is on.
    ///
    /// `tables` is only evaluated when the event is actually sent.
    pub fn touch<F>(&self, phase: Phase, tables: F)
    where
        F: FnOnce() -> Vec<String>,
    {
        let Some(delay) = self.visualization else {
            return;
        };
        if self.sender.is_none() {
            return;
        }

        self.send(SolverEvent::Touched {
            phase,
            tables: tables(),
        });
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    /// Send an event. A dropped receiver is not an error: the handle cancels on drop.
    pub fn send(&self, event: SolverEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

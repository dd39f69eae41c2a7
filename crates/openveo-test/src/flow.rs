//! Sequential task queue.
//!
//! Every browser call and every fixture store call of a test goes through one
//! [`ControlFlow`]. Tasks wait for their turn on a fair mutex, so they run one
//! at a time in the order they were scheduled, whichever page object or helper
//! scheduled them.
//!
//! Only leaf operations take a turn. Composite operations (a page method calling
//! several driver methods) never hold the queue, which keeps nesting deadlock free.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// FIFO executor shared by a session and its helpers
#[derive(Debug, Clone, Default)]
pub struct ControlFlow {
    turn: Arc<Mutex<()>>,
    executed: Arc<AtomicU64>,
}

impl ControlFlow {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once every previously scheduled task has completed
    pub async fn execute<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _turn = self.turn.lock().await;
        let output = task.await;
        self.executed.fetch_add(1, Ordering::Relaxed);
        output
    }

    /// Number of tasks run so far
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Whether both handles share the same queue
    #[must_use]
    pub fn same_queue(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.turn, &other.turn)
    }
}

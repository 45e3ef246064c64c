use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

struct QueueState<T> {
    entries: VecDeque<T>,
    closed: bool,
}

/// Unbounded FIFO queue shared between submitters and the drain loop.
///
/// Insertions never block on anything but the short internal lock, and there is
/// no capacity limit. Once the queue is closed, `enqueue` hands the entry back
/// to the caller instead of storing it.
pub struct JobQueue<T> {
    state: Mutex<QueueState<T>>,
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JobQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `entry` at the back of the queue.
    ///
    /// # Errors
    /// Returns the entry unchanged if the queue has been closed.
    pub fn enqueue(&self, entry: T) -> Result<(), T> {
        let mut state = self.lock();
        if state.closed {
            return Err(entry);
        }
        state.entries.push_back(entry);
        Ok(())
    }

    /// Removes and returns, oldest first, at most `n` entries.
    ///
    /// Returns an empty vector if the queue is empty; never waits for new entries.
    pub fn drain_up_to(&self, n: usize) -> Vec<T> {
        let mut state = self.lock();
        let count = n.min(state.entries.len());
        state.entries.drain(..count).collect()
    }

    /// Closes the queue and removes every remaining entry in one step.
    pub fn close_and_drain(&self) -> Vec<T> {
        let mut state = self.lock();
        state.closed = true;
        state.entries.drain(..).collect()
    }

    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

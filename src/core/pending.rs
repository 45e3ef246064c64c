use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::BatchError;

use super::job::JobResult;

/// Caller-side handle on the result of a submitted job.
///
/// Returned immediately by [`MicroBatcher::submit`](super::batcher::MicroBatcher::submit)
/// and resolved once the batch containing the job has been executed. It can be
/// awaited directly, through [`wait`](PendingResult::wait), or from a thread
/// outside the runtime through [`blocking_wait`](PendingResult::blocking_wait).
#[derive(Debug)]
pub struct PendingResult {
    id: Uuid,
    receiver: oneshot::Receiver<JobResult>,
}

/// Coordinator-side half of a [`PendingResult`].
///
/// `resolve` consumes the sender, so a result can be assigned at most once.
#[derive(Debug)]
pub(crate) struct ResultSender {
    id: Uuid,
    sender: oneshot::Sender<JobResult>,
}

/// Creates a linked sender / pending result pair sharing a fresh id.
pub(crate) fn pending_pair() -> (ResultSender, PendingResult) {
    let id = Uuid::new_v4();
    let (sender, receiver) = oneshot::channel();
    (ResultSender { id, sender }, PendingResult { id, receiver })
}

impl ResultSender {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Delivers `result` to the caller. Returns `false` if the caller already
    /// dropped its `PendingResult`.
    pub(crate) fn resolve(self, result: JobResult) -> bool {
        self.sender.send(result).is_ok()
    }
}

impl PendingResult {
    /// Identifier of the submitted job.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits until the job's batch has completed.
    pub async fn wait(self) -> Result<JobResult, BatchError> {
        self.await
    }

    /// Blocks the current thread until the job's batch has completed.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context, like
    /// [`tokio::sync::oneshot::Receiver::blocking_recv`].
    pub fn blocking_wait(self) -> Result<JobResult, BatchError> {
        let id = self.id;
        self.receiver
            .blocking_recv()
            .map_err(|_| BatchError::ResultDropped(id))
    }
}

impl Future for PendingResult {
    type Output = Result<JobResult, BatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.map_err(|_| BatchError::ResultDropped(id)))
    }
}

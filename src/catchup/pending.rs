use crate::catchup::error::CatchupFailure;
use crate::time::Clock;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// PendingResponse is the handle to an in-flight catchup request. The request runs on its own
/// task; cancelling the handle, or dropping it, aborts that task.
pub(crate) struct PendingResponse<T> {
    result: oneshot::Receiver<Result<T, CatchupFailure>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> PendingResponse<T> {
    pub(crate) fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = Result<T, CatchupFailure>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = request.await;
            // Receiver gone means nobody is waiting anymore.
            let _ = tx.send(result);
        });

        PendingResponse {
            result: rx,
            task: Some(task),
        }
    }
}

impl<T> PendingResponse<T> {
    #[cfg(test)]
    pub(crate) fn from_receiver(result: oneshot::Receiver<Result<T, CatchupFailure>>) -> Self {
        PendingResponse { result, task: None }
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.result.close();
    }
}

impl<T> Future for PendingResponse<T> {
    type Output = Result<T, CatchupFailure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let rx = Pin::new(&mut self.result);

        match rx.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CatchupFailure::Abandoned)),
        }
    }
}

impl<T> Drop for PendingResponse<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// ResponseActivity remembers when the last piece of a response arrived, so a waiter can tell a
/// slow but progressing response from a stalled one.
#[derive(Clone)]
pub(crate) struct ResponseActivity<C: Clock> {
    clock: C,
    last_response: Arc<Mutex<Option<Instant>>>,
}

impl<C: Clock> ResponseActivity<C> {
    pub(crate) fn new(clock: C) -> Self {
        ResponseActivity {
            clock,
            last_response: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn record(&self) {
        let now = self.clock.now();
        self.last_response
            .lock()
            .expect("ResponseActivity.record() mutex guard poison")
            .replace(now);
    }

    /// `None` until the first response arrives.
    pub(crate) fn time_since_last_response(&self) -> Option<Duration> {
        let last_response = *self
            .last_response
            .lock()
            .expect("ResponseActivity.time_since_last_response() mutex guard poison");
        last_response.map(|last| self.clock.now().saturating_duration_since(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::mocked_clock;

    #[tokio::test]
    async fn cancel_aborts_the_request_task() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        let mut pending = PendingResponse::<()>::spawn(async move {
            let _alive = alive_tx;
            futures::future::pending::<()>().await;
            Ok(())
        });

        pending.cancel();
        assert!(alive_rx.await.is_err());
    }

    #[tokio::test]
    async fn completed_request_yields_result() {
        let pending = PendingResponse::spawn(async { Ok::<_, CatchupFailure>(42) });
        assert_eq!(pending.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn activity_measures_from_last_record() {
        let (clock, mut controller) = mocked_clock();
        let activity = ResponseActivity::new(clock);
        assert_eq!(activity.time_since_last_response(), None);

        controller.advance(Duration::from_millis(30));
        activity.record();
        controller.advance(Duration::from_millis(20));
        assert_eq!(activity.time_since_last_response(), Some(Duration::from_millis(20)));
    }
}

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Creates the pair used to stop a catchup server. The server stops accepting connections once
/// the handle is dropped or `shutdown()` is called on it.
pub fn shutdown_signal() -> (CatchupServerShutdownHandle, CatchupServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (
        CatchupServerShutdownHandle { tx },
        CatchupServerShutdownSignal { rx },
    )
}

pub struct CatchupServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl CatchupServerShutdownHandle {
    pub fn shutdown(self) {
        // Server already gone is as good as shut down.
        let _ = self.tx.send(());
    }
}

pub struct CatchupServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for CatchupServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            // Sent or dropped, either way it's time to stop.
            Poll::Ready(_) => Poll::Ready(()),
        }
    }
}

use std::sync::Arc;
use tokio::sync::watch;

/// Interrupter lets the owner of a catchup client abort every request currently waiting on it.
/// An interrupted waiter cancels its request and reports the interruption to its caller.
#[derive(Clone)]
pub struct Interrupter {
    interrupted: Arc<watch::Sender<bool>>,
    listener: watch::Receiver<bool>,
}

pub struct InterruptListener {
    interrupted: watch::Receiver<bool>,
}

impl Interrupter {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Interrupter {
            interrupted: Arc::new(tx),
            listener: rx,
        }
    }

    pub fn interrupt(&self) {
        // Fails only without listeners, and `self` holds one.
        let _ = self.interrupted.send(true);
    }

    /// Clears the interrupted flag so new requests can be made.
    pub fn reset(&self) {
        let _ = self.interrupted.send(false);
    }

    pub fn is_interrupted(&self) -> bool {
        *self.listener.borrow()
    }

    pub fn listener(&self) -> InterruptListener {
        InterruptListener {
            interrupted: self.listener.clone(),
        }
    }
}

impl Default for Interrupter {
    fn default() -> Self {
        Interrupter::new()
    }
}

impl InterruptListener {
    /// Resolves once the interrupter has fired.
    pub async fn interrupted(&mut self) {
        loop {
            if *self.interrupted.borrow() {
                return;
            }
            if self.interrupted.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

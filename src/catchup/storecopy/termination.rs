use crate::catchup::storecopy::StoreCopyFailed;
use crate::time::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// TerminationCondition bounds a long running copy. It is polled between steps, and the copy
/// gives up with the returned error as soon as a poll fails.
pub trait TerminationCondition: Send + Sync {
    fn assert_continue(&self) -> Result<(), StoreCopyFailed>;

    /// Stops when either condition says so.
    fn or<T: TerminationCondition>(self, other: T) -> Or<Self, T>
    where
        Self: Sized,
    {
        Or(self, other)
    }
}

impl<T: TerminationCondition + ?Sized> TerminationCondition for &T {
    fn assert_continue(&self) -> Result<(), StoreCopyFailed> {
        (**self).assert_continue()
    }
}

pub struct Or<A, B>(A, B);

impl<A: TerminationCondition, B: TerminationCondition> TerminationCondition for Or<A, B> {
    fn assert_continue(&self) -> Result<(), StoreCopyFailed> {
        self.0.assert_continue()?;
        self.1.assert_continue()
    }
}

/// Allows continuing until a fixed amount of time after construction.
pub struct MaximumTotalTime<C: Clock> {
    clock: C,
    duration: Duration,
    end: Instant,
}

impl<C: Clock> MaximumTotalTime<C> {
    pub fn new(duration: Duration, clock: C) -> Self {
        let end = clock.now() + duration;
        MaximumTotalTime { clock, duration, end }
    }
}

impl<C: Clock> TerminationCondition for MaximumTotalTime<C> {
    fn assert_continue(&self) -> Result<(), StoreCopyFailed> {
        if self.clock.now() > self.end {
            return Err(StoreCopyFailed::Terminated(format!(
                "Maximum time passed {:?}. Not allowed to continue",
                self.duration
            )));
        }
        Ok(())
    }
}

/// Cancels a copy from outside of it.
pub struct Canceller {
    cancelled: Arc<AtomicBool>,
}

/// Fails once its `Canceller` has cancelled.
pub struct CancellationCheck {
    cancelled: Arc<AtomicBool>,
}

pub fn cancellation() -> (Canceller, CancellationCheck) {
    let cancelled = Arc::new(AtomicBool::new(false));

    let canceller = Canceller {
        cancelled: cancelled.clone(),
    };
    let check = CancellationCheck { cancelled };

    (canceller, check)
}

impl Canceller {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl TerminationCondition for CancellationCheck {
    fn assert_continue(&self) -> Result<(), StoreCopyFailed> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(StoreCopyFailed::Cancelled);
        }
        Ok(())
    }
}

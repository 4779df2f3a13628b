use tokio::time::{Duration, Instant};

/// Clock is the source of time for everything in this crate that waits or measures elapsed time.
/// Production code uses `RealClock`; tests drive a mocked clock by hand so timeouts can be
/// asserted at exact instants.
#[async_trait::async_trait]
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    async fn sleep_until(&mut self, deadline: Instant);

    async fn sleep(&mut self, duration: Duration) {
        let deadline = self.now() + duration;
        self.sleep_until(deadline).await;
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub(crate) use mock::{mocked_clock, MockClock, MockClockController};


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::Duration;

    #[tokio::test]
    async fn mock_clock() {
        let tick_duration = Duration::from_millis(500);
        let real_wait = Duration::from_millis(20);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (mut mock_clock, mut controller) = mocked_clock();
        let test_start_time = controller.current_time();

        tokio::spawn(async move {
            let mut next_wake = test_start_time;
            loop {
                next_wake += tick_duration;
                mock_clock.sleep_until(next_wake).await;
                tx.send(()).expect("receiver shouldn't drop");
            }
        });

        // Half-tick offset avoids off-by-one at tick boundaries.
        controller.advance(tick_duration / 2);
        tokio::time::timeout(real_wait, rx.recv())
            .await
            .expect_err("Expected timeout");

        controller.advance(tick_duration);
        rx.recv().await.unwrap();
        tokio::time::timeout(real_wait, rx.recv())
            .await
            .expect_err("Expected timeout");

        controller.advance(tick_duration * 3);
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        tokio::time::timeout(real_wait, rx.recv())
            .await
            .expect_err("Expected timeout");

        assert_eq!(controller.elapsed_time(), tick_duration * 9 / 2);
    }
}

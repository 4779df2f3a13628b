//! Fault injection for the client side of the transport.

use crate::catchup::RequestMessageType;
use crate::messaging::AdvertisedSocketAddress;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use tokio::time::Duration;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageDelay {
    /// Send after waiting this long.
    Deliver(Duration),
    /// Never send. The request's waiter times out.
    Lost,
}

/// NetworkLatencyStrategy decides, per outgoing request, how the simulated network treats it.
pub trait NetworkLatencyStrategy: Send + Sync + 'static {
    fn message_delay(&self, message_type: RequestMessageType, destination: &AdvertisedSocketAddress) -> MessageDelay;
}

/// Every request goes out immediately.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLatency;

impl NetworkLatencyStrategy for NoLatency {
    fn message_delay(&self, _: RequestMessageType, _: &AdvertisedSocketAddress) -> MessageDelay {
        MessageDelay::Deliver(Duration::from_millis(0))
    }
}

/// Every request is held back by the same amount.
#[derive(Copy, Clone, Debug)]
pub struct FixedDelayStrategy {
    delay: Duration,
}

impl FixedDelayStrategy {
    pub fn new(delay: Duration) -> Self {
        FixedDelayStrategy { delay }
    }
}

impl NetworkLatencyStrategy for FixedDelayStrategy {
    fn message_delay(&self, _: RequestMessageType, _: &AdvertisedSocketAddress) -> MessageDelay {
        MessageDelay::Deliver(self.delay)
    }
}

/// Drops requests at random. `rate` is the fraction delivered: 1.0 drops nothing, 0.0 drops
/// everything. Seeded so a failing run can be replayed.
pub struct RandomDropStrategy {
    random: Mutex<StdRng>,
    rate: Mutex<f64>,
}

impl RandomDropStrategy {
    pub fn new(seed: u64, rate: f64) -> Self {
        RandomDropStrategy {
            random: Mutex::new(StdRng::seed_from_u64(seed)),
            rate: Mutex::new(rate),
        }
    }

    pub fn set_rate(&self, rate: f64) {
        *self.rate.lock().expect("RandomDropStrategy.set_rate() mutex guard poison") = rate;
    }
}

impl NetworkLatencyStrategy for RandomDropStrategy {
    fn message_delay(&self, _: RequestMessageType, _: &AdvertisedSocketAddress) -> MessageDelay {
        let rate = *self.rate.lock().expect("RandomDropStrategy rate mutex guard poison");
        let roll: f64 = self
            .random
            .lock()
            .expect("RandomDropStrategy random mutex guard poison")
            .gen();

        if roll < rate {
            MessageDelay::Deliver(Duration::from_millis(0))
        } else {
            MessageDelay::Lost
        }
    }
}

mod clock;

pub use clock::Clock;
pub use clock::RealClock;

#[cfg(test)]
pub(crate) use clock::mocked_clock;
#[cfg(test)]
pub(crate) use clock::MockClock;
#[cfg(test)]
pub(crate) use clock::MockClockController;

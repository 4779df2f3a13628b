use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct CatchupOptions {
    pub inactivity_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub store_copy_max_total_time: Option<Duration>,
    pub store_copy_retry_backoff: Option<Duration>,
    pub max_chunk_size: Option<usize>,
    pub max_frame_bytes: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct CatchupOptionsValidated {
    pub inactivity_timeout: Duration,
    pub connect_timeout: Duration,
    pub store_copy_max_total_time: Duration,
    pub store_copy_retry_backoff: Duration,
    pub max_chunk_size: usize,
    pub max_frame_bytes: usize,
}

impl CatchupOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.inactivity_timeout == Duration::from_millis(0) {
            return Err("Inactivity timeout must be greater than zero");
        }
        if self.connect_timeout > self.inactivity_timeout {
            return Err("Connect timeout must not exceed the inactivity timeout");
        }
        if self.store_copy_retry_backoff >= self.store_copy_max_total_time {
            return Err("Store copy retry backoff must be less than the maximum total store copy time");
        }
        if self.max_chunk_size == 0 {
            return Err("Maximum chunk size must be greater than zero");
        }
        if self.max_frame_bytes <= self.max_chunk_size {
            return Err("Maximum frame size must be greater than the maximum chunk size");
        }

        Ok(())
    }
}

impl TryFrom<CatchupOptions> for CatchupOptionsValidated {
    type Error = &'static str;

    fn try_from(options: CatchupOptions) -> Result<Self, Self::Error> {
        let values = CatchupOptionsValidated {
            inactivity_timeout: options.inactivity_timeout.unwrap_or(Duration::from_secs(10)),
            connect_timeout: options.connect_timeout.unwrap_or(Duration::from_secs(5)),
            store_copy_max_total_time: options
                .store_copy_max_total_time
                .unwrap_or(Duration::from_secs(20 * 60)),
            store_copy_retry_backoff: options.store_copy_retry_backoff.unwrap_or(Duration::from_secs(1)),
            max_chunk_size: options.max_chunk_size.unwrap_or(32 * 1024),
            max_frame_bytes: options.max_frame_bytes.unwrap_or(16 * 1024 * 1024),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = CatchupOptionsValidated::try_from(CatchupOptions::default()).unwrap();

        assert_eq!(options.inactivity_timeout, Duration::from_secs(10));
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert_eq!(options.max_chunk_size, 32 * 1024);
    }

    #[test]
    fn connect_timeout_longer_than_inactivity_timeout() {
        let options = CatchupOptions {
            inactivity_timeout: Some(Duration::from_secs(1)),
            connect_timeout: Some(Duration::from_secs(2)),
            ..CatchupOptions::default()
        };

        assert!(CatchupOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn retry_backoff_must_fit_in_total_time() {
        let options = CatchupOptions {
            store_copy_max_total_time: Some(Duration::from_secs(1)),
            store_copy_retry_backoff: Some(Duration::from_secs(1)),
            ..CatchupOptions::default()
        };

        assert!(CatchupOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn frame_must_hold_a_chunk() {
        let options = CatchupOptions {
            max_chunk_size: Some(1024),
            max_frame_bytes: Some(1024),
            ..CatchupOptions::default()
        };

        assert!(CatchupOptionsValidated::try_from(options).is_err());
    }
}

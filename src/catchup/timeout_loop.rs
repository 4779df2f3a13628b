use crate::catchup::error::{CatchupClientError, CatchupFailure};
use crate::catchup::interrupt::InterruptListener;
use crate::catchup::pending::PendingResponse;
use crate::time::Clock;
use tokio::time::Duration;

/// Waits for a pending catchup response for as long as the remote keeps making progress.
///
/// The wait fails once `inactivity_timeout` passes without any part of the response arriving, as
/// told by `time_since_last_response` (`None` meaning nothing arrived yet). Every way out of this
/// function other than success cancels the pending request first.
pub(crate) async fn wait_for_completion<T, C, F>(
    mut pending: PendingResponse<T>,
    operation: &str,
    time_since_last_response: F,
    inactivity_timeout: Duration,
    mut clock: C,
    interrupt: &mut InterruptListener,
    logger: &slog::Logger,
) -> Result<T, CatchupClientError>
where
    C: Clock,
    F: Fn() -> Option<Duration>,
{
    let mut remaining = inactivity_timeout;
    loop {
        let deadline = clock.now() + remaining;

        let failure = tokio::select! {
            result = &mut pending => match result {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            },
            _ = clock.sleep_until(deadline) => match time_since_last_response() {
                None => CatchupFailure::NeverResponded {
                    timeout: inactivity_timeout,
                },
                Some(elapsed) if elapsed < inactivity_timeout => {
                    remaining = inactivity_timeout - elapsed;
                    continue;
                }
                Some(elapsed) => CatchupFailure::Stalled {
                    since_last_response: elapsed,
                    timeout: inactivity_timeout,
                },
            },
            _ = interrupt.interrupted() => CatchupFailure::Interrupted,
        };

        pending.cancel();
        slog::warn!(logger, "Request '{}' failed: {}", operation, failure);
        return Err(CatchupClientError::new(operation, failure));
    }
}

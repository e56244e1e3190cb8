//! Timeout helper.

use std::future::Future;
use std::time::Duration;

/// Marker returned when a wrapped future runs past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut(pub Duration);

/// Wrap a fallible future with a timeout.
///
/// The error type decides how an elapsed deadline is reported.
pub async fn with_timeout<T, E>(
    duration: Duration,
    future: impl Future<Output = Result<T, E>>,
) -> Result<T, E>
where
    E: From<TimedOut>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(TimedOut(duration).into()),
    }
}

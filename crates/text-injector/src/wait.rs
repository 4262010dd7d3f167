use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::InjectError;

/// Sleeps for a settle interval unless the token fires first.
pub(crate) async fn settle(cancel: &CancellationToken, duration: Duration) -> Result<(), InjectError> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(InjectError::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(InjectError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

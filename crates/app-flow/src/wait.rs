use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::FlowError;

/// Fixed settle interval that returns early with `Cancelled` when the token fires.
pub(crate) async fn settle(cancel: &CancellationToken, duration: Duration) -> Result<(), FlowError> {
    if cancel.is_cancelled() {
        return Err(FlowError::Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = tokio_test::block_on(settle(&cancel, Duration::from_secs(3600)));
        assert!(matches!(result, Err(FlowError::Cancelled)));
    }

    #[test]
    fn zero_duration_returns_immediately() {
        let cancel = CancellationToken::new();
        assert!(tokio_test::block_on(settle(&cancel, Duration::ZERO)).is_ok());
    }
}

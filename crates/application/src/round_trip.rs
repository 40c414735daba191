use std::future::Future;
use std::time::Duration;

use bizdock_core::{AppError, AppResult};

/// Default bound for one storage round-trip.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings of the access engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEngineConfig {
    /// Upper bound for every storage round-trip made while deciding.
    pub round_trip_timeout: Duration,
}

impl Default for AccessEngineConfig {
    fn default() -> Self {
        Self {
            round_trip_timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }
}

/// Awaits one storage round-trip within the bound.
///
/// Timeouts and internal storage failures become relationship resolution
/// errors; other errors pass through unchanged.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    operation: &str,
    round_trip: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    match tokio::time::timeout(timeout, round_trip).await {
        Ok(Err(AppError::Internal(message))) => Err(AppError::RelationshipResolution(format!(
            "{operation} failed: {message}"
        ))),
        Ok(result) => result,
        Err(_) => Err(AppError::RelationshipResolution(format!(
            "{operation} timed out after {} ms",
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bizdock_core::{AppError, AppResult};

    use super::bounded;

    #[tokio::test]
    async fn slow_round_trip_times_out_as_resolution_failure() {
        let result: AppResult<u64> = bounded(Duration::from_millis(10), "slow lookup", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;

        assert!(matches!(result, Err(AppError::RelationshipResolution(_))));
    }

    #[tokio::test]
    async fn internal_failure_becomes_resolution_failure() {
        let result: AppResult<u64> = bounded(Duration::from_secs(1), "lookup", async {
            Err(AppError::Internal("connection reset".to_owned()))
        })
        .await;

        assert!(matches!(
            result,
            Err(AppError::RelationshipResolution(message)) if message.contains("connection reset")
        ));
    }

    #[tokio::test]
    async fn validation_failure_passes_through() {
        let result: AppResult<u64> = bounded(Duration::from_secs(1), "lookup", async {
            Err(AppError::Validation("bad filter".to_owned()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

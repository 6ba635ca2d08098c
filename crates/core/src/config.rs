//! Core runtime configuration and service wiring.
//!
//! Everything here is resolved once at process startup and then passed into
//! services as an [`Arc<CoreContext>`]. Request handling never reads
//! process-wide environment variables, which keeps behaviour consistent
//! across multi-threaded runtimes and test harnesses.

use crate::error::{RecordError, RecordResult};
use crate::numbers::PatientNumberSource;
use crate::store::{with_retries, Filter, QueryClient, Row, StoreError, Table};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Bounded retry behaviour for transient storage faults.
///
/// Only transport-level failures (including per-attempt timeouts) are
/// retried; definitive outcomes such as uniqueness violations or malformed
/// queries surface immediately. Backoff is linear: attempt `n` sleeps for
/// `n * base_delay` before the next try.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    request_timeout: Duration,
}

impl RetryPolicy {
    /// Create a new `RetryPolicy`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] when `max_attempts` is zero or
    /// `request_timeout` is zero, since either would make every storage call
    /// fail unconditionally.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        request_timeout: Duration,
    ) -> RecordResult<Self> {
        if max_attempts == 0 {
            return Err(RecordError::InvalidInput(
                "retry policy needs at least one attempt".into(),
            ));
        }
        if request_timeout.is_zero() {
            return Err(RecordError::InvalidInput(
                "request timeout cannot be zero".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            request_timeout,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Delay to sleep after a failed attempt (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared wiring for every core service: the storage client, the patient
/// number source, and the retry policy applied to both.
///
/// Construct one at startup and hand `Arc<CoreContext>` to
/// [`IdentityService`](crate::identity::IdentityService) and
/// [`PatientChart`](crate::chart::PatientChart).
pub struct CoreContext {
    client: Arc<dyn QueryClient>,
    numbers: Arc<dyn PatientNumberSource>,
    retry: RetryPolicy,
}

impl CoreContext {
    pub fn new(
        client: Arc<dyn QueryClient>,
        numbers: Arc<dyn PatientNumberSource>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            numbers,
            retry,
        }
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Select rows with retry and timeout applied per attempt.
    pub(crate) async fn select(
        &self,
        table: Table,
        filters: Vec<Filter>,
    ) -> Result<Vec<Row>, StoreError> {
        let client = Arc::clone(&self.client);
        with_retries(&self.retry, "select", move || {
            let client = Arc::clone(&client);
            let filters = filters.clone();
            async move { client.select(table, &filters).await }
        })
        .await
    }

    /// Insert a row with retry and timeout applied per attempt.
    pub(crate) async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let client = Arc::clone(&self.client);
        with_retries(&self.retry, "insert", move || {
            let client = Arc::clone(&client);
            let row = row.clone();
            async move { client.insert(table, row).await }
        })
        .await
    }

    /// Update a row by id with retry and timeout applied per attempt.
    pub(crate) async fn update(
        &self,
        table: Table,
        id: Uuid,
        row: Row,
    ) -> Result<Row, StoreError> {
        let client = Arc::clone(&self.client);
        with_retries(&self.retry, "update", move || {
            let client = Arc::clone(&client);
            let row = row.clone();
            async move { client.update(table, id, row).await }
        })
        .await
    }

    /// Request a fresh patient number, retried like any other remote call.
    pub(crate) async fn next_number(&self) -> Result<String, StoreError> {
        let numbers = Arc::clone(&self.numbers);
        with_retries(&self.retry, "generate patient number", move || {
            let numbers = Arc::clone(&numbers);
            async move { numbers.next_number().await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_rejects_zero_attempts() {
        let result = RetryPolicy::new(0, Duration::from_millis(1), Duration::from_secs(1));
        assert!(matches!(result, Err(RecordError::InvalidInput(_))));
    }

    #[test]
    fn retry_policy_rejects_zero_timeout() {
        let result = RetryPolicy::new(3, Duration::from_millis(1), Duration::ZERO);
        assert!(matches!(result, Err(RecordError::InvalidInput(_))));
    }

    #[test]
    fn backoff_grows_linearly_with_the_attempt_number() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .expect("valid policy");
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(300));
    }

    #[test]
    fn default_policy_is_usable() {
        let policy = RetryPolicy::default();
        assert!(policy.max_attempts() >= 1);
        assert!(!policy.request_timeout().is_zero());
    }
}

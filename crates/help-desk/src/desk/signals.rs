//! Counting signals between actors.
//!
//! One `post` is one permit; one `wait` consumes exactly one permit. Permits
//! posted before anyone waits are kept, so a notification can never be lost
//! between a predicate check and the wait that follows it.

use crate::errors::HelpDeskError;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// A counting semaphore used purely for notification.
#[derive(Debug)]
pub struct Signal {
    name: &'static str,
    permits: Semaphore,
}

impl Signal {
    /// A signal with no pending notifications.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            permits: Semaphore::new(0),
        }
    }

    /// Post one notification.
    pub fn post(&self) {
        self.permits.add_permits(1);
    }

    /// Post `count` notifications at once.
    pub fn post_many(&self, count: usize) {
        if count > 0 {
            self.permits.add_permits(count);
        }
    }

    /// Block until a notification is available and consume it.
    ///
    /// # Errors
    ///
    /// `Cancelled` if `cancel` fires first, `SignalClosed` if the signal was
    /// closed.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), HelpDeskError> {
        tokio::select! {
            () = cancel.cancelled() => Err(HelpDeskError::Cancelled),
            permit = self.permits.acquire() => {
                permit
                    .map_err(|_| HelpDeskError::SignalClosed(self.name))?
                    .forget();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_post_before_wait_is_not_lost() {
        let signal = Signal::new("test");
        let cancel = CancellationToken::new();

        signal.post();
        assert_eq!(signal.permits.available_permits(), 1);
        signal.wait(&cancel).await.unwrap();
        assert_eq!(signal.permits.available_permits(), 0);
    }

    #[tokio::test]
    async fn test_each_post_releases_one_wait() {
        let signal = Signal::new("test");
        let cancel = CancellationToken::new();

        signal.post_many(3);
        for _ in 0..3 {
            signal.wait(&cancel).await.unwrap();
        }

        let blocked = tokio::time::timeout(Duration::from_millis(20), signal.wait(&cancel)).await;
        assert!(blocked.is_err(), "fourth wait should block");
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_post() {
        let signal = Arc::new(Signal::new("test"));
        let cancel = CancellationToken::new();

        let waiter = {
            let signal = Arc::clone(&signal);
            let cancel = cancel.clone();
            tokio::spawn(async move { signal.wait(&cancel).await })
        };

        tokio::task::yield_now().await;
        signal.post();
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_wait() {
        let signal = Signal::new("ready");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = signal.wait(&cancel).await;
        assert!(matches!(result, Err(HelpDeskError::Cancelled)));
    }

    #[test]
    fn test_post_many_zero_is_noop() {
        let signal = Signal::new("admitted");
        signal.post_many(0);
        assert_eq!(signal.permits.available_permits(), 0);
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::Error;

/// Aborts the runs watching the paired [`Cancellation`].
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    /// Requests every watching run to stop at its next checkpoint.
    #[inline]
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

/// Conditions under which a research run stops early.
///
/// They are checked at the top of every iteration and before every
/// oracle call. The default never cancels.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    abort_rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Creates a cancellation that fires when the returned handle aborts.
    pub fn abortable() -> (AbortHandle, Self) {
        let (tx, rx) = watch::channel(false);
        let handle = AbortHandle { tx: Arc::new(tx) };
        let cancellation = Self {
            abort_rx: Some(rx),
            deadline: None,
        };
        (handle, cancellation)
    }

    /// Stops the run once `deadline` has passed.
    #[inline]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stops the run once `timeout` has elapsed from now.
    #[inline]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns whether the run should stop.
    pub fn is_cancelled(&self) -> bool {
        let aborted = self.abort_rx.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        aborted || expired
    }

    pub(crate) fn check(&self, checkpoint: &str) -> Result<(), Error> {
        if !self.is_cancelled() {
            return Ok(());
        }
        info!("research cancelled before {checkpoint}");
        Err(Error::cancelled()
            .with_reason(format!("cancelled before {checkpoint}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        assert!(!Cancellation::default().is_cancelled());

        let (handle, cancellation) = Cancellation::abortable();
        let cloned = cancellation.clone();
        assert!(cancellation.check("plan").is_ok());
        handle.abort();
        assert!(cancellation.is_cancelled());
        assert!(cloned.is_cancelled());

        let cancellation =
            Cancellation::default().with_timeout(Duration::from_secs(1));
        assert!(!cancellation.is_cancelled());
        tokio::time::advance(Duration::from_secs(2)).await;
        let err = cancellation.check("assess").unwrap_err();
        assert_eq!(err.reason(), "cancelled before assess");
    }
}

//! Termination signal shared by the background tasks.

use std::sync::Arc;

use tokio::sync::watch;

/// Idempotent termination signal.
///
/// Raising it any number of times is safe. `reset` re-arms it before a new
/// start.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Lower the signal.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// A handle a task can wait on.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once the signal is raised. Resolves immediately if it
    /// already is.
    pub async fn triggered(&mut self) {
        // A dropped sender can never raise the signal; treat it as raised
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_twice_is_safe() {
        let signal = ShutdownSignal::new();
        let mut listener = signal.listener();

        signal.trigger();
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), listener.triggered())
            .await
            .expect("listener should observe the signal");
        assert!(listener.is_triggered());
    }

    #[tokio::test]
    async fn test_listener_created_after_trigger_resolves() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let mut late = signal.listener();
        tokio::time::timeout(Duration::from_secs(1), late.triggered())
            .await
            .expect("late listener should resolve immediately");
    }

    #[tokio::test]
    async fn test_reset_rearms() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.reset();

        assert!(!signal.is_triggered());
        let mut listener = signal.listener();
        let pending = tokio::time::timeout(Duration::from_millis(20), listener.triggered()).await;
        assert!(pending.is_err());
    }
}

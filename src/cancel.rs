use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation handle owned by one screen of the app.
///
/// Every async operation the screen starts receives the scope and checks it
/// before applying its result. In-flight calls are not aborted; their results
/// are discarded instead.
#[derive(Debug, Clone)]
pub struct CancelScope {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelScope {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Pass `value` through only while the scope is still active.
    pub fn admit<T>(&self, value: T) -> Option<T> {
        if self.is_cancelled() {
            None
        } else {
            Some(value)
        }
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

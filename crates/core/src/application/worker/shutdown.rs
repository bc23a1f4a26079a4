// Shutdown signalling shared by workers and the beat

use tokio::sync::watch;

/// Receiving side, cloned into every background loop
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested (or the sender is gone)
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// Another token for a loop started after the channel was created
    pub fn subscribe(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_tokens_observe_shutdown() {
        let (sender, token) = shutdown_channel();
        let mut late = sender.subscribe();
        assert!(!token.is_shutdown());

        sender.shutdown();

        assert!(token.is_shutdown());
        tokio::time::timeout(Duration::from_secs(1), late.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_when_sender_dropped() {
        let (sender, mut token) = shutdown_channel();
        drop(sender);
        tokio::time::timeout(Duration::from_secs(1), token.wait())
            .await
            .unwrap();
    }
}

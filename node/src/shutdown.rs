//! Graceful shutdown controller.
//!
//! Listens for SIGINT/SIGTERM and tells every subscriber to wind down. A
//! `watch` channel is used so a subscriber that arrives after the signal
//! still sees it.

use tokio::signal;
use tokio::sync::watch;

/// Coordinates graceful shutdown across node subsystems.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// One subscriber's view of the shutdown flag.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown is triggered or the controller is dropped.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("cannot install SIGTERM handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
            _ = self.subscribe().recv() => {}
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let rx = controller.subscribe();
        controller.shutdown();
        rx.recv().await;
        assert!(controller.is_shutdown());
    }

    #[tokio::test]
    async fn late_subscribers_still_see_shutdown() {
        let controller = ShutdownController::new();
        controller.shutdown();
        let rx1 = controller.subscribe();
        let rx2 = controller.subscribe();
        rx1.recv().await;
        rx2.recv().await;
    }

    #[tokio::test]
    async fn dropping_the_controller_releases_subscribers() {
        let controller = ShutdownController::new();
        let rx = controller.subscribe();
        drop(controller);
        rx.recv().await;
    }

    #[tokio::test]
    async fn wait_for_signal_returns_after_programmatic_shutdown() {
        let controller = std::sync::Arc::new(ShutdownController::new());
        let waiter = {
            let c = std::sync::Arc::clone(&controller);
            tokio::spawn(async move { c.wait_for_signal().await })
        };
        controller.shutdown();
        waiter.await.unwrap();
    }
}

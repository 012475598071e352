// Cooperative stop signal for pipeline workers.
//
// One watch channel fans the stop request out to every worker. A token is
// polled between runs and awaited during idle sleeps, so a worker never
// abandons a claimed run mid-pipeline.

use tokio::sync::watch;

/// Receiver half, one clone per pipeline worker.
#[derive(Clone)]
pub struct ShutdownToken {
    stopped: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Whether a stop has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Resolve once a stop is requested. Cancel-safe, so it can race the
    /// idle sleep in a `select!` arm.
    pub async fn wait(&mut self) {
        let _ = self.stopped.changed().await;
    }
}

/// Sender half, held by the composition root.
pub struct ShutdownSender {
    stop: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Ask every worker to stop after its current run.
    pub fn shutdown(&self) {
        let _ = self.stop.send(true);
    }
}

/// Create a linked sender/token pair.
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (stop, stopped) = watch::channel(false);
    (ShutdownSender { stop }, ShutdownToken { stopped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_starts_unsignalled() {
        let (_tx, token) = shutdown_channel();
        assert!(!token.is_shutdown());
    }

    #[tokio::test]
    async fn test_all_clones_observe_the_stop() {
        let (tx, token) = shutdown_channel();
        let mut second = token.clone();

        tx.shutdown();
        second.wait().await;
        assert!(token.is_shutdown());
        assert!(second.is_shutdown());
    }
}

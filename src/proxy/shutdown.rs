use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tokio::sync::Notify;

/// Coordinates graceful shutdown between the signal listener and the server.
pub struct ShutdownManager {
    shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Block until SIGINT or SIGTERM, then flag shutdown.
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                _ = signal::ctrl_c() => {},
                _ = sigterm.recv() => {},
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
        }

        self.signal_shutdown();
        Ok(())
    }

    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub async fn wait_for_shutdown(&self) {
        loop {
            // Register interest before checking the flag so a signal between
            // the check and the await is not lost.
            let notified = self.notify.notified();
            if self.is_shutting_down() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

//! One source for the shutdown signal of a node: the content listener, the admin
//! listener and anything else spawned by `main` wait on the same controller.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Notify;

/// Cloneable handle passed to every listener of a node.
///
/// A shutdown requested before a listener starts waiting is not lost: the
/// flag is checked before parking on the notifier.
#[derive(Clone, Default)]
pub struct ShutdownController {
    notify: Arc<Notify>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the signal handler that triggers this controller.
    pub fn install_ctrl_c_handler(&self) {
        tracing::debug!("install_ctrl_c_handler");

        let this = self.clone();
        tokio::task::spawn(async move {
            shutdown_stream().await;
            this.shutdown();
        });
    }

    /// Manually send the shutdown signal.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down coop node.");
        self.triggered.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Wait for the shutdown signal to be sent.
    pub async fn wait_for_shutdown(self) {
        let future = self.notify.notified();
        tokio::pin!(future);
        // register before checking the flag so a concurrent `shutdown` wakes us
        future.as_mut().enable();
        if self.is_shutdown() {
            return;
        }
        tracing::debug!("waiting for shutdown...");
        future.as_mut().await;
    }
}

#[cfg(unix)]
/// Listens for:
/// - SIGINT (Ctrl + C)
/// - SIGQUIT (Ctrl + D)
/// - SIGTERM (sent by `kill` by default)
async fn shutdown_stream() {
    use tokio::signal::unix::{signal, SignalKind};
    // ctrl+c
    let mut interrupt_signal =
        signal(SignalKind::interrupt()).expect("Failed to setup INTERRUPT handler.");

    let mut terminate_signal =
        signal(SignalKind::terminate()).expect("Failed to setup TERMINATE handler.");

    let mut quit_signal = signal(SignalKind::quit()).expect("Failed to setup QUIT handler.");

    tokio::select! {
        _ = interrupt_signal.recv() => {
            tracing::info!("Received ctrl-c signal.");
        }
        _ = terminate_signal.recv() => {
            tracing::info!("Received SIGTERM signal.");
        }
        _ = quit_signal.recv() => {
            tracing::info!("Received SIGQUIT signal.");
        }
    }
}

#[cfg(windows)]
/// On windows only listen for ctrl-c for now.
async fn shutdown_stream() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to setup control-c handler.");
    tracing::info!("Received ctrl-c signal.");
}

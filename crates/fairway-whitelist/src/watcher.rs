//! Background task watching a whitelist file for changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::whitelist::Whitelist;

/// Callback invoked with each changed whitelist.
pub type WhitelistCallback = Arc<dyn Fn(Whitelist) -> BoxFuture + Send + Sync>;

type BoxFuture = std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;

/// Polls a hosts file and delivers changed whitelists to a callback.
///
/// The file read happens inside the watcher task, never on the
/// allocator engine's critical path. An unreadable file keeps the
/// last-known-good list in force.
pub struct WhitelistWatcher {
    path: PathBuf,
    poll_interval: Duration,
}

impl WhitelistWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Set how often the source file is polled.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Spawn the watch loop. The current list is delivered immediately
    /// on the first poll and then only when it changes.
    pub fn start(self, callback: WhitelistCallback) -> WatcherHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.poll_interval);
            let mut last: Option<Whitelist> = None;
            info!(path = %self.path.display(), "whitelist watcher started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match Whitelist::load(&self.path) {
                            Ok(current) => {
                                if last.as_ref() != Some(&current) {
                                    debug!(path = %self.path.display(), "whitelist changed");
                                    last = Some(current.clone());
                                    callback(current).await;
                                }
                            }
                            Err(e) => {
                                // Keep the last-known-good list.
                                warn!(error = %e, "whitelist source unreadable");
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        WatcherHandle {
            handle,
            shutdown_tx,
        }
    }
}

/// Handle to a running watcher.
pub struct WatcherHandle {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl WatcherHandle {
    /// Signal the watch loop to stop and abort the task.
    pub fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("fairway-wl-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn channel_callback() -> (WhitelistCallback, mpsc::UnboundedReceiver<Whitelist>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: WhitelistCallback = Arc::new(move |wl| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx.send(wl);
            })
        });
        (callback, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_initial_list_and_changes() {
        let path = temp_file("initial", "agent1\n");
        let (callback, mut rx) = channel_callback();

        let handle = WhitelistWatcher::new(&path)
            .with_poll_interval(Duration::from_secs(1))
            .start(callback);

        let first = rx.recv().await.unwrap();
        assert!(first.permits("agent1"));
        assert!(!first.permits("agent2"));

        std::fs::write(&path, "agent1\nagent2\n").unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.permits("agent2"));
        assert!(second.widened_from(&first));

        handle.stop();
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_list_is_not_redelivered() {
        let path = temp_file("unchanged", "agent1\n");
        let (callback, mut rx) = channel_callback();

        let handle = WhitelistWatcher::new(&path)
            .with_poll_interval(Duration::from_secs(1))
            .start(callback);

        rx.recv().await.unwrap();

        // Several polls with no change: nothing further arrives.
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());

        handle.stop();
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_source_keeps_last_known_good() {
        let path = temp_file("lkg", "agent1\n");
        let (callback, mut rx) = channel_callback();

        let handle = WhitelistWatcher::new(&path)
            .with_poll_interval(Duration::from_secs(1))
            .start(callback);

        rx.recv().await.unwrap();

        // Deleting the file makes the source unreadable; no bogus
        // delivery happens.
        std::fs::remove_file(&path).unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());

        // Restoring the file with new content resumes delivery.
        std::fs::write(&path, "agent2\n").unwrap();
        let restored = rx.recv().await.unwrap();
        assert!(restored.permits("agent2"));

        handle.stop();
        std::fs::remove_file(&path).ok();
    }
}

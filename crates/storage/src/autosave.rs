use std::sync::Arc;
use std::time::Duration;

use recall_core::model::{StatsHistory, StoreData};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{StorageError, StoreBackend};

/// Trailing debounce window for coalescing writes.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(300);

/// Point-in-time copy of everything the backend persists.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub store: StoreData,
    pub stats: StatsHistory,
}

enum Msg {
    Schedule(Box<Snapshot>),
    Flush(oneshot::Sender<Result<(), StorageError>>),
}

/// Debounced persistence task.
///
/// Each [`Autosave::schedule`] replaces the pending snapshot and restarts
/// the delay window, so a burst of mutations produces a single physical
/// write of the latest state. Only write frequency is coalesced; the
/// snapshot written is always the most recent one. [`Autosave::flush`]
/// writes any pending snapshot immediately and is the final-flush path for
/// clean shutdown; a hard kill inside the window loses at most the pending
/// physical write.
pub struct Autosave {
    tx: mpsc::UnboundedSender<Msg>,
    handle: JoinHandle<()>,
}

impl Autosave {
    /// Spawns the flusher task on the current tokio runtime.
    #[must_use]
    pub fn spawn(backend: Arc<dyn StoreBackend>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(backend, delay, rx));
        Self { tx, handle }
    }

    /// Queues a snapshot for writing, restarting the debounce window.
    pub fn schedule(&self, snapshot: Snapshot) {
        let _ = self.tx.send(Msg::Schedule(Box::new(snapshot)));
    }

    /// Writes any pending snapshot immediately.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pending write fails, or
    /// `StorageError::Unavailable` if the flusher task is gone.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Msg::Flush(ack))
            .map_err(|_| StorageError::Unavailable("autosave task stopped".into()))?;
        done.await
            .map_err(|_| StorageError::Unavailable("autosave task stopped".into()))?
    }

    /// Flushes pending state and stops the task.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the final write fails.
    pub async fn shutdown(self) -> Result<(), StorageError> {
        let result = self.flush().await;
        drop(self.tx);
        let _ = self.handle.await;
        result
    }
}

async fn run(
    backend: Arc<dyn StoreBackend>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Msg>,
) {
    let mut pending: Option<Box<Snapshot>> = None;

    loop {
        let msg = if pending.is_some() {
            match tokio::time::timeout(delay, rx.recv()).await {
                Ok(msg) => msg,
                Err(_) => {
                    // Quiet window elapsed: write the latest snapshot.
                    if let Some(snapshot) = pending.take()
                        && let Err(err) = write(backend.as_ref(), &snapshot).await
                    {
                        warn!(error = %err, "debounced save failed");
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match msg {
            Some(Msg::Schedule(snapshot)) => pending = Some(snapshot),
            Some(Msg::Flush(ack)) => {
                let result = match pending.take() {
                    Some(snapshot) => write(backend.as_ref(), &snapshot).await,
                    None => Ok(()),
                };
                let _ = ack.send(result);
            }
            None => {
                if let Some(snapshot) = pending.take()
                    && let Err(err) = write(backend.as_ref(), &snapshot).await
                {
                    warn!(error = %err, "final save failed");
                }
                break;
            }
        }
    }
}

async fn write(backend: &dyn StoreBackend, snapshot: &Snapshot) -> Result<(), StorageError> {
    backend.save_store(&snapshot.store).await?;
    backend.save_stats(&snapshot.stats).await?;
    debug!(
        decks = snapshot.store.decks.len(),
        "persisted store snapshot"
    );
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use recall_core::model::{Card, CardId};

    fn snapshot_with_deck(name: &str) -> Snapshot {
        let mut store = StoreData::default();
        store
            .decks
            .insert(name.into(), vec![Card::new(CardId::new("1"), "a", "1").unwrap()]);
        Snapshot {
            store,
            stats: StatsHistory::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_schedules_writes_once_with_latest() {
        let backend = InMemoryBackend::new();
        let autosave = Autosave::spawn(Arc::new(backend.clone()), DEFAULT_FLUSH_DELAY);

        autosave.schedule(snapshot_with_deck("One"));
        autosave.schedule(snapshot_with_deck("Two"));
        autosave.schedule(snapshot_with_deck("Three"));

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(backend.store_writes(), 1);
        let saved = backend.load_store().await.unwrap();
        assert!(saved.decks.contains_key("Three"));

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_pending_immediately() {
        let backend = InMemoryBackend::new();
        let autosave = Autosave::spawn(Arc::new(backend.clone()), DEFAULT_FLUSH_DELAY);

        autosave.schedule(snapshot_with_deck("One"));
        autosave.flush().await.unwrap();

        assert_eq!(backend.store_writes(), 1);

        // Nothing pending: flush is a no-op.
        autosave.flush().await.unwrap();
        assert_eq!(backend.store_writes(), 1);

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending_state() {
        let backend = InMemoryBackend::new();
        let autosave = Autosave::spawn(Arc::new(backend.clone()), DEFAULT_FLUSH_DELAY);

        autosave.schedule(snapshot_with_deck("One"));
        autosave.shutdown().await.unwrap();

        assert_eq!(backend.store_writes(), 1);
    }
}

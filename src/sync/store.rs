//! Shared key-value store the surfaces replicate through

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use super::snapshot::SessionSnapshot;
use crate::error::{EditorError, Result};

/// Change notifications buffered per subscriber before lagging
const CHANNEL_CAPACITY: usize = 64;

/// Publish/subscribe store holding the single current snapshot
pub trait SharedStore: Clone + Send + Sync + 'static {
    /// Replace the current snapshot and notify subscribers
    fn write(&self, snapshot: SessionSnapshot) -> impl Future<Output = Result<()>> + Send;

    fn read_current(&self) -> impl Future<Output = Result<Option<SessionSnapshot>>> + Send;

    /// Receive every snapshot written after this call, including own writes
    fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot>;
}

struct Inner {
    current: Mutex<Option<SessionSnapshot>>,
    tx: broadcast::Sender<SessionSnapshot>,
    write_delay: Duration,
}

/// In-process store backed by a broadcast channel
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_write_delay(Duration::ZERO)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes take `delay` to complete
    pub fn with_write_delay(delay: Duration) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                current: Mutex::new(None),
                tx,
                write_delay: delay,
            }),
        }
    }

    fn lock_err<T>(_: T) -> EditorError {
        EditorError::Store("store lock poisoned".into())
    }
}

impl SharedStore for MemoryStore {
    async fn write(&self, snapshot: SessionSnapshot) -> Result<()> {
        if !self.inner.write_delay.is_zero() {
            tokio::time::sleep(self.inner.write_delay).await;
        }
        {
            let mut current = self.inner.current.lock().map_err(Self::lock_err)?;
            *current = Some(snapshot.clone());
        }
        log::trace!(
            "Store write v{} from {}",
            snapshot.version,
            snapshot.origin
        );
        // No subscribers is not an error
        let _ = self.inner.tx.send(snapshot);
        Ok(())
    }

    async fn read_current(&self) -> Result<Option<SessionSnapshot>> {
        let current = self.inner.current.lock().map_err(Self::lock_err)?;
        Ok(current.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.inner.tx.subscribe()
    }
}

//! # Encryption Worker Pool
//!
//! A fixed number of workers drain one queue of encryption tasks. Each task
//! carries its own `oneshot` reply channel, so a submitter only ever awaits
//! its own result. Encryption and the blob-store write run on the blocking
//! thread pool.

use std::sync::Arc;

use lcp_core::ContentKeyBytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::cas::{BlobStoreError, FsBlobStore};
use crate::cbc::AesCbc;
use crate::encrypter::{encrypt_bytes, EncryptionError};

const QUEUE_DEPTH: usize = 64;

/// Pool failure.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Store(#[from] BlobStoreError),

    /// The pool was shut down before the task completed.
    #[error("encryption pool is closed")]
    Closed,

    /// A worker panicked while handling the task.
    #[error("encryption worker failed: {0}")]
    Worker(String),
}

/// An encrypted, stored resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedResource {
    pub location: String,
    pub length: u64,
    pub sha256: String,
}

struct EncryptTask {
    key: ContentKeyBytes,
    data: Vec<u8>,
    reply: oneshot::Sender<Result<EncryptedResource, PoolError>>,
}

/// Handle to the worker pool. Cloning shares the queue.
#[derive(Clone)]
pub struct EncryptionPool {
    tx: mpsc::Sender<EncryptTask>,
}

impl std::fmt::Debug for EncryptionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionPool").finish_non_exhaustive()
    }
}

impl EncryptionPool {
    /// Spawn `workers` workers (at least one) writing into `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(workers: usize, store: FsBlobStore) -> Self {
        let (tx, rx) = mpsc::channel::<EncryptTask>(QUEUE_DEPTH);
        let rx = Arc::new(Mutex::new(rx));
        let store = Arc::new(store);

        for worker in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                loop {
                    let task = { rx.lock().await.recv().await };
                    let Some(task) = task else { break };
                    let result = run_task(&store, task.key, task.data).await;
                    if task.reply.send(result).is_err() {
                        tracing::debug!(worker, "submitter dropped before result");
                    }
                }
                tracing::debug!(worker, "encryption worker stopped");
            });
        }

        Self { tx }
    }

    /// Encrypt `data` under `key` and store the ciphertext.
    pub async fn encrypt(
        &self,
        key: ContentKeyBytes,
        data: Vec<u8>,
    ) -> Result<EncryptedResource, PoolError> {
        let (reply, done) = oneshot::channel();
        self.tx
            .send(EncryptTask { key, data, reply })
            .await
            .map_err(|_| PoolError::Closed)?;
        done.await.map_err(|_| PoolError::Closed)?
    }
}

async fn run_task(
    store: &Arc<FsBlobStore>,
    key: ContentKeyBytes,
    data: Vec<u8>,
) -> Result<EncryptedResource, PoolError> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || -> Result<EncryptedResource, PoolError> {
        let ciphertext = encrypt_bytes(&AesCbc, key.as_bytes(), &data)?;
        let blob = store.put(&ciphertext)?;
        Ok(EncryptedResource {
            location: blob.location,
            length: blob.length,
            sha256: blob.sha256,
        })
    })
    .await
    .map_err(|e| PoolError::Worker(e.to_string()))?
}

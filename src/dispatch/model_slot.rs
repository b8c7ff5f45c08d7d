use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{error, info};

use crate::error::{ClassifyError, ModelError, NotReadyReason};
use crate::network::ModelHandle;

/// Marks the slot `Failed` if a load never settles, i.e. the loader
/// panicked or its future was dropped mid-load.
struct LoadingGuard<'a> {
    slot: &'a ModelSlot,
    settled: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            error!("model load aborted before completing");
            *self.slot.write() = ModelStatus::Failed("model load aborted".to_owned());
        }
    }
}

/// Lifecycle of the session's model.
#[derive(Debug, Clone)]
pub enum ModelStatus {
    Unloaded,
    Loading,
    Ready(ModelHandle),
    /// Load failed; holds the reason. Terminal.
    Failed(String),
}

/// Owner of the session's single model handle.
///
/// Initialisation happens at most once: the first `load_once` call moves the
/// slot from `Unloaded` to `Loading` and runs its loader; every later call
/// returns the settled outcome (or `NotReady` while loading) without
/// invoking its own loader. Neither `Ready` nor `Failed` is ever left.
#[derive(Debug)]
pub struct ModelSlot {
    status: RwLock<ModelStatus>,
}

impl Default for ModelSlot {
    fn default() -> Self {
        ModelSlot::new()
    }
}

impl ModelSlot {
    pub fn new() -> ModelSlot {
        ModelSlot { status: RwLock::new(ModelStatus::Unloaded) }
    }

    pub fn status(&self) -> ModelStatus {
        self.read().clone()
    }

    /// The loaded model, or `NotReady` with the reason it is unavailable.
    pub fn handle(&self) -> Result<ModelHandle, ClassifyError> {
        match &*self.read() {
            ModelStatus::Ready(handle) => Ok(handle.clone()),
            ModelStatus::Failed(_) => Err(ClassifyError::NotReady(NotReadyReason::ModelUnavailable)),
            ModelStatus::Unloaded | ModelStatus::Loading => {
                Err(ClassifyError::NotReady(NotReadyReason::ModelLoading))
            }
        }
    }

    /// Runs `loader` if and only if this is the first load attempt.
    pub async fn load_once<F, Fut>(&self, loader: F) -> Result<ModelHandle, ClassifyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ModelHandle, ModelError>>,
    {
        {
            let mut status = self.write();
            if !matches!(*status, ModelStatus::Unloaded) {
                drop(status);
                return self.handle();
            }
            *status = ModelStatus::Loading;
        }

        let mut guard = LoadingGuard { slot: self, settled: false };
        let outcome = loader().await;
        guard.settled = true;
        let mut status = self.write();
        match outcome {
            Ok(handle) => {
                info!("model ready");
                *status = ModelStatus::Ready(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                error!("model failed to load: {}", e);
                *status = ModelStatus::Failed(e.to_string());
                Err(ClassifyError::NotReady(NotReadyReason::ModelUnavailable))
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelStatus> {
        self.status.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelStatus> {
        self.status.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layer;
    use crate::network::{ModelMetadata, Network};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tiny() -> ModelHandle {
        Arc::new(Network::new("tiny", [1, 1, 4], vec![Layer::Flatten], ModelMetadata::default()).unwrap())
    }

    #[tokio::test]
    async fn loads_only_once() {
        let slot = ModelSlot::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            slot.load_once(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(tiny())
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(slot.status(), ModelStatus::Ready(_)));
    }

    #[tokio::test]
    async fn failure_is_permanent() {
        let slot = ModelSlot::new();
        let result = slot
            .load_once(|| async { Err(ModelError::Topology("broken".into())) })
            .await;
        assert!(matches!(result, Err(ClassifyError::NotReady(NotReadyReason::ModelUnavailable))));

        let retry = slot.load_once(|| async { Ok(tiny()) }).await;
        assert!(matches!(retry, Err(ClassifyError::NotReady(NotReadyReason::ModelUnavailable))));
        assert!(matches!(slot.status(), ModelStatus::Failed(msg) if msg.contains("broken")));
    }

    async fn exploding_loader() -> Result<ModelHandle, ModelError> {
        panic!("loader blew up")
    }

    #[tokio::test]
    async fn panicking_loader_leaves_slot_failed() {
        let slot = Arc::new(ModelSlot::new());
        let task = {
            let slot = slot.clone();
            tokio::spawn(async move {
                slot.load_once(exploding_loader).await
            })
        };
        assert!(task.await.unwrap_err().is_panic());
        assert!(matches!(slot.status(), ModelStatus::Failed(_)));
        assert!(matches!(slot.handle(), Err(ClassifyError::NotReady(NotReadyReason::ModelUnavailable))));
    }

    #[tokio::test]
    async fn dropped_load_leaves_slot_failed() {
        let slot = ModelSlot::new();
        {
            let pending = slot.load_once(|| std::future::pending());
            tokio::pin!(pending);
            assert!(poll_once(pending.as_mut()).await);
        }
        assert!(matches!(slot.status(), ModelStatus::Failed(_)));
    }

    /// Polls `fut` once; true if it is still pending.
    async fn poll_once<F: Future + Unpin>(mut fut: F) -> bool {
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(std::pin::Pin::new(&mut fut).poll(cx).is_pending())
        })
        .await
    }

    #[test]
    fn unloaded_slot_reports_loading() {
        let slot = ModelSlot::new();
        assert!(matches!(slot.handle(), Err(ClassifyError::NotReady(NotReadyReason::ModelLoading))));
    }
}

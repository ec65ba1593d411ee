//! Lazily initialized, shared async value.
//!
//! The factory runs on first use. Concurrent callers wait for the same
//! initialization and share the result; a failed initialization is not
//! cached. `reset` drops the value so the next `get` builds it again.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;

type InitFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
type InitFn<T> = Box<dyn Fn() -> InitFuture<T> + Send + Sync>;

/// A value built asynchronously on first access and cached afterwards.
pub struct AsyncSingleton<T> {
    init: InitFn<T>,
    value: Mutex<Option<Arc<T>>>,
}

impl<T: Send + Sync + 'static> AsyncSingleton<T> {
    /// Create a singleton from an async factory.
    #[must_use]
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            init: Box::new(move || -> InitFuture<T> { Box::pin(init()) }),
            value: Mutex::new(None),
        }
    }

    /// Get the value, building it if needed.
    ///
    /// # Errors
    ///
    /// Returns the factory's error. The next call tries again.
    pub async fn get(&self) -> Result<Arc<T>> {
        let mut guard = self.value.lock().await;

        if let Some(ref value) = *guard {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new((self.init)().await?);
        *guard = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Drop the cached value. Handles already given out stay valid.
    pub async fn reset(&self) {
        self.value.lock().await.take();
    }

    /// Whether the value has been built.
    pub async fn is_initialized(&self) -> bool {
        self.value.lock().await.is_some()
    }
}

impl<T> fmt::Debug for AsyncSingleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.value.try_lock() {
            Ok(guard) if guard.is_some() => "initialized",
            Ok(_) => "empty",
            Err(_) => "busy",
        };
        f.debug_struct("AsyncSingleton")
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

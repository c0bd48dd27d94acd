use crate::error::PredictError;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::sync::{Mutex, OnceCell};
use tokio::time::timeout;

/// Loads a model artifact from storage. The registry calls this at most once
/// per cache key; tests inject counting or failing loaders through this seam.
pub trait ModelLoader: Send + Sync + 'static {
    type Model: Send + Sync + 'static;

    fn load(&self, location: &ResolvedLocation) -> Result<Self::Model, PredictError>;
}

/// A model location after normalization: either an absolute local path or a
/// remote URL left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    Local(PathBuf),
    Remote(String),
}

impl ResolvedLocation {
    /// Cache key for this location. The resolved path or URL itself is the
    /// key, so two distinct artifacts can never collide.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Local(path) => path.to_string_lossy().into_owned(),
            Self::Remote(url) => url.clone(),
        }
    }
}

/// Lazy per-process model cache. Each distinct artifact is loaded from
/// storage at most once; subsequent requests get the existing handle with no
/// I/O. Loaded models live until process teardown, there is no eviction.
pub struct ModelRegistry<L: ModelLoader> {
    loader: Arc<L>,
    model_dir: PathBuf,
    load_timeout: Duration,
    models: Mutex<HashMap<String, Arc<OnceCell<Arc<L::Model>>>>>,
}

impl<L: ModelLoader> ModelRegistry<L> {
    /// The loader performs any one-time runtime initialization in its own
    /// constructor, before this registry sees a single load call.
    pub fn new(loader: L, model_dir: PathBuf, load_timeout: Duration) -> Self {
        Self {
            loader: Arc::new(loader),
            model_dir,
            load_timeout,
            models: Mutex::new(HashMap::new()),
        }
    }

    /// Trim, normalize separators, and resolve relative local paths against
    /// the configured model directory. Anything starting with `http` is
    /// treated as a remote URL and passed through as-is.
    pub fn resolve(&self, location: &str) -> ResolvedLocation {
        let location = location.trim().replace('\\', "/");
        if location.starts_with("http") {
            return ResolvedLocation::Remote(location);
        }
        let path = Path::new(&location);
        if path.is_absolute() {
            ResolvedLocation::Local(path.to_path_buf())
        } else {
            ResolvedLocation::Local(self.model_dir.join(path))
        }
    }

    /// Return the cached handle for `location`, loading it first if this is
    /// the first request to reference it. Concurrent first requests for the
    /// same key block behind a single load. A failed load leaves no cache
    /// entry behind, so a later request retries.
    pub async fn ensure_loaded(&self, location: &str) -> Result<Arc<L::Model>, PredictError> {
        let resolved = self.resolve(location);
        let key = resolved.cache_key();

        let cell = {
            let mut models = self.models.lock().await;
            models.entry(key).or_default().clone()
        };

        let model = cell
            .get_or_try_init(|| async {
                tracing::info!(location = %resolved.cache_key(), "loading model");
                let loader = self.loader.clone();
                let load = tokio::task::spawn_blocking(move || loader.load(&resolved));
                match timeout(self.load_timeout, load).await {
                    Err(_) => Err(PredictError::Timeout("model load")),
                    Ok(Err(join_error)) => Err(PredictError::Internal(format!(
                        "model load task failed: {join_error}"
                    ))),
                    Ok(Ok(result)) => result.map(Arc::new),
                }
            })
            .await?;

        Ok(model.clone())
    }
}

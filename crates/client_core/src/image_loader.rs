//! Two concurrent misses for the same URL may both hit the network; the later
//! cache insert replaces the earlier.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use reqwest::Client;
use shared::error::RepositoryError;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::ui::Dispatcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("image fetch failed: {0}")]
    Fetch(#[from] RepositoryError),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image decode task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, ImageLoadError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RepositoryError>;
}

pub struct HttpImageFetcher {
    http: Client,
}

impl HttpImageFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RepositoryError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| RepositoryError::network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").into(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RepositoryError::network(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    dispatcher: Dispatcher,
    cache: Mutex<HashMap<Url, Arc<DecodedImage>>>,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, dispatcher: Dispatcher) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            dispatcher,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Delivers the image for `url`, or `None` if it could not be fetched or
    /// decoded. Cache hits call `on_result` before returning.
    pub fn load<F>(self: &Arc<Self>, url: Url, on_result: F)
    where
        F: FnOnce(Option<Arc<DecodedImage>>) + Send + 'static,
    {
        if let Some(image) = self.cached(&url) {
            on_result(Some(image));
            return;
        }

        let loader = Arc::clone(self);
        self.dispatcher.spawn(async move {
            let decoded = match loader.fetcher.fetch(&url).await {
                Ok(bytes) => loader
                    .dispatcher
                    .spawn_blocking(move || decode_image(&bytes))
                    .await
                    .unwrap_or_else(|err| Err(err.into())),
                Err(err) => Err(err.into()),
            };
            let dispatcher = loader.dispatcher.clone();
            dispatcher.post(move || match decoded {
                Ok(image) => {
                    debug!(%url, width = image.width, height = image.height, "image cached");
                    let image = Arc::new(image);
                    loader.cache().insert(url, Arc::clone(&image));
                    on_result(Some(image));
                }
                Err(err) => {
                    warn!(%url, error = %err, "image load failed");
                    on_result(None);
                }
            });
        });
    }

    pub fn cached(&self, url: &Url) -> Option<Arc<DecodedImage>> {
        self.cache().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    pub fn clear(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<Url, Arc<DecodedImage>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/image_loader_tests.rs"]
mod tests;
